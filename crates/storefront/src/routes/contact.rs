//! Contact form route handlers.
//!
//! Submissions are validated server side and delivered as a Klaviyo event
//! through [`ContactService`](crate::services::ContactService).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use novabox_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::services::{ContactDelivery, ContactSubmission};
use crate::state::AppState;
use crate::views::Layout;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default)]
pub struct ContactErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.message.is_none()
    }
}

impl ContactForm {
    /// Validate into a submission, or the field errors.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any field is invalid.
    pub fn validate(&self) -> Result<ContactSubmission, ContactErrors> {
        let mut errors = ContactErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.name = Some("Name is required".to_owned());
        }

        let email = if self.email.trim().is_empty() {
            errors.email = Some("Email is required".to_owned());
            None
        } else {
            match Email::parse(self.email.trim()) {
                Ok(email) => Some(email),
                Err(e) => {
                    tracing::debug!("Rejected contact email: {e}");
                    errors.email = Some("Please enter a valid email address".to_owned());
                    None
                }
            }
        };

        let message = self.message.trim();
        if message.is_empty() {
            errors.message = Some("Message is required".to_owned());
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ContactSubmission {
                name: name.to_owned(),
                email,
                subject: Some(self.subject.trim().to_owned()).filter(|s| !s.is_empty()),
                message: message.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub form: ContactForm,
    pub errors: ContactErrors,
    /// Summary shown above the form.
    pub error: Option<String>,
    pub success: Option<String>,
    pub contact_email: String,
}

impl ContactTemplate {
    fn new(state: &AppState, nonce: CspNonce) -> Self {
        Self {
            layout: Layout::new(state, nonce, "Contact")
                .with_description("Get in touch with the Novabox team.")
                .with_canonical(state.config().absolute_url("/contact")),
            form: ContactForm::default(),
            errors: ContactErrors::default(),
            error: None,
            success: None,
            contact_email: state.config().contact_email.clone(),
        }
    }
}

/// Display the contact form.
#[instrument(skip(state, nonce))]
pub async fn show(State(state): State<AppState>, nonce: CspNonce) -> impl IntoResponse {
    ContactTemplate::new(&state, nonce)
}

/// Handle a contact form submission.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    nonce: CspNonce,
    Form(form): Form<ContactForm>,
) -> Response {
    let mut page = ContactTemplate::new(&state, nonce);

    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(errors) => {
            page.form = form;
            page.errors = errors;
            page.error = Some("Please correct the errors in the form".to_owned());
            return (StatusCode::BAD_REQUEST, page).into_response();
        }
    };

    match state.contact().submit(&submission).await {
        Ok(ContactDelivery::Tracked) => {
            page.success =
                Some("Thanks for reaching out! We'll get back to you soon.".to_owned());
            page.into_response()
        }
        Ok(ContactDelivery::Logged) => {
            page.success = Some(format!(
                "Thanks for your message. For a faster reply, email us at {}.",
                state.config().contact_email
            ));
            page.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to deliver contact submission");
            page.form = form;
            page.error = Some("Failed to send your message. Please try again later.".to_owned());
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: String::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let submission = form(" Ada ", "ada@example.com", " Hello ").validate().unwrap();
        assert_eq!(submission.name, "Ada");
        assert_eq!(submission.message, "Hello");
        assert!(submission.subject.is_none());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let errors = form("  ", "", "\n").validate().unwrap_err();
        assert!(errors.name.is_some());
        assert_eq!(errors.email.as_deref(), Some("Email is required"));
        assert!(errors.message.is_some());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let errors = form("Ada", "not-an-email", "Hi").validate().unwrap_err();
        assert!(errors.email.is_some());
        assert!(errors.name.is_none());
    }
}
