//! Contact form delivery.

use novabox_core::Email;
use tracing::instrument;

use super::klaviyo::{KlaviyoClient, KlaviyoError};

/// Klaviyo metric name for contact submissions.
pub const CONTACT_EVENT: &str = "Submitted Contact Form";

/// A validated contact form submission.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub subject: Option<String>,
    pub message: String,
}

/// How a submission was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactDelivery {
    /// Recorded as a Klaviyo event.
    Tracked,
    /// Klaviyo is not configured; the submission was only logged.
    Logged,
}

/// Delivers contact form submissions.
#[derive(Clone)]
pub struct ContactService {
    klaviyo: Option<KlaviyoClient>,
}

impl ContactService {
    #[must_use]
    pub const fn new(klaviyo: Option<KlaviyoClient>) -> Self {
        Self { klaviyo }
    }

    /// Deliver a submission.
    ///
    /// # Errors
    ///
    /// Returns an error if Klaviyo rejects the event.
    #[instrument(skip_all, fields(email = %submission.email))]
    pub async fn submit(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactDelivery, KlaviyoError> {
        let Some(client) = &self.klaviyo else {
            tracing::warn!(
                name = %submission.name,
                subject = submission.subject.as_deref().unwrap_or(""),
                "Klaviyo not configured, contact submission logged only"
            );
            return Ok(ContactDelivery::Logged);
        };

        let properties = serde_json::json!({
            "customer_name": submission.name,
            "subject": submission.subject.as_deref().unwrap_or(""),
            "message": submission.message,
            "source": "Contact Page"
        });

        client
            .track_event(submission.email.as_str(), CONTACT_EVENT, properties)
            .await?;

        tracing::info!("Contact submission tracked");
        Ok(ContactDelivery::Tracked)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::KlaviyoConfig;

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            subject: Some("Wholesale".to_string()),
            message: "Do you ship to Canada?".to_string(),
        }
    }

    fn client(server: &MockServer) -> KlaviyoClient {
        let config = KlaviyoConfig {
            private_key: SecretString::from("pk_test_key"),
        };
        KlaviyoClient::with_base_url(&config, format!("{}/api", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_submit_without_klaviyo_is_logged() {
        let service = ContactService::new(None);
        let delivery = service.submit(&submission()).await.unwrap();
        assert_eq!(delivery, ContactDelivery::Logged);
    }

    #[tokio::test]
    async fn test_submit_tracks_event() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/events"))
            .and(header("Authorization", "Klaviyo-API-Key pk_test_key"))
            .and(body_partial_json(serde_json::json!({
                "data": { "attributes": {
                    "metric": { "data": { "attributes": { "name": CONTACT_EVENT } } },
                    "profile": { "data": { "attributes": { "email": "ada@example.com" } } }
                } }
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let service = ContactService::new(Some(client(&server)));
        let delivery = service.submit(&submission()).await.unwrap();
        assert_eq!(delivery, ContactDelivery::Tracked);
    }

    #[tokio::test]
    async fn test_submit_propagates_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/events"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad event"))
            .mount(&server)
            .await;

        let service = ContactService::new(Some(client(&server)));
        let err = service.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, KlaviyoError::Api { status: 400, .. }));
    }
}
