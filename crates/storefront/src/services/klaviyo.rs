//! Klaviyo API client for event tracking.
//!
//! Contact form submissions are recorded as Klaviyo events, which trigger
//! flows that notify the support team and send the auto-response.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::KlaviyoConfig;

/// Klaviyo API version.
const API_REVISION: &str = "2024-10-15";

/// Klaviyo API base URL.
const BASE_URL: &str = "https://a.klaviyo.com/api";

/// Errors that can occur when interacting with Klaviyo API.
#[derive(Debug, Error)]
pub enum KlaviyoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid client configuration.
    #[error("Config error: {0}")]
    Config(String),
}

/// Klaviyo API client.
#[derive(Clone)]
pub struct KlaviyoClient {
    client: reqwest::Client,
    base_url: String,
}

impl KlaviyoClient {
    /// Create a new Klaviyo API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &KlaviyoConfig) -> Result<Self, KlaviyoError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client against an explicit API base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn with_base_url(
        config: &KlaviyoConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, KlaviyoError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Klaviyo-API-Key {}", config.private_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| KlaviyoError::Config(format!("Invalid API key format: {e}")))?,
        );

        // Revision header for API versioning
        headers.insert("revision", HeaderValue::from_static(API_REVISION));

        // Content-Type for JSON:API
        headers.insert(
            "Content-Type",
            HeaderValue::from_static("application/vnd.api+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Track a custom event for a profile identified by email.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, properties))]
    pub async fn track_event(
        &self,
        email: &str,
        event_name: &str,
        properties: serde_json::Value,
    ) -> Result<(), KlaviyoError> {
        let url = format!("{}/events", self.base_url);

        let body = serde_json::json!({
            "data": {
                "type": "event",
                "attributes": {
                    "properties": properties,
                    "metric": {
                        "data": {
                            "type": "metric",
                            "attributes": { "name": event_name }
                        }
                    },
                    "profile": {
                        "data": {
                            "type": "profile",
                            "attributes": { "email": email }
                        }
                    }
                }
            }
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        // 202 Accepted is the expected response
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KlaviyoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
