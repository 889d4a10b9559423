//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::services::{ContactService, KlaviyoClient, KlaviyoError};
use crate::shopify::{CustomerClient, StorefrontClient};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("klaviyo error: {0}")]
    Klaviyo(#[from] KlaviyoError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Shopify clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    customer: CustomerClient,
    content: ContentStore,
    contact: ContactService,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if content cannot be loaded or an HTTP client fails
    /// to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let storefront = StorefrontClient::new(&config.shopify);
        let customer = CustomerClient::new(&config.shopify);
        let content = ContentStore::load(&config.content_dir)?;
        let klaviyo = config
            .klaviyo
            .as_ref()
            .map(KlaviyoClient::new)
            .transpose()?;

        Self::with_clients(
            config,
            storefront,
            customer,
            content,
            ContactService::new(klaviyo),
        )
    }

    /// Assemble state from pre-built clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset HTTP client fails to build.
    pub fn with_clients(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        customer: CustomerClient,
        content: ContentStore,
        contact: ContactService,
    ) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .user_agent("Novabox/1.0")
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                customer,
                content,
                contact,
                http,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the Shopify Customer Account API client.
    #[must_use]
    pub fn customer(&self) -> &CustomerClient {
        &self.inner.customer
    }

    /// Get a reference to the markdown content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the contact form service.
    #[must_use]
    pub fn contact(&self) -> &ContactService {
        &self.inner.contact
    }

    /// Shared HTTP client for upstream asset fetches.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
