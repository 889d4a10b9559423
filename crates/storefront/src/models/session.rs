//! Session-related types.
//!
//! Keys and typed accessors for values stored in the visitor session.

use tower_sessions::Session;

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for Shopify OAuth state (CSRF protection).
    pub const SHOPIFY_OAUTH_STATE: &str = "shopify_oauth_state";

    /// Key for Shopify OAuth nonce (`OpenID` Connect replay protection).
    pub const SHOPIFY_OAUTH_NONCE: &str = "shopify_oauth_nonce";

    /// Key for Shopify customer access token.
    pub const SHOPIFY_CUSTOMER_TOKEN: &str = "shopify_customer_token";
}

/// Typed access to the cart id stored in a session.
pub struct CartSession<'a>(pub &'a Session);

impl CartSession<'_> {
    /// The stored cart id, if any.
    ///
    /// A session read error is treated as "no cart".
    pub async fn id(&self) -> Option<String> {
        self.0.get::<String>(keys::CART_ID).await.ok().flatten()
    }

    /// Remember the cart id for this visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_id(&self, cart_id: &str) -> Result<(), tower_sessions::session::Error> {
        self.0.insert(keys::CART_ID, cart_id).await
    }

    /// Forget the stored cart (it expired or was converted at checkout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.0.remove::<String>(keys::CART_ID).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_cart_session_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let cart = CartSession(&session);

        assert!(cart.id().await.is_none());
        cart.set_id("gid://shopify/Cart/abc?key=k").await.unwrap();
        assert_eq!(cart.id().await.as_deref(), Some("gid://shopify/Cart/abc?key=k"));
        cart.clear().await.unwrap();
        assert!(cart.id().await.is_none());
    }
}
