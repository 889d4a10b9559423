//! CSP nonce middleware for inline script protection.
//!
//! Generates a unique, cryptographically random nonce per request.
//! Templates put it on `<script nonce="...">` tags (analytics snippets,
//! the hero scene bootstrap) and `security_headers_middleware` adds it to
//! the `Content-Security-Policy` header.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Third-party script hosts: htmx and the hero scene modules, plus analytics.
const SCRIPT_HOSTS: &str = "https://unpkg.com https://www.googletagmanager.com \
                            https://connect.facebook.net";

/// Hosts analytics beacons are sent to.
const CONNECT_HOSTS: &str = "https://www.google-analytics.com \
                             https://*.google-analytics.com https://www.facebook.com";

/// A CSP nonce value for inline scripts.
///
/// Each request gets a unique, cryptographically random nonce (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The `Content-Security-Policy` header value allowing this nonce.
    #[must_use]
    pub fn policy(&self) -> String {
        content_security_policy(Some(self.value()))
    }
}

/// Build the storefront CSP.
///
/// Without a nonce no inline script is allowed at all.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_src = match nonce.filter(|n| !n.is_empty()) {
        Some(n) => format!("script-src 'self' 'nonce-{n}' {SCRIPT_HOSTS}"),
        None => format!("script-src 'self' {SCRIPT_HOSTS}"),
    };

    [
        "default-src 'self'",
        script_src.as_str(),
        "style-src 'self' 'unsafe-inline'",
        "font-src 'self'",
        "img-src 'self' data: https://cdn.shopify.com https://www.facebook.com https://www.google-analytics.com",
        &format!("connect-src 'self' {CONNECT_HOSTS}"),
        "frame-src 'none'",
        "object-src 'none'",
        "base-uri 'self'",
        "form-action 'self' https://shopify.com https://*.myshopify.com",
        "frame-ancestors 'none'",
        "upgrade-insecure-requests",
    ]
    .join("; ")
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must be added before `security_headers_middleware` in the middleware stack
/// so the nonce is available when building the CSP header.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_includes_nonce() {
        let policy = CspNonce("abc123".to_string()).policy();
        assert!(policy.contains("script-src 'self' 'nonce-abc123' https://unpkg.com"));
        assert!(policy.contains("img-src 'self' data: https://cdn.shopify.com"));
        assert!(policy.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_policy_without_nonce() {
        let policy = content_security_policy(Some(""));
        assert!(!policy.contains("'nonce-"));
        assert!(policy.starts_with("default-src 'self'; script-src 'self' https://unpkg.com"));
    }
}
