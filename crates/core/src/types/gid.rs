//! Shopify global IDs.
//!
//! Every Shopify resource is addressed by a GID such as
//! `gid://shopify/Order/5678` or `gid://shopify/Cart/c1-abc?key=xyz`. GIDs
//! contain slashes, so when one has to travel in a URL path segment (order
//! detail links) it is wrapped in URL-safe base64 via [`ShopifyGid::to_url_token`].

use core::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

const PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a [`ShopifyGid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The string does not start with `gid://shopify/`.
    #[error("not a Shopify GID: {0}")]
    MissingPrefix(String),
    /// The resource type or id segment is missing.
    #[error("malformed Shopify GID: {0}")]
    Malformed(String),
    /// A URL token could not be decoded.
    #[error("invalid GID token")]
    InvalidToken,
}

/// A parsed Shopify global ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopifyGid {
    raw: String,
    type_end: usize,
}

impl ShopifyGid {
    /// Parse a GID string.
    ///
    /// # Errors
    ///
    /// Returns [`GidError`] if the prefix, type or id is missing.
    pub fn parse(s: &str) -> Result<Self, GidError> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| GidError::MissingPrefix(s.to_owned()))?;
        let (resource_type, id) = rest
            .split_once('/')
            .ok_or_else(|| GidError::Malformed(s.to_owned()))?;

        let valid_type = !resource_type.is_empty()
            && resource_type.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_type || id.is_empty() || id.contains('/') {
            return Err(GidError::Malformed(s.to_owned()));
        }

        Ok(Self {
            raw: s.to_owned(),
            type_end: PREFIX.len() + resource_type.len(),
        })
    }

    /// Resource type, e.g. `Order`.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.raw.get(PREFIX.len()..self.type_end).unwrap_or("")
    }

    /// Resource id including any `?key=` suffix, e.g. `5678`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.raw.get(self.type_end + 1..).unwrap_or("")
    }

    /// Resource id without the query suffix.
    #[must_use]
    pub fn bare_id(&self) -> &str {
        let id = self.id();
        id.split_once('?').map_or(id, |(bare, _)| bare)
    }

    /// Whether this GID addresses the given resource type.
    #[must_use]
    pub fn is(&self, resource_type: &str) -> bool {
        self.resource_type() == resource_type
    }

    /// The full GID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Encode as a path-safe token.
    #[must_use]
    pub fn to_url_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.raw.as_bytes())
    }

    /// Decode a token produced by [`Self::to_url_token`].
    ///
    /// Standard padded base64 is accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`GidError::InvalidToken`] if the token is not base64 or does
    /// not decode to a GID.
    pub fn from_url_token(token: &str) -> Result<Self, GidError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(token))
            .map_err(|_| GidError::InvalidToken)?;
        let s = String::from_utf8(bytes).map_err(|_| GidError::InvalidToken)?;
        Self::parse(&s).map_err(|_| GidError::InvalidToken)
    }
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ShopifyGid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopifyGid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopifyGid> for String {
    fn from(gid: ShopifyGid) -> Self {
        gid.raw
    }
}
