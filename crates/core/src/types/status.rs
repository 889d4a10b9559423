//! Order status enums shown on the account pages.
//!
//! Both enums deserialize from Shopify's SCREAMING_SNAKE_CASE strings and fall
//! back to `Unknown` for values added to the API later.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Visual tone of a status badge; rendered as a CSS modifier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Success,
    Info,
    Warning,
    Danger,
    Neutral,
}

impl StatusTone {
    /// CSS class suffix, e.g. `badge--success`.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Neutral => "neutral",
        }
    }
}

/// Order fulfillment status.
///
/// Covers both the order-level display status and the per-fulfillment
/// status the Customer Account API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Delivered,
    InTransit,
    OutForDelivery,
    Open,
    Pending,
    Success,
    Cancelled,
    Error,
    Failure,
    #[serde(other)]
    Unknown,
}

impl FulfillmentStatus {
    /// Parse an API value, mapping anything unrecognized to `Unknown`.
    #[must_use]
    pub fn from_api(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "UNFULFILLED" => Self::Unfulfilled,
            "PARTIALLY_FULFILLED" => Self::PartiallyFulfilled,
            "FULFILLED" => Self::Fulfilled,
            "DELIVERED" => Self::Delivered,
            "IN_TRANSIT" => Self::InTransit,
            "OUT_FOR_DELIVERY" => Self::OutForDelivery,
            "OPEN" => Self::Open,
            "PENDING" => Self::Pending,
            "SUCCESS" => Self::Success,
            "CANCELLED" => Self::Cancelled,
            "ERROR" => Self::Error,
            "FAILURE" => Self::Failure,
            _ => Self::Unknown,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unfulfilled => "Unfulfilled",
            Self::PartiallyFulfilled => "Partially fulfilled",
            Self::Fulfilled | Self::Success => "Fulfilled",
            Self::Delivered => "Delivered",
            Self::InTransit => "In transit",
            Self::OutForDelivery => "Out for delivery",
            Self::Open => "Open",
            Self::Pending => "Pending",
            Self::Cancelled => "Cancelled",
            Self::Error | Self::Failure => "Failed",
            Self::Unknown => "Unknown",
        }
    }

    /// Badge tone.
    #[must_use]
    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Delivered => StatusTone::Success,
            Self::Fulfilled | Self::Success | Self::InTransit | Self::OutForDelivery => {
                StatusTone::Info
            }
            Self::PartiallyFulfilled | Self::Open | Self::Pending => StatusTone::Warning,
            Self::Cancelled | Self::Error | Self::Failure => StatusTone::Danger,
            Self::Unfulfilled | Self::Unknown => StatusTone::Neutral,
        }
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order financial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    Expired,
    #[serde(other)]
    Unknown,
}

impl FinancialStatus {
    /// Parse an API value, mapping anything unrecognized to `Unknown`.
    #[must_use]
    pub fn from_api(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "AUTHORIZED" => Self::Authorized,
            "PARTIALLY_PAID" => Self::PartiallyPaid,
            "PAID" => Self::Paid,
            "PARTIALLY_REFUNDED" => Self::PartiallyRefunded,
            "REFUNDED" => Self::Refunded,
            "VOIDED" => Self::Voided,
            "EXPIRED" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Authorized => "Authorized",
            Self::PartiallyPaid => "Partially paid",
            Self::Paid => "Paid",
            Self::PartiallyRefunded => "Partially refunded",
            Self::Refunded => "Refunded",
            Self::Voided => "Voided",
            Self::Expired => "Expired",
            Self::Unknown => "Unknown",
        }
    }

    /// Badge tone.
    #[must_use]
    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Paid => StatusTone::Success,
            Self::Authorized | Self::PartiallyPaid => StatusTone::Info,
            Self::Pending | Self::PartiallyRefunded => StatusTone::Warning,
            Self::Refunded | Self::Voided | Self::Expired => StatusTone::Danger,
            Self::Unknown => StatusTone::Neutral,
        }
    }
}

impl fmt::Display for FinancialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_from_api() {
        assert_eq!(
            FulfillmentStatus::from_api("PARTIALLY_FULFILLED"),
            FulfillmentStatus::PartiallyFulfilled
        );
        assert_eq!(
            FulfillmentStatus::from_api("delivered"),
            FulfillmentStatus::Delivered
        );
        assert_eq!(
            FulfillmentStatus::from_api("SOMETHING_NEW"),
            FulfillmentStatus::Unknown
        );
    }

    #[test]
    fn test_fulfillment_badges() {
        assert_eq!(FulfillmentStatus::Delivered.tone(), StatusTone::Success);
        assert_eq!(FulfillmentStatus::Fulfilled.tone(), StatusTone::Info);
        assert_eq!(
            FulfillmentStatus::PartiallyFulfilled.tone(),
            StatusTone::Warning
        );
        assert_eq!(FulfillmentStatus::Unfulfilled.tone(), StatusTone::Neutral);
        assert_eq!(FulfillmentStatus::default().label(), "Unfulfilled");
    }

    #[test]
    fn test_financial_deserialize_unknown() {
        let status: FinancialStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(status, FinancialStatus::Paid);

        let status: FinancialStatus = serde_json::from_str("\"CHARGEBACK\"").unwrap();
        assert_eq!(status, FinancialStatus::Unknown);
    }

    #[test]
    fn test_financial_labels() {
        assert_eq!(FinancialStatus::PartiallyRefunded.to_string(), "Partially refunded");
        assert_eq!(FinancialStatus::Paid.tone().css_class(), "success");
    }
}
