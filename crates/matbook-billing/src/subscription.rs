//! Payment-provider subscription snapshot as persisted on an organization.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Subscription status reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
    /// Any status string this build does not know about.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Point-in-time subscription state. Every field may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_price_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_status: Option<SubscriptionStatus>,
    /// Accepts epoch milliseconds or an RFC 3339 string. Anything else
    /// reads as absent.
    #[serde(default, deserialize_with = "deserialize_period_end")]
    pub stripe_subscription_current_period_end: Option<DateTime<Utc>>,
}

impl SubscriptionSnapshot {
    /// Read a snapshot from loosely typed JSON.
    ///
    /// `null` and values that are not a snapshot both yield `None`, which
    /// resolves to the free plan.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed subscription snapshot");
                None
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPeriodEnd {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    Other(IgnoredAny),
}

fn deserialize_period_end<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Option::<StoredPeriodEnd>::deserialize(deserializer)?;
    Ok(match stored {
        Some(StoredPeriodEnd::Millis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(StoredPeriodEnd::FractionalMillis(ms)) if ms.is_finite() => {
            DateTime::from_timestamp_millis(ms as i64)
        }
        Some(StoredPeriodEnd::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|end| end.with_timezone(&Utc)),
        _ => None,
    })
}
