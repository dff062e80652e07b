//! Billing configuration: environment and static plan catalog.

use serde::{Deserialize, Serialize};

/// Configuration for billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Which set of payment-provider price ids is in effect.
    #[serde(default)]
    pub environment: BillingEnvironment,

    /// Static plan definitions. Must contain a `free` plan.
    #[serde(default = "default_plans")]
    pub plans: Vec<PlanDefinition>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            environment: BillingEnvironment::default(),
            plans: default_plans(),
        }
    }
}

/// Payment-provider environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BillingEnvironment {
    /// Provider test mode.
    #[default]
    Test,
    /// Provider live mode.
    Live,
}

impl std::fmt::Display for BillingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Billing cadence of a price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Monthly,
    Annual,
}

impl std::fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

/// Stable plan identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One plan in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDefinition {
    /// Stable plan id.
    pub id: PlanId,

    /// Display name.
    pub name: String,

    /// Optional marketing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Entitlement limits.
    #[serde(default)]
    pub limits: PlanLimits,

    /// Price ids per interval and environment.
    #[serde(default)]
    pub prices: PlanPrices,
}

impl PlanDefinition {
    /// The built-in free plan.
    pub fn free() -> Self {
        Self {
            id: PlanId::Free,
            name: "Free".to_string(),
            description: None,
            limits: PlanLimits {
                members: Some(25),
                staff: Some(2),
                locations: Some(1),
            },
            prices: PlanPrices::default(),
        }
    }
}

/// Entitlement limits. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Active members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<u32>,

    /// Staff accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<u32>,

    /// Academy locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<u32>,
}

/// Price ids for each billing interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrices {
    #[serde(default)]
    pub monthly: PriceIds,

    #[serde(default)]
    pub annual: PriceIds,
}

impl PlanPrices {
    /// Price id for an interval in an environment.
    pub fn price_id(
        &self,
        interval: BillingInterval,
        environment: BillingEnvironment,
    ) -> Option<&str> {
        match interval {
            BillingInterval::Monthly => self.monthly.get(environment),
            BillingInterval::Annual => self.annual.get(environment),
        }
    }

    /// Which interval (if any) carries `price_id` in `environment`.
    pub fn interval_for(
        &self,
        price_id: &str,
        environment: BillingEnvironment,
    ) -> Option<BillingInterval> {
        [BillingInterval::Monthly, BillingInterval::Annual]
            .into_iter()
            .find(|interval| self.price_id(*interval, environment) == Some(price_id))
    }
}

/// Environment-specific price ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<String>,
}

impl PriceIds {
    pub fn get(&self, environment: BillingEnvironment) -> Option<&str> {
        match environment {
            BillingEnvironment::Test => self.test.as_deref(),
            BillingEnvironment::Live => self.live.as_deref(),
        }
    }
}

fn default_plans() -> Vec<PlanDefinition> {
    vec![PlanDefinition::free()]
}
