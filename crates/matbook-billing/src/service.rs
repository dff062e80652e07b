//! Subscription plan resolution.
//!
//! An organization is on a paid plan only when its snapshot has a
//! subscription id, a price id, an `active` status, and a current period
//! that ended less than [`GRACE_PERIOD_MS`] ago. The price id must also
//! belong to a configured plan. Everything else resolves to the free plan.

use chrono::{DateTime, Duration, Utc};
use matbook_core::{BillingInterval, PlanDefinition};
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::PlanCatalog;
use crate::clock::{Clock, SystemClock};
use crate::subscription::{SubscriptionSnapshot, SubscriptionStatus};

/// Time after the nominal period end during which a subscription still counts.
pub const GRACE_PERIOD_MS: i64 = 24 * 60 * 60 * 1000;

/// Resolved billing entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    is_paid: bool,
    plan: PlanDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    stripe_details: Option<SubscriptionSnapshot>,
}

impl PlanDetails {
    pub fn paid(plan: PlanDefinition, stripe_details: SubscriptionSnapshot) -> Self {
        Self {
            is_paid: true,
            plan,
            stripe_details: Some(stripe_details),
        }
    }

    pub fn free(plan: PlanDefinition) -> Self {
        Self {
            is_paid: false,
            plan,
            stripe_details: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn plan(&self) -> &PlanDefinition {
        &self.plan
    }

    /// Present iff the plan is paid.
    pub fn stripe_details(&self) -> Option<&SubscriptionSnapshot> {
        self.stripe_details.as_ref()
    }
}

/// Why a snapshot did not resolve to a paid plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeReason {
    NoSubscription,
    MissingSubscriptionId,
    MissingPriceId,
    NotActive(Option<SubscriptionStatus>),
    MissingPeriodEnd,
    PeriodExpired(DateTime<Utc>),
    /// The gate passed but no plan carries this price id.
    UnknownPrice(String),
}

impl std::fmt::Display for FreeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSubscription => write!(f, "no subscription"),
            Self::MissingSubscriptionId => write!(f, "missing subscription id"),
            Self::MissingPriceId => write!(f, "missing price id"),
            Self::NotActive(Some(status)) => write!(f, "status is {}", status),
            Self::NotActive(None) => write!(f, "status is missing"),
            Self::MissingPeriodEnd => write!(f, "missing current period end"),
            Self::PeriodExpired(end) => write!(f, "period ended at {} and grace is over", end),
            Self::UnknownPrice(price_id) => write!(f, "price id '{}' matches no plan", price_id),
        }
    }
}

/// Outcome of evaluating a snapshot against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResolution<'a> {
    Paid {
        plan: &'a PlanDefinition,
        interval: BillingInterval,
    },
    Free(FreeReason),
}

/// Billing entitlement service.
#[derive(Clone)]
pub struct BillingService {
    catalog: Arc<PlanCatalog>,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    /// Create a service reading the system clock.
    pub fn new(catalog: PlanCatalog) -> Self {
        Self::with_clock(catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(catalog: PlanCatalog, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            clock,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Resolve the entitlement for a snapshot at the clock's current time.
    pub fn determine_subscription_plan(
        &self,
        snapshot: Option<&SubscriptionSnapshot>,
    ) -> PlanDetails {
        self.determine_subscription_plan_at(snapshot, self.clock.now())
    }

    /// Resolve the entitlement for a snapshot at `now`.
    pub fn determine_subscription_plan_at(
        &self,
        snapshot: Option<&SubscriptionSnapshot>,
        now: DateTime<Utc>,
    ) -> PlanDetails {
        let resolution = self.evaluate(snapshot, now);
        self.plan_details(&resolution, snapshot)
    }

    /// Turn an evaluated resolution into the entitlement for `snapshot`.
    ///
    /// `snapshot` must be the one `resolution` was evaluated from.
    pub fn plan_details(
        &self,
        resolution: &PlanResolution<'_>,
        snapshot: Option<&SubscriptionSnapshot>,
    ) -> PlanDetails {
        match (resolution, snapshot) {
            (PlanResolution::Paid { plan, interval }, Some(snapshot)) => {
                tracing::debug!(plan = %plan.id, interval = %interval, "Resolved paid plan");
                PlanDetails::paid((*plan).clone(), snapshot.clone())
            }
            (PlanResolution::Free(reason), _) => {
                match reason {
                    FreeReason::UnknownPrice(price_id) => tracing::warn!(
                        price_id = %price_id,
                        environment = %self.catalog.environment(),
                        "Active subscription has a price id outside the plan catalog"
                    ),
                    other => tracing::debug!(reason = %other, "Falling back to free plan"),
                }
                PlanDetails::free(self.catalog.free().clone())
            }
            (PlanResolution::Paid { .. }, None) => PlanDetails::free(self.catalog.free().clone()),
        }
    }

    /// Evaluate the paid-plan gate and explain the outcome.
    pub fn evaluate(
        &self,
        snapshot: Option<&SubscriptionSnapshot>,
        now: DateTime<Utc>,
    ) -> PlanResolution<'_> {
        let Some(snapshot) = snapshot else {
            return PlanResolution::Free(FreeReason::NoSubscription);
        };
        if snapshot.stripe_subscription_id.is_none() {
            return PlanResolution::Free(FreeReason::MissingSubscriptionId);
        }
        let Some(price_id) = snapshot.stripe_subscription_price_id.as_deref() else {
            return PlanResolution::Free(FreeReason::MissingPriceId);
        };
        if snapshot.stripe_subscription_status != Some(SubscriptionStatus::Active) {
            return PlanResolution::Free(FreeReason::NotActive(
                snapshot.stripe_subscription_status,
            ));
        }
        let Some(period_end) = snapshot.stripe_subscription_current_period_end else {
            return PlanResolution::Free(FreeReason::MissingPeriodEnd);
        };
        if !within_grace(period_end, now) {
            return PlanResolution::Free(FreeReason::PeriodExpired(period_end));
        }

        match self.catalog.find_by_price_id(price_id) {
            Some((plan, interval)) => PlanResolution::Paid { plan, interval },
            None => PlanResolution::Free(FreeReason::UnknownPrice(price_id.to_string())),
        }
    }
}

fn within_grace(period_end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match period_end.checked_add_signed(Duration::milliseconds(GRACE_PERIOD_MS)) {
        Some(grace_end) => grace_end > now,
        // Past the representable range, so far in the future.
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use matbook_core::{BillingEnvironment, PlanId, PlanPrices, PriceIds};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn pro() -> PlanDefinition {
        PlanDefinition {
            id: PlanId::Pro,
            name: "Pro".to_string(),
            description: None,
            limits: Default::default(),
            prices: PlanPrices {
                monthly: PriceIds {
                    test: Some("price_pro_m".to_string()),
                    live: None,
                },
                annual: PriceIds {
                    test: Some("price_pro_y".to_string()),
                    live: None,
                },
            },
        }
    }

    fn service() -> BillingService {
        let catalog =
            PlanCatalog::new(BillingEnvironment::Test, vec![PlanDefinition::free(), pro()])
                .unwrap();
        BillingService::with_clock(catalog, Arc::new(FixedClock(now())))
    }

    fn active(price_id: &str, period_end: DateTime<Utc>) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            stripe_subscription_id: Some("sub_1".to_string()),
            stripe_subscription_price_id: Some(price_id.to_string()),
            stripe_subscription_status: Some(SubscriptionStatus::Active),
            stripe_subscription_current_period_end: Some(period_end),
        }
    }

    #[test]
    fn test_no_snapshot_is_free() {
        let details = service().determine_subscription_plan(None);
        assert!(!details.is_paid());
        assert_eq!(details.plan().id, PlanId::Free);
        assert!(details.stripe_details().is_none());
    }

    #[test]
    fn test_active_configured_price_is_paid() {
        let snapshot = active("price_pro_m", now());
        let details = service().determine_subscription_plan(Some(&snapshot));
        assert!(details.is_paid());
        assert_eq!(details.plan().id, PlanId::Pro);
        assert_eq!(details.stripe_details(), Some(&snapshot));
    }

    #[test]
    fn test_annual_price_matches_too() {
        let snapshot = active("price_pro_y", now());
        let service = service();
        assert_eq!(
            service.evaluate(Some(&snapshot), now()),
            PlanResolution::Paid {
                plan: service.catalog().get(PlanId::Pro).unwrap(),
                interval: BillingInterval::Annual,
            }
        );
    }

    #[test]
    fn test_non_active_status_is_free() {
        for status in [
            None,
            Some(SubscriptionStatus::Trialing),
            Some(SubscriptionStatus::PastDue),
            Some(SubscriptionStatus::Canceled),
            Some(SubscriptionStatus::Unknown),
        ] {
            let mut snapshot = active("price_pro_m", now());
            snapshot.stripe_subscription_status = status;
            let service = service();
            let details = service.determine_subscription_plan(Some(&snapshot));
            assert!(!details.is_paid());
            assert_eq!(details.plan().id, PlanId::Free);
            assert_eq!(
                service.evaluate(Some(&snapshot), now()),
                PlanResolution::Free(FreeReason::NotActive(status))
            );
        }
    }

    #[test]
    fn test_unknown_price_is_free() {
        let snapshot = active("unknown-id", now());
        let service = service();
        let details = service.determine_subscription_plan(Some(&snapshot));
        assert!(!details.is_paid());
        assert_eq!(details.plan().id, PlanId::Free);
        assert_eq!(
            service.evaluate(Some(&snapshot), now()),
            PlanResolution::Free(FreeReason::UnknownPrice("unknown-id".to_string()))
        );
    }

    #[test]
    fn test_missing_fields_are_free() {
        let service = service();

        let mut snapshot = active("price_pro_m", now());
        snapshot.stripe_subscription_id = None;
        assert_eq!(
            service.evaluate(Some(&snapshot), now()),
            PlanResolution::Free(FreeReason::MissingSubscriptionId)
        );

        let mut snapshot = active("price_pro_m", now());
        snapshot.stripe_subscription_price_id = None;
        assert_eq!(
            service.evaluate(Some(&snapshot), now()),
            PlanResolution::Free(FreeReason::MissingPriceId)
        );

        let mut snapshot = active("price_pro_m", now());
        snapshot.stripe_subscription_current_period_end = None;
        assert_eq!(
            service.evaluate(Some(&snapshot), now()),
            PlanResolution::Free(FreeReason::MissingPeriodEnd)
        );

        let empty = SubscriptionSnapshot::default();
        assert!(!service.determine_subscription_plan(Some(&empty)).is_paid());
    }

    #[test]
    fn test_grace_period_boundaries() {
        let service = service();
        let grace = Duration::milliseconds(GRACE_PERIOD_MS);

        let within = active("price_pro_m", now() - grace + Duration::milliseconds(1));
        assert!(service.determine_subscription_plan(Some(&within)).is_paid());

        let hours_ago = active("price_pro_m", now() - Duration::hours(23));
        assert!(service.determine_subscription_plan(Some(&hours_ago)).is_paid());

        // Strictly greater: exactly one grace period ago is already expired.
        let exact = active("price_pro_m", now() - grace);
        assert!(!service.determine_subscription_plan(Some(&exact)).is_paid());

        let expired = active("price_pro_m", now() - Duration::days(2));
        let details = service.determine_subscription_plan(Some(&expired));
        assert!(!details.is_paid());
        assert_eq!(details.plan().id, PlanId::Free);
    }

    #[test]
    fn test_explicit_instant_overrides_clock() {
        let service = service();
        let snapshot = active("price_pro_m", now());
        let later = now() + Duration::days(3);
        assert!(!service
            .determine_subscription_plan_at(Some(&snapshot), later)
            .is_paid());
    }

    #[test]
    fn test_plan_details_from_one_evaluation() {
        let service = service();
        let snapshot = active("price_pro_m", now());
        let resolution = service.evaluate(Some(&snapshot), now());
        let details = service.plan_details(&resolution, Some(&snapshot));
        assert_eq!(
            details,
            service.determine_subscription_plan_at(Some(&snapshot), now())
        );
        assert!(details.is_paid());

        let free = service.plan_details(&PlanResolution::Free(FreeReason::NoSubscription), None);
        assert_eq!(free.plan().id, PlanId::Free);
    }

    #[test]
    fn test_epoch_millis_snapshot_resolves() {
        let service = service();
        let snapshot: SubscriptionSnapshot = serde_json::from_value(serde_json::json!({
            "stripeSubscriptionId": "sub_1",
            "stripeSubscriptionPriceId": "price_pro_m",
            "stripeSubscriptionStatus": "active",
            "stripeSubscriptionCurrentPeriodEnd": now().timestamp_millis(),
        }))
        .unwrap();
        assert!(service.determine_subscription_plan(Some(&snapshot)).is_paid());
    }

    #[test]
    fn test_serialized_shape() {
        let service = service();
        let paid = serde_json::to_value(
            service.determine_subscription_plan(Some(&active("price_pro_m", now()))),
        )
        .unwrap();
        assert_eq!(paid["isPaid"], true);
        assert_eq!(paid["plan"]["id"], "pro");
        assert_eq!(paid["stripeDetails"]["stripeSubscriptionId"], "sub_1");

        let free = serde_json::to_value(service.determine_subscription_plan(None)).unwrap();
        assert_eq!(free["isPaid"], false);
        assert_eq!(free["plan"]["id"], "free");
        assert!(free.get("stripeDetails").is_none());
    }
}
