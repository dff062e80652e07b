//! Static plan catalog.

use matbook_core::{BillingConfig, BillingEnvironment, BillingInterval, PlanDefinition, PlanId};
use std::collections::HashSet;

use crate::error::BillingError;

/// Validated set of plans for one billing environment.
///
/// A catalog always holds a free plan; construction fails otherwise.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    environment: BillingEnvironment,
    plans: Vec<PlanDefinition>,
    free: PlanDefinition,
}

impl PlanCatalog {
    /// Build and validate a catalog.
    pub fn new(
        environment: BillingEnvironment,
        plans: Vec<PlanDefinition>,
    ) -> Result<Self, BillingError> {
        let mut ids = HashSet::new();
        let mut price_ids = HashSet::new();

        for plan in &plans {
            if !ids.insert(plan.id) {
                return Err(BillingError::DuplicatePlan(plan.id));
            }
            for interval in [BillingInterval::Monthly, BillingInterval::Annual] {
                if let Some(price_id) = plan.prices.price_id(interval, environment) {
                    if !price_ids.insert(price_id.to_string()) {
                        return Err(BillingError::DuplicatePriceId(price_id.to_string()));
                    }
                }
            }
        }

        let free = plans
            .iter()
            .find(|plan| plan.id == PlanId::Free)
            .cloned()
            .ok_or(BillingError::MissingFreePlan)?;

        Ok(Self {
            environment,
            plans,
            free,
        })
    }

    /// Build from the `billing` configuration section.
    pub fn from_config(config: &BillingConfig) -> Result<Self, BillingError> {
        Self::new(config.environment, config.plans.clone())
    }

    pub fn environment(&self) -> BillingEnvironment {
        self.environment
    }

    /// All plans, in configuration order.
    pub fn plans(&self) -> &[PlanDefinition] {
        &self.plans
    }

    /// The fallback plan.
    pub fn free(&self) -> &PlanDefinition {
        &self.free
    }

    pub fn get(&self, id: PlanId) -> Option<&PlanDefinition> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    /// Find the plan carrying `price_id` in the active environment.
    pub fn find_by_price_id(&self, price_id: &str) -> Option<(&PlanDefinition, BillingInterval)> {
        self.plans.iter().find_map(|plan| {
            plan.prices
                .interval_for(price_id, self.environment)
                .map(|interval| (plan, interval))
        })
    }

    /// Price id to charge for `plan` at `interval`, e.g. for checkout.
    pub fn price_id_for(&self, plan: PlanId, interval: BillingInterval) -> Option<&str> {
        self.get(plan)
            .and_then(|plan| plan.prices.price_id(interval, self.environment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matbook_core::{PlanPrices, PriceIds};

    fn starter() -> PlanDefinition {
        PlanDefinition {
            id: PlanId::Starter,
            name: "Starter".to_string(),
            description: None,
            limits: Default::default(),
            prices: PlanPrices {
                monthly: PriceIds {
                    test: Some("price_test_starter_m".to_string()),
                    live: Some("price_live_starter_m".to_string()),
                },
                annual: PriceIds {
                    test: Some("price_test_starter_y".to_string()),
                    live: None,
                },
            },
        }
    }

    #[test]
    fn test_missing_free_plan_is_rejected() {
        let err = PlanCatalog::new(BillingEnvironment::Test, vec![starter()]).unwrap_err();
        assert_eq!(err, BillingError::MissingFreePlan);
    }

    #[test]
    fn test_duplicate_plan_is_rejected() {
        let err = PlanCatalog::new(
            BillingEnvironment::Test,
            vec![PlanDefinition::free(), starter(), starter()],
        )
        .unwrap_err();
        assert_eq!(err, BillingError::DuplicatePlan(PlanId::Starter));
    }

    #[test]
    fn test_duplicate_price_id_is_rejected() {
        let mut pro = starter();
        pro.id = PlanId::Pro;
        pro.prices.monthly.live = Some("price_live_pro_m".to_string());

        let plans = vec![PlanDefinition::free(), starter(), pro];
        let err = PlanCatalog::new(BillingEnvironment::Test, plans.clone()).unwrap_err();
        assert_eq!(
            err,
            BillingError::DuplicatePriceId("price_test_starter_m".to_string())
        );

        // Live ids differ, so the live catalog is fine.
        assert!(PlanCatalog::new(BillingEnvironment::Live, plans).is_ok());
    }

    #[test]
    fn test_price_lookup_uses_active_environment() {
        let plans = vec![PlanDefinition::free(), starter()];
        let test = PlanCatalog::new(BillingEnvironment::Test, plans.clone()).unwrap();
        let live = PlanCatalog::new(BillingEnvironment::Live, plans).unwrap();

        let (plan, interval) = test.find_by_price_id("price_test_starter_y").unwrap();
        assert_eq!(plan.id, PlanId::Starter);
        assert_eq!(interval, BillingInterval::Annual);
        assert!(live.find_by_price_id("price_test_starter_y").is_none());

        assert_eq!(
            live.price_id_for(PlanId::Starter, BillingInterval::Monthly),
            Some("price_live_starter_m")
        );
        assert_eq!(live.price_id_for(PlanId::Starter, BillingInterval::Annual), None);
        assert_eq!(live.price_id_for(PlanId::Free, BillingInterval::Monthly), None);
    }

    #[test]
    fn test_default_config_catalog() {
        let catalog = PlanCatalog::from_config(&BillingConfig::default()).unwrap();
        assert_eq!(catalog.plans().len(), 1);
        assert_eq!(catalog.free().id, PlanId::Free);
    }
}
