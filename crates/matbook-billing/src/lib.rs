//! # matbook-billing
//!
//! Maps an organization's payment-provider subscription snapshot to an
//! internal plan entitlement.
//!
//! Resolution never fails: any snapshot that is absent, partial, inactive,
//! expired beyond the one-day grace period, or priced outside the catalog
//! resolves to the free plan. The only error path is building a
//! [`PlanCatalog`] without a free plan, which is caught at startup.
//!
//! ```rust
//! use matbook_billing::{BillingService, PlanCatalog};
//! use matbook_core::{BillingConfig, PlanId};
//!
//! let catalog = PlanCatalog::from_config(&BillingConfig::default()).unwrap();
//! let billing = BillingService::new(catalog);
//! let details = billing.determine_subscription_plan(None);
//! assert!(!details.is_paid());
//! assert_eq!(details.plan().id, PlanId::Free);
//! ```

pub mod catalog;
pub mod clock;
pub mod error;
pub mod service;
pub mod subscription;

pub use catalog::PlanCatalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::BillingError;
pub use service::{BillingService, FreeReason, GRACE_PERIOD_MS, PlanDetails, PlanResolution};
pub use subscription::{SubscriptionSnapshot, SubscriptionStatus};
