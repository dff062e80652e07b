//! Error types for the billing crate.

use matbook_core::PlanId;
use thiserror::Error;

/// Plan catalog integrity errors.
///
/// These are deployment defects surfaced when the catalog is built, never
/// per-request failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingError {
    /// The catalog has no `free` plan to fall back to.
    #[error("plan catalog has no free plan")]
    MissingFreePlan,

    /// The same plan id is configured twice.
    #[error("plan '{0}' is configured more than once")]
    DuplicatePlan(PlanId),

    /// Two plans share a price id in the same environment.
    #[error("price id '{0}' is assigned to more than one plan")]
    DuplicatePriceId(String),
}
