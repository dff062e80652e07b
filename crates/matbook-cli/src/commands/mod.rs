//! CLI command implementations.

pub mod check;
pub mod diff;
pub mod plan;
pub mod serve;
