//! # matbook-cache
//!
//! Explicit, owned caches with a time-to-live.
//!
//! A [`TtlCache`] is created by whoever owns its lifetime (an application
//! state, a request scope) rather than living in a global. Entries record
//! when they were stored; reads only return entries younger than the TTL,
//! and callers invalidate explicitly after writes. Misses are filled from a
//! [`ReportSource`].

pub mod report;
pub mod source;
pub mod ttl;

pub use report::{ReportCache, ReportKey, ReportKind, ReportRange};
pub use source::{NoReportSource, ReportError, ReportSource};
pub use ttl::TtlCache;
