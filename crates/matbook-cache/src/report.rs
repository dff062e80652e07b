//! Keys for cached report payloads.

use chrono::NaiveDate;
use matbook_core::CacheConfig;
use serde::{Deserialize, Serialize};

use crate::source::{ReportError, ReportSource};
use crate::ttl::TtlCache;

/// Dashboard report families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Attendance,
    Revenue,
    MembershipGrowth,
    ClassUtilization,
    Retention,
}

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Identifies one cached report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportKey {
    pub org_id: String,
    pub report: ReportKind,
    pub range: ReportRange,
}

impl ReportKey {
    pub fn new(org_id: impl Into<String>, report: ReportKind, range: ReportRange) -> Self {
        Self {
            org_id: org_id.into(),
            report,
            range,
        }
    }
}

/// Report payload cache keyed by organization, report and range.
pub struct ReportCache<V> {
    inner: TtlCache<ReportKey, V>,
}

impl<V: Clone> ReportCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: TtlCache::new(config.report_ttl()),
        }
    }

    pub fn cache(&self) -> &TtlCache<ReportKey, V> {
        &self.inner
    }

    /// Return the cached report, or fetch it from `source` and cache it.
    ///
    /// Failed fetches are not cached.
    pub async fn get_or_fetch(
        &self,
        key: ReportKey,
        source: &dyn ReportSource<V>,
    ) -> Result<V, ReportError> {
        self.inner
            .get_or_try_insert_with(key.clone(), || async {
                tracing::debug!(org = %key.org_id, report = ?key.report, "Report cache miss");
                source.fetch(&key).await
            })
            .await
    }

    /// Drop every cached report for an organization, e.g. after a write
    /// that affects its figures.
    pub fn invalidate_org(&self, org_id: &str) -> usize {
        let removed = self.inner.invalidate_where(|key| key.org_id == org_id);
        tracing::debug!(org = %org_id, removed, "Invalidated cached reports");
        removed
    }

    /// Drop one report family for an organization across all ranges.
    pub fn invalidate_report(&self, org_id: &str, report: ReportKind) -> usize {
        self.inner
            .invalidate_where(|key| key.org_id == org_id && key.report == report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::NoReportSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn range(month: u32) -> ReportRange {
        ReportRange {
            from: NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, month, 28).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_invalidate_org_is_tenant_scoped() {
        let cache: ReportCache<Vec<u32>> = ReportCache::new(&CacheConfig::default());
        let inner = cache.cache();
        inner.insert(ReportKey::new("org_a", ReportKind::Revenue, range(1)), vec![1]);
        inner.insert(ReportKey::new("org_a", ReportKind::Attendance, range(1)), vec![2]);
        inner.insert(ReportKey::new("org_b", ReportKind::Revenue, range(1)), vec![3]);

        assert_eq!(cache.invalidate_org("org_a"), 2);
        assert_eq!(inner.len(), 1);
        assert_eq!(
            inner.get(&ReportKey::new("org_b", ReportKind::Revenue, range(1))),
            Some(vec![3])
        );
    }

    #[tokio::test]
    async fn test_invalidate_report_spans_ranges() {
        let cache: ReportCache<u32> = ReportCache::new(&CacheConfig::default());
        let inner = cache.cache();
        inner.insert(ReportKey::new("org_a", ReportKind::Retention, range(1)), 1);
        inner.insert(ReportKey::new("org_a", ReportKind::Retention, range(2)), 2);
        inner.insert(ReportKey::new("org_a", ReportKind::Revenue, range(2)), 3);

        assert_eq!(cache.invalidate_report("org_a", ReportKind::Retention), 2);
        assert_eq!(inner.len(), 1);
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ReportSource<String> for CountingSource {
        async fn fetch(&self, key: &ReportKey) -> Result<String, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ReportError::Failed("backend down".to_string()));
            }
            Ok(format!("{}:{:?}", key.org_id, key.report))
        }
    }

    #[tokio::test]
    async fn test_get_or_fetch_fills_cache_once() {
        let cache: ReportCache<String> = ReportCache::new(&CacheConfig::default());
        let source = CountingSource { calls: AtomicUsize::new(0), fail: false };
        let key = ReportKey::new("org_a", ReportKind::Revenue, range(1));

        let first = cache.get_or_fetch(key.clone(), &source).await.unwrap();
        let second = cache.get_or_fetch(key.clone(), &source).await.unwrap();
        assert_eq!(first, "org_a:Revenue");
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        cache.invalidate_org("org_a");
        cache.get_or_fetch(key, &source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache: ReportCache<String> = ReportCache::new(&CacheConfig::default());
        let source = CountingSource { calls: AtomicUsize::new(0), fail: true };
        let key = ReportKey::new("org_a", ReportKind::Retention, range(1));

        assert!(matches!(
            cache.get_or_fetch(key.clone(), &source).await,
            Err(ReportError::Failed(_))
        ));
        assert!(cache.cache().is_empty());

        let missing = cache.get_or_fetch(key, &NoReportSource).await;
        assert!(matches!(missing, Err(ReportError::Unavailable(_))));
    }

    #[test]
    fn test_ttl_comes_from_config() {
        let cache: ReportCache<u32> = ReportCache::new(&CacheConfig { report_ttl_secs: 15 });
        assert_eq!(cache.cache().ttl(), std::time::Duration::from_secs(15));
    }
}
