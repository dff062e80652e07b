//! Owned cache with an explicit time-to-live.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

/// A cached value and when it was stored.
#[derive(Debug)]
struct Entry<V> {
    data: V,
    timestamp: Instant,
}

/// Cache whose entries go stale `ttl` after insertion.
///
/// The lock is never held across an await.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) < self.ttl
    }

    /// Fresh value for `key`. A stale entry is evicted.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = match self.entries.read() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            match entries.get(key) {
                Some(entry) if self.is_fresh(entry, now) => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Another writer may have refreshed it meanwhile.
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(
            key,
            Entry {
                data: value,
                timestamp: Instant::now(),
            },
        );
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.remove(key).is_some()
    }

    /// Drop every entry whose key matches.
    pub fn invalidate_where(&self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub fn invalidate_all(&self) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    /// Remove stale entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.timestamp) < self.ttl);
        before - entries.len()
    }

    /// Entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the fresh value, or run `fetch` and cache its success.
    ///
    /// Errors are returned without touching the cache.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
