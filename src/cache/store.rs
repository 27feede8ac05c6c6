//! Process-wide TTL store.

use std::any::{Any, type_name};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::CacheKey;

/// Counters over the store's current contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Entries that are still readable.
    pub active: usize,
    /// Entries past their TTL that have not been reclaimed yet.
    pub expired: usize,
    pub total: usize,
}

/// A single stored value with its expiration data.
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// Key to value map with a TTL per entry.
///
/// Values of any type can share one store; the key alone owns the slot and
/// a typed read of the wrong type behaves like a miss. Reads check
/// expiration on every call, so `cleanup` is only memory reclamation.
///
/// Cloning is cheap and shares the same underlying map.
#[derive(Clone, Default)]
pub struct TtlStore {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl TtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there.
    ///
    /// A zero TTL would make the entry unreadable, so it is not stored.
    pub fn set<V>(&self, key: &CacheKey, value: V, ttl: Duration)
    where
        V: Send + Sync + 'static,
    {
        if ttl.is_zero() {
            warn!("Refusing to cache {} with a zero TTL", key);
            return;
        }

        self.entries.insert(
            key.as_str().to_string(),
            CacheEntry {
                value: Arc::new(value),
                type_name: type_name::<V>(),
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Read the value under `key` if it is still within its TTL.
    ///
    /// An expired entry is removed on the way out.
    pub fn get<V>(&self, key: &CacheKey) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();

        let expired = match self.entries.get(key.as_str()) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => {
                return match entry.value.downcast_ref::<V>() {
                    Some(value) => Some(value.clone()),
                    None => {
                        warn!(
                            "Cache key {} holds {}, read as {}",
                            key,
                            entry.type_name,
                            type_name::<V>()
                        );
                        None
                    }
                };
            }
            Some(_) => true,
        };

        if expired {
            self.entries
                .remove_if(key.as_str(), |_, entry| entry.is_expired(now));
            debug!("Cache entry {} expired", key);
        }

        None
    }

    /// Whether a live entry exists under `key`, of any type.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        self.entries
            .get(key.as_str())
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remaining lifetime of the entry under `key`.
    pub fn remaining_ttl(&self, key: &CacheKey) -> Option<Duration> {
        let now = Instant::now();
        self.entries.get(key.as_str()).and_then(|entry| {
            let age = now.saturating_duration_since(entry.stored_at);
            entry.ttl.checked_sub(age)
        })
    }

    /// Remove one entry. Returns `true` if something was removed.
    pub fn delete(&self, key: &CacheKey) -> bool {
        self.entries.remove(key.as_str()).is_some()
    }

    /// Remove every entry whose key satisfies `predicate`.
    pub fn delete_matching(&self, predicate: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Reclaim entries whose TTL has elapsed. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Cache sweep removed {} expired entries", removed);
        }
        removed
    }

    pub fn stats(&self) -> StoreStats {
        let now = Instant::now();
        let mut stats = StoreStats::default();
        for entry in self.entries.iter() {
            if entry.is_expired(now) {
                stats.expired += 1;
            } else {
                stats.active += 1;
            }
        }
        stats.total = stats.active + stats.expired;
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TtlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlStore")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Resource;

    fn key(name: &str) -> CacheKey {
        CacheKey::new(Resource::Courses, [name])
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl() {
        let store = TtlStore::new();
        store.set(&key("a"), 42u32, Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(store.get::<u32>(&key("a")), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_without_cleanup() {
        let store = TtlStore::new();
        store.set(&key("a"), 42u32, Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(101)).await;
        assert_eq!(store.get::<u32>(&key("a")), None);
        // The expired read also reclaimed the slot.
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_restarts_ttl() {
        let store = TtlStore::new();
        store.set(&key("a"), 1u32, Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(80)).await;
        store.set(&key("a"), 2u32, Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(80)).await;

        assert_eq!(store.get::<u32>(&key("a")), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_and_stats() {
        let store = TtlStore::new();
        store.set(&key("short"), 1u32, Duration::from_millis(10));
        store.set(&key("long"), 2u32, Duration::from_secs(60));

        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(
            store.stats(),
            StoreStats {
                active: 1,
                expired: 1,
                total: 2
            }
        );

        assert_eq!(store.cleanup(), 1);
        assert_eq!(store.stats().total, 1);
        assert_eq!(store.get::<u32>(&key("long")), Some(2));
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let store = TtlStore::new();
        store.set(&key("a"), "text".to_string(), Duration::from_secs(1));
        assert_eq!(store.get::<u32>(&key("a")), None);
        assert_eq!(store.get::<String>(&key("a")).as_deref(), Some("text"));
    }

    #[test]
    fn test_zero_ttl_not_stored() {
        let store = TtlStore::new();
        store.set(&key("a"), 1u32, Duration::ZERO);
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_matching() {
        let store = TtlStore::new();
        store.set(&key("a"), 1u32, Duration::from_secs(1));
        store.set(&key("b"), 2u32, Duration::from_secs(1));

        assert_eq!(store.delete_matching(|k| k.ends_with(":a")), 1);
        assert!(!store.contains(&key("a")));
        assert!(store.delete(&key("b")));
        assert!(store.is_empty());
    }
}
