//! In-memory LRU cache with per-entry expiry on an injected clock.
//!
//! Used for collaborator responses (news headlines) that are cheap to keep
//! and slow to fetch. Expiry is lazy: a stale entry is dropped when read.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use sat_common::Clock;
use tokio::sync::RwLock;

struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Hit/miss counters.
#[derive(Debug, Default)]
pub struct TtlCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
    pub evictions: AtomicU64,
}

impl TtlCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

pub struct TtlCache<K: Hash + Eq, V: Clone> {
    entries: RwLock<LruCache<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    stats: TtlCacheStats,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
            clock,
            stats: TtlCacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let fresh = match entries.get(key) {
            Some(entry) => now - entry.inserted_at < self.ttl,
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if fresh {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            entries.get(key).map(|e| e.value.clone())
        } else {
            entries.pop(key);
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub async fn put(&self, key: K, value: V) {
        let entry = Entry {
            value,
            inserted_at: self.clock.now(),
        };
        let mut entries = self.entries.write().await;
        let full = entries.len() == entries.cap().get();
        let contained = entries.contains(&key);
        entries.push(key, entry);
        if full && !contained {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub fn stats(&self) -> &TtlCacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sat_common::ManualClock;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::new(8, Duration::minutes(5), clock.clone());
        cache.put("general_2".to_string(), 7).await;

        clock.advance(Duration::minutes(4));
        assert_eq!(cache.get(&"general_2".to_string()).await, Some(7));
        assert_eq!(cache.stats().hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_expires_after_ttl() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::new(8, Duration::minutes(5), clock.clone());
        cache.put("clima_3".to_string(), 1).await;

        clock.advance(Duration::minutes(5));
        assert_eq!(cache.get(&"clima_3".to_string()).await, None);
        assert_eq!(cache.stats().expired.load(Ordering::Relaxed), 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache: TtlCache<u8, u8> = TtlCache::new(2, Duration::minutes(5), clock());
        cache.put(1, 1).await;
        cache.put(2, 2).await;
        assert_eq!(cache.get(&1).await, Some(1));
        cache.put(3, 3).await;

        assert_eq!(cache.get(&2).await, None);
        assert_eq!(cache.get(&1).await, Some(1));
        assert_eq!(cache.stats().evictions.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let cache: TtlCache<u8, u8> = TtlCache::new(2, Duration::minutes(5), clock());
        cache.put(1, 1).await;
        cache.get(&1).await;
        cache.get(&9).await;
        assert!((cache.stats().hit_rate() - 50.0).abs() < 1e-9);
    }
}
