//! Bounded media cache
//!
//! Capacity- and time-bounded LRU store of resolved media handles. Keys are
//! the resource URLs verbatim: two strings differing only in whitespace or
//! parameter order are distinct keys by design. Entries past their TTL are
//! treated as absent by `get`/`has` even before a sweep physically removes
//! them; the sweep itself runs from a periodic background task, never on the
//! request path.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::fetch::MediaHandle;

/// A cached media handle plus its insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    handle: MediaHandle,
    inserted_at: Instant,
}

/// Capacity- and TTL-bounded LRU cache of resolved media handles
pub struct MediaCache {
    /// Ordered mapping; re-insertion moves a key to the freshest end
    inner: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

/// Observability snapshot of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl: Duration,
}

impl MediaCache {
    /// Create a cache from configuration
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity)
            .unwrap_or_else(|| NonZeroUsize::new(1).expect("1 is non-zero"));

        Self {
            inner: RwLock::new(LruCache::new(capacity)),
            ttl: config.ttl,
            capacity: capacity.get(),
        }
    }

    /// Look up a live entry, promoting it to most-recently-used on hit
    ///
    /// Expired entries are reported absent without being promoted.
    pub async fn get(&self, key: &str) -> Option<MediaHandle> {
        let mut cache = self.inner.write().await;

        let live = match cache.peek(key) {
            Some(entry) => entry.inserted_at.elapsed() <= self.ttl,
            None => return None,
        };
        if !live {
            return None;
        }

        // Promote only live hits
        cache.get(key).map(|entry| entry.handle.clone())
    }

    /// Insert or update an entry, resetting its age to zero
    ///
    /// At capacity the single least-recently-used entry is evicted first.
    /// The evict-then-insert pair happens under one write guard with no
    /// suspension point in between.
    pub async fn set(&self, key: &str, handle: MediaHandle) {
        let mut cache = self.inner.write().await;

        if cache.len() == self.capacity && !cache.contains(key) {
            if let Some((evicted, _)) = cache.peek_lru() {
                debug!("Cache at capacity, evicting LRU entry: {}", evicted);
            }
        }

        cache.put(
            key.to_string(),
            CacheEntry {
                handle,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Liveness check; neither promotes nor removes
    pub async fn has(&self, key: &str) -> bool {
        let cache = self.inner.read().await;
        matches!(cache.peek(key), Some(entry) if entry.inserted_at.elapsed() <= self.ttl)
    }

    /// Sweep and remove all expired entries, returning how many were removed
    pub async fn cleanup(&self) -> usize {
        let mut cache = self.inner.write().await;

        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() > self.ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            cache.pop(key);
        }

        if !expired.is_empty() {
            debug!(
                "Cache sweep removed {} expired entries ({} remain)",
                expired.len(),
                cache.len()
            );
        }

        expired.len()
    }

    /// Snapshot for observability
    pub async fn stats(&self) -> CacheStats {
        let cache = self.inner.read().await;
        CacheStats {
            size: cache.len(),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::time::advance;

    fn handle(url: &str) -> MediaHandle {
        MediaHandle {
            url: url.to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(b"payload"),
        }
    }

    fn small_cache(capacity: usize, ttl: Duration) -> MediaCache {
        MediaCache::new(&CacheConfig {
            capacity,
            ttl,
            cleanup_interval: Duration::from_secs(120),
        })
    }

    #[tokio::test]
    async fn test_capacity_bound_evicts_least_recently_touched() {
        let cache = small_cache(3, Duration::from_secs(600));

        for key in ["a", "b", "c"] {
            cache.set(key, handle(key)).await;
        }

        // Touch "a" so "b" becomes least recently used
        assert!(cache.get("a").await.is_some());

        cache.set("d", handle("d")).await;
        cache.set("e", handle("e")).await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 3);
        assert!(cache.has("a").await);
        assert!(!cache.has("b").await);
        assert!(!cache.has("c").await);
        assert!(cache.has("d").await);
        assert!(cache.has("e").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_without_sweep() {
        let cache = small_cache(10, Duration::from_secs(600));
        cache.set("a", handle("a")).await;

        advance(Duration::from_secs(601)).await;

        // Expired entries count as absent even though cleanup never ran
        assert!(cache.get("a").await.is_none());
        assert!(!cache.has("a").await);

        // The entry is still physically present until a sweep
        assert_eq!(cache.stats().await.size, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_entry_age() {
        let cache = small_cache(10, Duration::from_secs(600));
        cache.set("a", handle("a")).await;

        advance(Duration::from_secs(599)).await;
        cache.set("a", handle("a")).await;
        advance(Duration::from_secs(300)).await;

        assert!(cache.has("a").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_only_expired() {
        let cache = small_cache(10, Duration::from_secs(600));
        cache.set("old", handle("old")).await;

        advance(Duration::from_secs(500)).await;
        cache.set("fresh", handle("fresh")).await;
        advance(Duration::from_secs(200)).await;

        let removed = cache.cleanup().await;
        assert_eq!(removed, 1);

        let stats = cache.stats().await;
        assert_eq!(stats.size, 1);
        assert!(cache.has("fresh").await);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_not_normalized() {
        let cache = small_cache(10, Duration::from_secs(600));
        cache.set("http://a.com/p.jpg?w=1&h=2", handle("x")).await;

        assert!(!cache.has("http://a.com/p.jpg?h=2&w=1").await);
        assert!(!cache.has(" http://a.com/p.jpg?w=1&h=2").await);
    }
}
