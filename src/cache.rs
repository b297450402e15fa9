//! Generic bounded TTL cache.
//!
//! Entries expire lazily on read; capacity pressure is resolved at write time
//! by dropping expired entries first and then the batch of entries closest to
//! expiry. There is no background sweeper thread, so the cost of cleanup is
//! amortized across `set` calls.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A single cached value together with its expiry deadline.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe cache with per-entry TTL and capacity-triggered eviction.
///
/// The internal map is guarded by a single [`RwLock`]; no lock is ever held
/// across awaited I/O (see [`TtlCache::get_or_fetch`]).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use steam_deals_bot::cache::TtlCache;
///
/// # #[tokio::main(flavor = "current_thread")] async fn main() {
/// let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60), 100, 25);
/// cache.set("a".to_string(), 1).await;
/// assert_eq!(cache.get(&"a".to_string()).await, Some(1));
/// # }
/// ```
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    max_size: usize,
    eviction_batch: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `max_size` entries, each living for
    /// `ttl`. When full, `eviction_batch` entries are dropped per eviction
    /// (clamped to at least 1 so an insert always finds room).
    #[must_use]
    pub fn new(ttl: Duration, max_size: usize, eviction_batch: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_size: max_size.max(1),
            eviction_batch: eviction_batch.max(1),
        }
    }

    /// Returns the live value for `key`, or `None` if absent or expired.
    ///
    /// An expired entry is removed as a side effect before returning. A miss
    /// is a normal outcome, never an error.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: upgrade to a write lock and re-check, since another writer
        // may have refreshed the entry in between.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Inserts or overwrites `key`, evicting first if the cache is full.
    ///
    /// Eviction removes all expired entries; if the cache is still at
    /// capacity, the `eviction_batch` entries with the soonest expiry go next,
    /// found by a single partial selection rather than a full sort.
    pub async fn set(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);

            if entries.len() >= self.max_size {
                let stamped: Vec<(Instant, K)> = entries
                    .iter()
                    .map(|(k, entry)| (entry.expires_at, k.clone()))
                    .collect();
                for evicted in take_oldest(stamped, self.eviction_batch) {
                    entries.remove(&evicted);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Returns the cached value for `key`, or awaits `producer` and caches
    /// its result on success.
    ///
    /// A failing producer leaves the cache untouched. Lookups and the producer
    /// run outside the lock, so two concurrent misses for the same key may
    /// both invoke their producer; that is acceptable for idempotent upstream
    /// reads.
    ///
    /// # Errors
    ///
    /// Propagates the producer's error unchanged.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: K, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = producer().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }

    /// Current number of entries, expired-but-unread ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache currently holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Returns the keys of the `k` entries with the smallest stamps.
///
/// Uses an average-O(n) partial selection instead of sorting the whole input;
/// ties are broken arbitrarily. Shared by cache eviction and the seen-deals
/// tracker cleanup.
pub(crate) fn take_oldest<S: Ord, K>(mut stamped: Vec<(S, K)>, k: usize) -> Vec<K> {
    if k == 0 || stamped.is_empty() {
        return Vec::new();
    }
    let k = k.min(stamped.len());
    if k < stamped.len() {
        stamped.select_nth_unstable_by(k - 1, |a, b| a.0.cmp(&b.0));
    }
    stamped.truncate(k);
    stamped.into_iter().map(|(_, key)| key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::advance;

    fn cache(ttl_secs: u64, max_size: usize, batch: usize) -> TtlCache<String, u32> {
        TtlCache::new(Duration::from_secs(ttl_secs), max_size, batch)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl() {
        let c = cache(10, 10, 2);
        c.set("a".into(), 1).await;
        advance(Duration::from_secs(9)).await;
        assert_eq!(c.get(&"a".into()).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_get() {
        let c = cache(10, 10, 2);
        c.set("a".into(), 1).await;
        advance(Duration::from_secs(11)).await;

        assert_eq!(c.len().await, 1);
        assert_eq!(c.get(&"a".into()).await, None);
        // Lazy expiry deleted the entry as a side effect.
        assert_eq!(c.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_never_exceeds_max() {
        let c = cache(60, 5, 2);
        for i in 0..50u32 {
            c.set(format!("key-{i}"), i).await;
            assert!(c.len().await <= 5);
            advance(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_drops_earliest_expiring_entry() {
        // ttl=10s, max_size=2, eviction_batch=1: inserting a third entry must
        // evict whichever of the first two was inserted first.
        let c = cache(10, 2, 1);
        c.set("a".into(), 1).await;
        advance(Duration::from_millis(1)).await;
        c.set("b".into(), 2).await;
        advance(Duration::from_millis(1)).await;
        assert_eq!(c.len().await, 2);

        c.set("c".into(), 3).await;
        assert_eq!(c.len().await, 2);
        assert_eq!(c.get(&"a".into()).await, None);
        assert_eq!(c.get(&"b".into()).await, Some(2));
        assert_eq!(c.get(&"c".into()).await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_prefers_dropping_expired_entries() {
        let c = cache(10, 2, 1);
        c.set("a".into(), 1).await;
        advance(Duration::from_secs(11)).await;
        c.set("b".into(), 2).await;
        advance(Duration::from_millis(1)).await;
        // "a" is expired, so it goes first and "b" survives.
        c.set("c".into(), 3).await;
        assert_eq!(c.get(&"b".into()).await, Some(2));
        assert_eq!(c.get(&"c".into()).await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwriting_existing_key_does_not_evict() {
        let c = cache(10, 2, 1);
        c.set("a".into(), 1).await;
        advance(Duration::from_millis(1)).await;
        c.set("b".into(), 2).await;
        c.set("a".into(), 9).await;
        assert_eq!(c.get(&"a".into()).await, Some(9));
        assert_eq!(c.get(&"b".into()).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_or_fetch_calls_producer_once_per_miss() {
        let c = cache(10, 10, 2);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let got: Result<u32, &str> = c
                .get_or_fetch("a".into(), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(got, Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_producer_caches_nothing() {
        let c = cache(10, 10, 2);
        let got: Result<u32, &str> = c.get_or_fetch("a".into(), || async { Err("boom") }).await;
        assert_eq!(got, Err("boom"));
        assert_eq!(c.get(&"a".into()).await, None);
        assert_eq!(c.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let c = cache(10, 10, 2);
        c.set("a".into(), 1).await;
        c.set("b".into(), 2).await;
        c.clear().await;
        assert!(c.is_empty().await);
        assert_eq!(c.get(&"a".into()).await, None);
    }

    #[test]
    fn test_take_oldest_selects_k_smallest() {
        let stamped = vec![(5, "e"), (1, "a"), (4, "d"), (2, "b"), (3, "c")];
        let mut oldest = take_oldest(stamped, 2);
        oldest.sort_unstable();
        assert_eq!(oldest, vec!["a", "b"]);
    }

    #[test]
    fn test_take_oldest_clamps_k() {
        assert_eq!(take_oldest(vec![(1, "a")], 5), vec!["a"]);
        assert!(take_oldest::<u32, &str>(Vec::new(), 3).is_empty());
        assert!(take_oldest(vec![(1, "a")], 0).is_empty());
    }
}
