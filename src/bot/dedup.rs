//! Bounded tracker of already-announced deal IDs.
//!
//! The first successful poll after startup bulk-marks every current deal as
//! seen without announcing it, so a restart never floods the channel with the
//! historical backlog. Growth is bounded by a periodic cleanup that drops the
//! oldest fraction of entries instead of evicting per insert.

use crate::cache::take_oldest;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct TrackerState {
    /// Deal ID -> monotonic mark sequence (stands in for the mark timestamp).
    seen: HashMap<String, u64>,
    next_seq: u64,
    initialized: bool,
}

/// Concurrent seen-set with an initialize-on-first-poll policy.
///
/// All mutation happens under one write lock, so concurrent membership checks
/// observe either the pre- or post-cleanup state, never a partial one.
pub struct DedupTracker {
    state: RwLock<TrackerState>,
    max_size: usize,
    cleanup_fraction: f64,
}

impl DedupTracker {
    /// Creates a tracker that cleans up once it holds more than `max_size`
    /// entries, dropping the oldest `cleanup_fraction` of them per pass.
    #[must_use]
    pub fn new(max_size: usize, cleanup_fraction: f64) -> Self {
        Self {
            state: RwLock::new(TrackerState {
                seen: HashMap::new(),
                next_seq: 0,
                initialized: false,
            }),
            max_size,
            cleanup_fraction: cleanup_fraction.clamp(0.0, 1.0),
        }
    }

    /// Whether the first-poll initialization has happened.
    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// Marks every given ID as seen and flips the tracker to initialized.
    ///
    /// Used exactly once, on the first successful poll; the IDs are treated
    /// as already announced. Returns the number of entries recorded.
    pub async fn initialize<I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.write().await;
        for id in ids {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.seen.insert(id, seq);
        }
        state.initialized = true;
        state.seen.len()
    }

    /// Whether `id` has already been announced.
    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.seen.contains_key(id)
    }

    /// Marks `id` as seen. Called only after a successful delivery, so a
    /// failed send leaves the deal eligible for the next cycle.
    pub async fn mark(&self, id: &str) {
        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.seen.insert(id.to_string(), seq);
    }

    /// Runs a cleanup pass when the tracker has outgrown its bound.
    ///
    /// Removes the oldest `floor(len * cleanup_fraction)` entries ranked by
    /// mark order, keeping the most recently marked. Returns how many entries
    /// were removed.
    pub async fn cleanup_if_needed(&self) -> usize {
        let mut state = self.state.write().await;
        if state.seen.len() <= self.max_size {
            return 0;
        }

        let remove_count = (state.seen.len() as f64 * self.cleanup_fraction) as usize;
        let stamped: Vec<(u64, String)> = state
            .seen
            .iter()
            .map(|(id, &seq)| (seq, id.clone()))
            .collect();
        for id in take_oldest(stamped, remove_count) {
            state.seen.remove(&id);
        }
        remove_count
    }

    /// Current number of tracked IDs.
    pub async fn len(&self) -> usize {
        self.state.read().await.seen.len()
    }

    /// Whether no IDs are tracked yet.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_poll_initializes_without_new_signals() {
        let tracker = DedupTracker::new(100, 0.5);
        assert!(!tracker.is_initialized().await);

        let ids: Vec<String> = (0..5).map(|i| format!("deal-{i}")).collect();
        let recorded = tracker.initialize(ids.clone()).await;

        assert_eq!(recorded, 5);
        assert!(tracker.is_initialized().await);
        for id in &ids {
            assert!(tracker.contains(id).await);
        }
    }

    #[tokio::test]
    async fn test_second_poll_detects_exactly_one_new_item() {
        let tracker = DedupTracker::new(100, 0.5);
        let ids: Vec<String> = (0..5).map(|i| format!("deal-{i}")).collect();
        tracker.initialize(ids.clone()).await;

        let mut next_poll = ids;
        next_poll.push("deal-new".to_string());

        let mut fresh = Vec::new();
        for id in &next_poll {
            if !tracker.contains(id).await {
                fresh.push(id.clone());
            }
        }
        assert_eq!(fresh, vec!["deal-new".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_removes_oldest_fraction() {
        let tracker = DedupTracker::new(5, 0.5);
        for i in 0..10 {
            tracker.mark(&format!("deal-{i}")).await;
        }

        let removed = tracker.cleanup_if_needed().await;
        assert_eq!(removed, 5);
        assert_eq!(tracker.len().await, 5);

        // The most recently marked entries survive.
        for i in 0..5 {
            assert!(!tracker.contains(&format!("deal-{i}")).await);
        }
        for i in 5..10 {
            assert!(tracker.contains(&format!("deal-{i}")).await);
        }
    }

    #[tokio::test]
    async fn test_cleanup_is_a_noop_under_the_bound() {
        let tracker = DedupTracker::new(5, 0.5);
        for i in 0..5 {
            tracker.mark(&format!("deal-{i}")).await;
        }
        assert_eq!(tracker.cleanup_if_needed().await, 0);
        assert_eq!(tracker.len().await, 5);
    }

    #[tokio::test]
    async fn test_remark_keeps_entry_recent() {
        let tracker = DedupTracker::new(2, 0.5);
        tracker.mark("old").await;
        tracker.mark("mid").await;
        tracker.mark("old").await; // re-marking refreshes its sequence
        tracker.mark("new").await;

        tracker.cleanup_if_needed().await;
        assert!(!tracker.contains("mid").await);
        assert!(tracker.contains("old").await);
        assert!(tracker.contains("new").await);
    }
}
