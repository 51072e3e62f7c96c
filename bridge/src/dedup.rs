//! Bounded-lifetime post de-duplication.
//!
//! Mattermost can deliver the same `posted` event more than once across
//! reconnects. The `Deduplicator` admits each post id exactly once within a
//! configured lifetime window; a background sweeper purges expired entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

/// Sweeps never run less often than the entry lifetime, and at most once a
/// minute for long lifetimes.
const SWEEP_CEILING: Duration = Duration::from_secs(60);

/// Membership cache mapping post ids to their first-seen time.
///
/// `admit` is atomic with respect to concurrent presentations of the same
/// id: the check and the insert happen under one lock.
#[derive(Debug)]
pub struct Deduplicator {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Deduplicator {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Present an id to the cache.
    ///
    /// Returns `true` and records the id the first time it is seen; returns
    /// `false` on every later presentation until a sweep purges the entry.
    pub fn admit(&self, id: &str, now: Instant) -> bool {
        let mut seen = self.seen.lock().expect("dedup lock poisoned");
        if seen.contains_key(id) {
            return false;
        }
        seen.insert(id.to_string(), now);
        true
    }

    /// Remove every entry older than the configured lifetime.
    pub fn sweep(&self, now: Instant) {
        let mut seen = self.seen.lock().expect("dedup lock poisoned");
        let before = seen.len();
        seen.retain(|_, first_seen| now.duration_since(*first_seen) <= self.ttl);

        debug!(
            removed = before - seen.len(),
            remaining = seen.len(),
            "dedup_sweep_complete"
        );
    }

    /// Number of ids currently held.
    pub fn len(&self) -> usize {
        self.seen.lock().expect("dedup lock poisoned").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the background sweep task.
    ///
    /// The sweep period is the entry lifetime capped at one minute, so an
    /// entry is never retained past roughly twice its lifetime.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        // interval() panics on a zero period
        let period = self.ttl.min(SWEEP_CEILING).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                self.sweep(Instant::now());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once_per_id() {
        let dedup = Deduplicator::new(Duration::from_secs(600));
        let now = Instant::now();

        assert!(dedup.admit("p1", now));
        assert!(!dedup.admit("p1", now));
        assert!(!dedup.admit("p1", now + Duration::from_secs(5)));
    }

    #[test]
    fn test_admit_distinct_ids() {
        let dedup = Deduplicator::new(Duration::from_secs(600));
        let now = Instant::now();

        assert!(dedup.admit("p1", now));
        assert!(dedup.admit("p2", now));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_sweep_purges_expired_entries() {
        let dedup = Deduplicator::new(Duration::from_secs(10));
        let start = Instant::now();

        assert!(dedup.admit("p1", start));
        dedup.sweep(start + Duration::from_secs(11));
        assert!(dedup.is_empty());

        // Admitted again once the window has elapsed
        assert!(dedup.admit("p1", start + Duration::from_secs(11)));
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let dedup = Deduplicator::new(Duration::from_secs(10));
        let start = Instant::now();

        assert!(dedup.admit("old", start));
        assert!(dedup.admit("fresh", start + Duration::from_secs(11)));

        dedup.sweep(start + Duration::from_secs(12));
        assert_eq!(dedup.len(), 1);
        assert!(!dedup.admit("fresh", start + Duration::from_secs(12)));
    }
}
