//! Memo Statistics Module
//!
//! Tracks how memoized calls were served: hits, misses, bypass refreshes and
//! calls whose arguments could not be keyed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time copy of a wrapper's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Calls answered from the store
    pub hits: u64,
    /// Memoized calls that had to invoke the function
    pub misses: u64,
    /// Bypass calls that recomputed and overwrote the entry
    pub refreshes: u64,
    /// Calls passed straight through because no key could be derived
    pub passthroughs: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no memoized calls were made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Memo Stats ==
/// Live counters owned by a wrapper. Safe to update through `&self`.
#[derive(Debug, Default)]
pub struct MemoStats {
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    passthroughs: AtomicU64,
}

impl MemoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_passthrough(&self) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            passthroughs: self.passthroughs.load(Ordering::Relaxed),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = MemoStats::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = MemoStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate(), 0.75);
    }

    #[test]
    fn test_refreshes_do_not_affect_hit_rate() {
        let stats = MemoStats::new();
        stats.record_hit();
        stats.record_refresh();
        stats.record_passthrough();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.refreshes, 1);
        assert_eq!(snapshot.passthroughs, 1);
        assert_eq!(snapshot.hit_rate(), 1.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = MemoStats::new();
        stats.record_miss();

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["misses"], 1);
        assert_eq!(json["hits"], 0);
    }
}
