//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, sets and evictions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::Category;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Cache Counters ==
/// Cumulative counters. Never reset, not even by a clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheCounters {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of accepted insertions
    pub sets: u64,
    /// Number of entries removed by sweeps or memory pressure
    pub evictions: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates a new CacheCounters with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Cache Stats ==
/// Point-in-time view of the cache, copied out of the store.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub total_entries: usize,
    pub used_bytes: usize,
    pub limit_bytes: usize,
    pub used_mb: f64,
    pub limit_mb: f64,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
    /// `hit_rate` as a percentage rounded to two decimals
    pub hit_rate_percent: f64,
    /// Entry count per category; categories with no entries are omitted
    pub by_category: BTreeMap<Category, usize>,
}

impl CacheStats {
    /// Builds a snapshot from the store's counters and occupancy.
    pub fn new(
        counters: &CacheCounters,
        total_entries: usize,
        used_bytes: usize,
        limit_bytes: usize,
        by_category: BTreeMap<Category, usize>,
    ) -> Self {
        let hit_rate = counters.hit_rate();

        Self {
            total_entries,
            used_bytes,
            limit_bytes,
            used_mb: used_bytes as f64 / BYTES_PER_MB,
            limit_mb: limit_bytes as f64 / BYTES_PER_MB,
            hits: counters.hits,
            misses: counters.misses,
            sets: counters.sets,
            evictions: counters.evictions,
            hit_rate,
            hit_rate_percent: (hit_rate * 10_000.0).round() / 100.0,
            by_category,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.sets, 0);
        assert_eq!(counters.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheCounters::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert!((counters.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_set_and_eviction() {
        let mut counters = CacheCounters::new();
        counters.record_set();
        counters.record_eviction();
        counters.record_eviction();
        assert_eq!(counters.sets, 1);
        assert_eq!(counters.evictions, 2);
    }

    #[test]
    fn test_stats_snapshot() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();

        let mut by_category = BTreeMap::new();
        by_category.insert(Category::Analysis, 2);

        let stats = CacheStats::new(&counters, 2, 1024 * 1024, 4 * 1024 * 1024, by_category);
        assert_eq!(stats.used_mb, 1.0);
        assert_eq!(stats.limit_mb, 4.0);
        assert_eq!(stats.hit_rate_percent, 33.33);
        assert_eq!(stats.by_category.get(&Category::Analysis), Some(&2));
    }

    #[test]
    fn test_stats_serializes_category_names() {
        let mut by_category = BTreeMap::new();
        by_category.insert(Category::SearchResults, 1);

        let stats = CacheStats::new(&CacheCounters::new(), 1, 10, 100, by_category);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_category"]["search"], 1);
    }
}
