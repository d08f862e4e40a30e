//! Cache configuration: memory budget and per-category TTLs.

use std::collections::BTreeMap;

use crate::cache::Category;

/// Default memory budget in megabytes.
pub const DEFAULT_MAX_MEMORY_MB: usize = 100;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on the summed estimated size of all entries
    pub limit_bytes: usize,
    /// TTL in seconds per category; `0` means entries never expire
    pub ttls: BTreeMap<Category, u64>,
}

impl CacheConfig {
    /// Budget of `max_memory_mb` megabytes with the built-in TTLs.
    pub fn with_memory_mb(max_memory_mb: usize) -> Self {
        Self::with_limit_bytes(max_memory_mb.saturating_mul(1024 * 1024))
    }

    pub fn with_limit_bytes(limit_bytes: usize) -> Self {
        let ttls = Category::ALL
            .iter()
            .map(|category| (*category, category.default_ttl_secs()))
            .collect();

        Self { limit_bytes, ttls }
    }

    /// Overrides the TTL of one category.
    pub fn ttl(mut self, category: Category, ttl_secs: u64) -> Self {
        self.ttls.insert(category, ttl_secs);
        self
    }

    /// Configured TTL for `category`, falling back to the `Default` category.
    pub fn ttl_for(&self, category: Category) -> u64 {
        self.ttls
            .get(&category)
            .or_else(|| self.ttls.get(&Category::Default))
            .copied()
            .unwrap_or_else(|| Category::Default.default_ttl_secs())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::with_memory_mb(DEFAULT_MAX_MEMORY_MB)
    }
}
