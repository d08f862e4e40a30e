//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with memory-budgeted LRU
//! eviction and TTL expiration.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{
    derive_key, estimate_size, CacheConfig, CacheCounters, CacheEntry, CacheStats, Category,
    EntryInfo,
};
use crate::clock::Clock;
use crate::error::Result;

/// Memory-pressure eviction stops once usage is at or below this share of the limit.
const LOW_WATER_PERCENT: u128 = 80;

// == Sweep Report ==
/// What one background sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed because their TTL elapsed
    pub expired: usize,
    /// Entries removed to bring usage back under the low-water mark
    pub evicted: usize,
}

// == Cache Store ==
/// Main cache storage with memory-budgeted LRU eviction and TTL support.
///
/// Not synchronized; see [`crate::cache::MemoCache`] for the shared handle.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage, keyed by derived digest
    entries: HashMap<String, CacheEntry>,
    /// Sum of `size_bytes` over `entries`
    used_bytes: usize,
    /// Memory budget and per-category TTLs
    config: CacheConfig,
    /// Performance statistics
    counters: CacheCounters,
    /// Monotonic access sequence used to order entries for eviction
    access_seq: u64,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `config` - Memory budget and per-category TTLs
    /// * `clock` - Time source for timestamps and expiry
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            used_bytes: 0,
            config,
            counters: CacheCounters::new(),
            access_seq: 0,
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under the key derived from `(category, content)`.
    ///
    /// Returns `false` when the entry cannot fit the memory budget or the
    /// content/value cannot be serialized; the store is unchanged by the
    /// rejected entry in both cases.
    ///
    /// # Arguments
    /// * `category` - Category of the entry, selects the default TTL
    /// * `content` - Content the key is derived from
    /// * `value` - The value to store
    /// * `ttl_override` - TTL in seconds overriding the category TTL; `0` never expires
    pub fn set(
        &mut self,
        category: Category,
        content: &Value,
        value: Value,
        ttl_override: Option<u64>,
    ) -> bool {
        match self.try_set(category, content, value, ttl_override) {
            Ok(stored) => stored,
            Err(e) => {
                error!("Error setting cache entry in {}: {}", category, e);
                false
            }
        }
    }

    fn try_set(
        &mut self,
        category: Category,
        content: &Value,
        value: Value,
        ttl_override: Option<u64>,
    ) -> Result<bool> {
        let key = derive_key(category, content)?;
        let size = estimate_size(&value)?;

        if size > self.config.limit_bytes {
            warn!(
                "Cannot cache {} entry of {} bytes: exceeds memory limit of {} bytes",
                category, size, self.config.limit_bytes
            );
            return Ok(false);
        }

        // Bytes freed by replacing an existing entry under the same key
        let replaced = self.entries.get(&key).map_or(0, |e| e.size_bytes);

        if self.used_bytes - replaced + size > self.config.limit_bytes {
            let target = (self.low_water_mark() + replaced).saturating_sub(size);
            let evicted = self.evict_lru(target, Some(key.as_str()));
            if evicted > 0 {
                debug!("Evicted {} entries to make room for new {} entry", evicted, category);
            }

            if self.used_bytes - replaced + size > self.config.limit_bytes {
                warn!("Cannot cache {} entry: would exceed memory limit", category);
                return Ok(false);
            }
        }

        let now = self.clock.now_ms();
        let ttl = ttl_override.unwrap_or_else(|| self.config.ttl_for(category));
        let seq = self.next_seq();
        let entry = CacheEntry::new(value, category, size, now, ttl, seq);

        self.remove_entry(&key);
        self.entries.insert(key, entry);
        self.used_bytes += size;
        self.counters.record_set();

        Ok(true)
    }

    // == Get ==
    /// Retrieves the value stored for `(category, content)`.
    ///
    /// Expired entries are removed and counted as misses. The returned value
    /// is a copy; the stored entry is never handed out.
    pub fn get(&mut self, category: Category, content: &Value) -> Option<Value> {
        let key = match derive_key(category, content) {
            Ok(key) => key,
            Err(e) => {
                error!("Error getting cache entry from {}: {}", category, e);
                self.counters.record_miss();
                return None;
            }
        };

        let now = self.clock.now_ms();
        let expired = match self.entries.get(&key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.counters.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(&key);
            self.counters.record_miss();
            return None;
        }

        let seq = self.next_seq();
        let entry = self.entries.get_mut(&key)?;
        entry.touch(now, seq);
        self.counters.record_hit();
        Some(entry.value.clone())
    }

    // == Invalidate ==
    /// Removes the entry for `(category, content)`. Returns whether one existed.
    pub fn invalidate(&mut self, category: Category, content: &Value) -> bool {
        match derive_key(category, content) {
            Ok(key) => self.remove_entry(&key).is_some(),
            Err(e) => {
                error!("Error invalidating cache entry in {}: {}", category, e);
                false
            }
        }
    }

    // == Clear ==
    /// Removes every entry of `category`, or everything when `None`.
    ///
    /// Returns the number of removed entries. Counters are left untouched.
    pub fn clear(&mut self, category: Option<Category>) -> usize {
        let removed = match category {
            None => {
                let removed = self.entries.len();
                self.entries.clear();
                self.used_bytes = 0;
                removed
            }
            Some(category) => {
                let keys: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.category == category)
                    .map(|(key, _)| key.clone())
                    .collect();

                for key in &keys {
                    self.remove_entry(key);
                }
                keys.len()
            }
        };

        info!(
            "Cache cleared: {} ({} entries)",
            category.map_or("all", |c| c.as_str()),
            removed
        );
        removed
    }

    // == Entry Info ==
    /// Metadata of the entry for `(category, content)`, without touching it.
    pub fn entry_info(&self, category: Category, content: &Value) -> Option<EntryInfo> {
        let key = derive_key(category, content)
            .map_err(|e| error!("Error reading cache entry info in {}: {}", category, e))
            .ok()?;

        self.entries
            .get(&key)
            .map(|entry| entry.info(self.clock.now_ms()))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut by_category = BTreeMap::new();
        for entry in self.entries.values() {
            *by_category.entry(entry.category).or_insert(0) += 1;
        }

        CacheStats::new(
            &self.counters,
            self.entries.len(),
            self.used_bytes,
            self.config.limit_bytes,
            by_category,
        )
    }

    // == Sweep ==
    /// Removes expired entries, then evicts down to the low-water mark if
    /// usage is above the limit.
    pub fn sweep(&mut self) -> SweepReport {
        let expired = self.cleanup_expired();
        let evicted = self.enforce_memory_limit();
        SweepReport { expired, evicted }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Each removal counts as an eviction. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
            self.counters.record_eviction();
        }

        expired_keys.len()
    }

    // == Enforce Memory Limit ==
    /// Evicts least-recently-used entries down to the low-water mark when
    /// usage exceeds the limit. Returns the number evicted.
    ///
    /// `set` already keeps usage within the limit; this is the backstop the
    /// sweep applies regardless of how the store got over budget.
    pub fn enforce_memory_limit(&mut self) -> usize {
        if self.used_bytes <= self.config.limit_bytes {
            return 0;
        }
        self.evict_lru(self.low_water_mark(), None)
    }

    /// Evicts in ascending `last_accessed_at` order until `used_bytes <= target`.
    /// `protect` is never evicted.
    fn evict_lru(&mut self, target: usize, protect: Option<&str>) -> usize {
        if self.used_bytes <= target {
            return 0;
        }

        let mut candidates: Vec<(u64, u64, String)> = self
            .entries
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != protect)
            .map(|(key, entry)| (entry.last_accessed_at, entry.access_seq, key.clone()))
            .collect();
        candidates.sort_unstable();

        let mut evicted = 0;
        for (_, _, key) in candidates {
            if self.used_bytes <= target {
                break;
            }
            if self.remove_entry(&key).is_some() {
                self.counters.record_eviction();
                evicted += 1;
            }
        }
        evicted
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.used_bytes -= entry.size_bytes;
        Some(entry)
    }

    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    fn low_water_mark(&self) -> usize {
        (self.config.limit_bytes as u128 * LOW_WATER_PERCENT / 100) as usize
    }

    // == Accessors ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn limit_bytes(&self) -> usize {
        self.config.limit_bytes
    }
}
