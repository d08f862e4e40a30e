//! Cache Module
//!
//! Category-aware memoization cache with per-category TTL, memory-budgeted
//! LRU eviction and hit/miss statistics.

mod category;
mod config;
mod entry;
mod key;
mod memo;
mod stats;
mod store;


// Re-export public types
pub use category::Category;
pub use config::{CacheConfig, DEFAULT_MAX_MEMORY_MB};
pub use entry::{CacheEntry, EntryInfo};
pub use key::{canonical_form, derive_key, estimate_size};
pub use memo::MemoCache;
pub use stats::{CacheCounters, CacheStats};
pub use store::{CacheStore, SweepReport};
