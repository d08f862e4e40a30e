//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access metadata.

use serde::Serialize;
use serde_json::Value;

use crate::cache::Category;
use crate::clock::format_ms;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Category the entry was stored under
    pub category: Category,
    /// Creation timestamp (clock milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (clock milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Estimated serialized size of `value`
    pub size_bytes: usize,
    /// Number of successful reads
    pub access_count: u64,
    /// Last time the entry was written or read
    pub last_accessed_at: u64,
    /// Store-wide ordering of accesses, breaks ties on `last_accessed_at`
    pub(crate) access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `category` - Category the entry belongs to
    /// * `size_bytes` - Estimated size of `value`
    /// * `now` - Current clock reading
    /// * `ttl_seconds` - TTL in seconds; `0`, or a TTL reaching past the end of
    ///   the clock range, means the entry never expires
    /// * `access_seq` - Store-wide access sequence number
    pub fn new(
        value: Value,
        category: Category,
        size_bytes: usize,
        now: u64,
        ttl_seconds: u64,
        access_seq: u64,
    ) -> Self {
        let expires_at = match ttl_seconds {
            0 => None,
            ttl => ttl
                .checked_mul(1000)
                .and_then(|ttl_ms| now.checked_add(ttl_ms)),
        };

        Self {
            value,
            category,
            created_at: now,
            expires_at,
            size_bytes,
            access_count: 0,
            last_accessed_at: now,
            access_seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Expiry is strict: an entry read exactly at `expires_at` is still live.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: u64, access_seq: u64) {
        self.access_count += 1;
        self.last_accessed_at = now;
        self.access_seq = access_seq;
    }

    /// Snapshot of the entry's metadata for administrative inspection.
    pub fn info(&self, now: u64) -> EntryInfo {
        EntryInfo {
            category: self.category,
            created_at: format_ms(self.created_at),
            expires_at: self.expires_at.map(format_ms),
            ttl_remaining_ms: self.ttl_remaining_ms(now),
            size_bytes: self.size_bytes,
            access_count: self.access_count,
            is_expired: self.is_expired_at(now),
        }
    }
}

// == Entry Info ==
/// Serializable metadata of one entry, without its value.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub category: Category,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 expiry time, absent when the entry never expires
    pub expires_at: Option<String>,
    /// Milliseconds left before expiry, absent when the entry never expires
    pub ttl_remaining_ms: Option<u64>,
    pub size_bytes: usize,
    pub access_count: u64,
    pub is_expired: bool,
}
