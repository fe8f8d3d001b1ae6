//! Cache Entry Module
//!
//! Defines the value wrapper for individual cache entries with TTL support.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation (or last refresh) timestamp, Unix milliseconds
    pub created_at: u64,
    /// Time to live in milliseconds, None = no expiration
    pub ttl_ms: Option<u64>,
    /// Number of successful reads since the entry was last written
    pub hit_count: u64,
    /// Estimated footprint in bytes
    pub size_bytes: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now`.
    pub fn new(value: V, now: u64, ttl_ms: Option<u64>, size_bytes: u64) -> Self {
        Self {
            value,
            created_at: now,
            ttl_ms,
            hit_count: 0,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is still live when exactly `ttl_ms` has
    /// elapsed, and expired one millisecond later.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.ttl_ms {
            Some(ttl) => self.age_at(now) > ttl,
            None => false,
        }
    }

    // == Age ==
    /// Milliseconds since creation; a clock that went backwards reads as 0.
    pub fn age_at(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    // == Refresh ==
    /// Replaces the payload in place, restarting the TTL window.
    pub fn overwrite(&mut self, value: V, now: u64, ttl_ms: Option<u64>, size_bytes: u64) {
        self.value = value;
        self.created_at = now;
        self.ttl_ms = ttl_ms;
        self.hit_count = 0;
        self.size_bytes = size_bytes;
    }
}
