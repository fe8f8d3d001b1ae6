//! Cache Statistics Module
//!
//! Running counters for hits, misses, writes, deletes and evictions, plus the
//! point-in-time report built from them.

use serde::{Deserialize, Serialize};

// == Stat Counters ==
/// Monotonic counters updated on every operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatCounters {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
}

impl StatCounters {
    // == Constructor ==
    /// Creates counters all at zero.
    pub fn new() -> Self {
        Self::default()
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

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Hit Rate ==
    /// hits / max(1, hits + misses), so an unused cache reports 0.0.
    pub fn hit_rate(&self) -> f64 {
        let total = (self.hits + self.misses).max(1);
        self.hits as f64 / total as f64
    }
}

// == Cache Stats ==
/// Snapshot of cache performance, as returned by `stats()` and embedded in
/// exported snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    /// Number of entries currently held
    pub current_size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Sum of estimated entry sizes in bytes
    pub memory_usage: u64,
    /// Mean age of live entries in milliseconds
    pub average_age_ms: f64,
    /// Creation timestamp of the oldest live entry (Unix ms)
    pub oldest_entry: Option<u64>,
    /// Creation timestamp of the newest live entry (Unix ms)
    pub newest_entry: Option<u64>,
    /// Milliseconds since the cache was created
    pub uptime_ms: u64,
}
