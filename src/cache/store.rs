//! Cache Store Module
//!
//! Main cache engine combining the key index with the LRU arena and TTL
//! expiration. The index and the list are always updated together: every
//! key in `index` names a live node in `order` and vice versa.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::lru::{LruList, NodeId};
use crate::cache::{CacheEntry, CacheStats, CacheValue, KeyPattern, StatCounters, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Bulk Item ==
/// One `(key, value, ttl)` triple for `mset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MSetItem<V> {
    pub key: String,
    pub value: V,
    /// TTL in milliseconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl<V> MSetItem<V> {
    pub fn new(key: impl Into<String>, value: V, ttl: Option<u64>) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }
}

// == Cache Store ==
/// LRU cache with per-entry TTL and memory accounting.
#[derive(Debug)]
pub struct CacheStore<V, C = SystemClock> {
    /// Key -> arena slot
    index: HashMap<String, NodeId>,
    /// Recency order, owns the entries
    order: LruList<V>,
    /// Running counters
    counters: StatCounters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Sum of `size_bytes` over all entries
    memory_usage: u64,
    /// Creation time of the store (Unix ms)
    started_at: u64,
    clock: C,
}

impl<V: CacheValue> CacheStore<V, SystemClock> {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_size` entries.
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(max_size: usize) -> Self {
        Self::with_clock(max_size, SystemClock)
    }
}

impl<V: CacheValue, C: Clock> CacheStore<V, C> {
    /// Creates a store reading time from `clock`.
    pub fn with_clock(max_size: usize, clock: C) -> Self {
        let started_at = clock.now_ms();
        Self {
            index: HashMap::new(),
            order: LruList::new(),
            counters: StatCounters::new(),
            max_size: max_size.max(1),
            memory_usage: 0,
            started_at,
            clock,
        }
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used.
    ///
    /// Absent and expired keys both count as a miss; expired entries are
    /// removed on discovery.
    pub fn get(&mut self, key: &str) -> Result<Option<V>> {
        validate_key("get", key)?;
        let now = self.clock.now_ms();

        let Some(id) = self.live_node(key, now) else {
            self.counters.record_miss();
            return Ok(None);
        };

        let Some(entry) = self.order.entry_mut(id) else {
            return Err(desync(key));
        };
        entry.hit_count += 1;
        let value = entry.value.clone();

        self.order.move_to_front(id);
        self.counters.record_hit();
        Ok(Some(value))
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL in milliseconds.
    ///
    /// Overwriting an existing key updates it in place and promotes it. A new
    /// key first purges expired entries, then evicts from the LRU tail until
    /// there is room.
    pub fn set(&mut self, key: String, value: V, ttl_ms: Option<u64>) -> Result<()> {
        validate_key("set", &key)?;
        let value_size = value.estimate_size().map_err(|e| CacheError::InvalidValue {
            op: "set",
            key: key.clone(),
            reason: e.to_string(),
        })?;
        let size_bytes = key.len() as u64 + value_size;
        let now = self.clock.now_ms();

        if let Some(&id) = self.index.get(&key) {
            let Some(entry) = self.order.entry_mut(id) else {
                return Err(desync(&key));
            };
            let previous = entry.size_bytes;
            entry.overwrite(value, now, ttl_ms, size_bytes);

            self.memory_usage = self.memory_usage.saturating_sub(previous) + size_bytes;
            self.order.move_to_front(id);
        } else {
            self.enforce_capacity(now);

            let id = self
                .order
                .push_front(key.clone(), CacheEntry::new(value, now, ttl_ms, size_bytes));
            self.index.insert(key, id);
            self.memory_usage += size_bytes;
        }

        self.counters.record_set();
        Ok(())
    }

    // == Has ==
    /// Checks for a live key without touching stats or recency.
    pub fn has(&mut self, key: &str) -> Result<bool> {
        validate_key("has", key)?;
        let now = self.clock.now_ms();
        Ok(self.live_node(key, now).is_some())
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was present.
    ///
    /// An expired entry is dropped without counting as a delete.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key("delete", key)?;
        let now = self.clock.now_ms();
        if self.live_node(key, now).is_none() {
            return Ok(false);
        }

        self.unlink(key);
        self.counters.record_delete();
        Ok(true)
    }

    // == Expire ==
    /// Restarts the TTL window of a live key with a new TTL.
    ///
    /// Does not alter recency order. Returns false if the key is absent.
    pub fn expire(&mut self, key: &str, ttl_ms: u64) -> Result<bool> {
        validate_key("expire", key)?;
        if ttl_ms == 0 {
            return Err(CacheError::InvalidTtl {
                op: "expire",
                key: key.to_string(),
                ttl: ttl_ms,
            });
        }

        let now = self.clock.now_ms();
        let Some(id) = self.live_node(key, now) else {
            return Ok(false);
        };
        let Some(entry) = self.order.entry_mut(id) else {
            return Err(desync(key));
        };
        entry.created_at = now;
        entry.ttl_ms = Some(ttl_ms);
        Ok(true)
    }

    // == Clear ==
    /// Drops every entry. Counters are cumulative and survive.
    pub fn clear(&mut self) {
        let dropped = self.index.len();
        self.index.clear();
        self.order.clear();
        self.memory_usage = 0;
        debug!(dropped, "cache cleared");
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.remove_expired(now)
    }

    // == Bulk Get ==
    /// Applies `get` to each key, preserving input order.
    pub fn mget<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<Vec<Option<V>>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    // == Bulk Set ==
    /// Applies `set` to each item in order.
    ///
    /// Not atomic: items before a failing one stay committed.
    pub fn mset(&mut self, items: Vec<MSetItem<V>>) -> Result<()> {
        for item in items {
            self.set(item.key, item.value, item.ttl)?;
        }
        Ok(())
    }

    // == Delete Pattern ==
    /// Deletes every live key matching a `*` wildcard pattern. Returns the
    /// count, which never includes entries that had already expired.
    pub fn delete_pattern(&mut self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::new(pattern)?;
        let now = self.clock.now_ms();
        self.remove_expired(now);

        let doomed: Vec<String> = self
            .index
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &doomed {
            self.unlink(key);
            self.counters.record_delete();
        }
        debug!(pattern = pattern.as_str(), removed = doomed.len(), "pattern delete");
        Ok(doomed.len())
    }

    // == Keys ==
    /// Lists live keys, optionally filtered by a wildcard pattern.
    ///
    /// Keys come out most recently used first.
    pub fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let pattern = pattern.map(KeyPattern::new).transpose()?;
        let now = self.clock.now_ms();

        Ok(self
            .order
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .filter(|(key, _)| pattern.as_ref().map_or(true, |p| p.matches(key)))
            .map(|(key, _)| key.to_string())
            .collect())
    }

    // == Stats ==
    /// Returns current cache statistics. O(n) over live entries for ages.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let mut live = 0u64;
        let mut total_age = 0u64;
        let mut oldest: Option<u64> = None;
        let mut newest: Option<u64> = None;

        for (_, entry) in self.live_entries(now) {
            live += 1;
            total_age += entry.age_at(now);
            oldest = Some(oldest.map_or(entry.created_at, |t| t.min(entry.created_at)));
            newest = Some(newest.map_or(entry.created_at, |t| t.max(entry.created_at)));
        }

        let average_age_ms = if live == 0 {
            0.0
        } else {
            total_age as f64 / live as f64
        };

        CacheStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            hit_rate: self.counters.hit_rate(),
            sets: self.counters.sets,
            deletes: self.counters.deletes,
            evictions: self.counters.evictions,
            current_size: self.index.len(),
            max_size: self.max_size,
            memory_usage: self.memory_usage,
            average_age_ms,
            oldest_entry: oldest,
            newest_entry: newest,
            uptime_ms: now.saturating_sub(self.started_at),
        }
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn memory_usage(&self) -> u64 {
        self.memory_usage
    }

    // == Crate Internals ==
    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Unexpired entries, most recently used first.
    pub(crate) fn live_entries(&self, now: u64) -> impl Iterator<Item = (&str, &CacheEntry<V>)> {
        self.order
            .iter()
            .filter(move |(_, entry)| !entry.is_expired_at(now))
    }

    pub(crate) fn set_hit_count(&mut self, key: &str, hit_count: u64) {
        if let Some(entry) = self.index.get(key).and_then(|&id| self.order.entry_mut(id)) {
            entry.hit_count = hit_count;
        }
    }

    // == Eviction ==
    fn enforce_capacity(&mut self, now: u64) {
        self.remove_expired(now);

        while self.index.len() >= self.max_size {
            let Some((key, entry)) = self.order.pop_back() else {
                break;
            };
            self.index.remove(&key);
            self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
            self.counters.record_eviction();
            debug!(key = %key, "evicted least recently used entry");
        }
    }

    fn remove_expired(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .order
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.to_string())
            .collect();

        for key in &expired {
            self.unlink(key);
        }
        expired.len()
    }

    /// Resolves a key to its node, dropping it first if it has expired.
    fn live_node(&mut self, key: &str, now: u64) -> Option<NodeId> {
        let id = *self.index.get(key)?;
        let expired = self
            .order
            .entry(id)
            .map_or(true, |entry| entry.is_expired_at(now));
        if expired {
            self.unlink(key);
            return None;
        }
        Some(id)
    }

    /// Removes a key from both the index and the list.
    fn unlink(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let id = self.index.remove(key)?;
        let (_, entry) = self.order.remove(id)?;
        self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
        Some(entry)
    }
}

// == Validation ==
fn validate_key(op: &'static str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            op,
            key: String::new(),
            reason: "key cannot be empty".to_string(),
        });
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey {
            op,
            key: key.to_string(),
            reason: format!("key exceeds maximum length of {} characters", MAX_KEY_LENGTH),
        });
    }
    Ok(())
}

fn desync(key: &str) -> CacheError {
    CacheError::Internal(format!("index entry for '{}' has no list node", key))
}
