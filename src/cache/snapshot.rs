//! Snapshot Module
//!
//! Export and import of live cache contents. A snapshot records each entry's
//! creation time and TTL so that import can restore only the time that was
//! left when the snapshot was taken.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::clock::Clock;
use crate::cache::{CacheStats, CacheStore, CacheValue};
use crate::error::{CacheError, Result};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

// == Snapshot ==
/// Portable image of a cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<V> {
    #[serde(default)]
    pub version: String,
    /// Export time, RFC 3339
    #[serde(default)]
    pub timestamp: String,
    /// Entries, most recently used first
    pub entries: Vec<SnapshotEntry<V>>,
    #[serde(default)]
    pub stats: CacheStats,
}

/// One exported entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry<V> {
    pub key: String,
    pub value: V,
    /// Unix milliseconds
    pub created_at: u64,
    /// Original TTL in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub hit_count: u64,
}

impl<V: CacheValue> Snapshot<V> {
    // == Decoding ==
    /// Parses a snapshot from JSON text.
    ///
    /// Any structural problem, such as a missing `entries` array, is an
    /// `InvalidBackup`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CacheError::InvalidBackup(e.to_string()))
    }

    /// Parses a snapshot from an already-decoded JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CacheError::InvalidBackup(e.to_string()))
    }

    // == File Persistence ==
    /// Writes the snapshot as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| CacheError::Internal(format!("snapshot encoding failed: {}", e)))?;
        fs::write(path, bytes)?;
        debug!(path = %path.display(), entries = self.entries.len(), "snapshot written");
        Ok(())
    }

    /// Reads a snapshot previously written by `write_to`.
    pub fn read_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl<V: CacheValue, C: Clock> CacheStore<V, C> {
    // == Export ==
    /// Captures every live entry plus current stats. Does not mutate the cache.
    pub fn export(&self) -> Snapshot<V> {
        let now = self.now_ms();
        let entries = self
            .live_entries(now)
            .map(|(key, entry)| SnapshotEntry {
                key: key.to_string(),
                value: entry.value.clone(),
                created_at: entry.created_at,
                ttl: entry.ttl_ms,
                hit_count: entry.hit_count,
            })
            .collect();

        let timestamp = DateTime::<Utc>::from_timestamp_millis(now as i64)
            .unwrap_or_default()
            .to_rfc3339();

        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp,
            entries,
            stats: self.stats(),
        }
    }

    // == Import ==
    /// Replaces the cache contents with a snapshot.
    ///
    /// TTL-bearing entries are restored with whatever TTL they had left;
    /// those with nothing left are skipped. Entries that fail to restore are
    /// logged and skipped. Returns the number of entries restored.
    pub fn import(&mut self, snapshot: Snapshot<V>) -> usize {
        self.clear();
        let now = self.now_ms();
        let total = snapshot.entries.len();
        let mut restored = 0;

        // Oldest first, so the snapshot's most recent entry ends up at the head.
        for item in snapshot.entries.into_iter().rev() {
            let remaining = match item.ttl {
                Some(ttl) => {
                    let left = ttl.saturating_sub(now.saturating_sub(item.created_at));
                    if left == 0 {
                        debug!(key = %item.key, "skipping entry expired since export");
                        continue;
                    }
                    Some(left)
                }
                None => None,
            };

            if let Err(e) = self.set(item.key.clone(), item.value, remaining) {
                warn!(key = %item.key, error = %e, "skipping unrestorable snapshot entry");
                continue;
            }
            self.set_hit_count(&item.key, item.hit_count);
            restored += 1;
        }

        info!(
            restored,
            skipped = total - restored,
            version = %snapshot.version,
            "snapshot imported"
        );
        restored
    }

    /// Decodes and imports a JSON snapshot, rejecting malformed input before
    /// touching the cache.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let snapshot = Snapshot::from_json(json)?;
        Ok(self.import(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use serde_json::{json, Value};

    fn store() -> (CacheStore<Value, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        (CacheStore::with_clock(100, clock.clone()), clock)
    }

    #[test]
    fn test_export_shape() {
        let (mut cache, _) = store();
        cache.set("a".to_string(), json!({"title": "faq"}), Some(5_000)).unwrap();
        cache.set("b".to_string(), json!(2), None).unwrap();

        let json = serde_json::to_value(cache.export()).unwrap();

        assert_eq!(json["version"], SNAPSHOT_VERSION);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14"));
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert_eq!(json["entries"][0]["key"], "b");
        assert!(json["entries"][0].get("ttl").is_none());
        assert_eq!(json["entries"][1]["ttl"], 5_000);
        assert_eq!(json["entries"][1]["createdAt"], 1_700_000_000_000u64);
        assert_eq!(json["stats"]["currentSize"], 2);
    }

    #[test]
    fn test_export_skips_expired() {
        let (mut cache, clock) = store();
        cache.set("short".to_string(), json!(1), Some(10)).unwrap();
        cache.set("long".to_string(), json!(2), None).unwrap();
        clock.advance(11);

        let snapshot = cache.export();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].key, "long");
        // Export is read-only
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_round_trip_restores_hits_and_order() {
        let (mut cache, _) = store();
        cache.set("a".to_string(), json!("x"), None).unwrap();
        cache.set("b".to_string(), json!("y"), Some(60_000)).unwrap();
        cache.get("a").unwrap();
        cache.get("a").unwrap();

        let snapshot = cache.export();
        let (mut restored, _) = store();
        assert_eq!(restored.import(snapshot), 2);

        assert_eq!(restored.keys(None).unwrap(), vec!["a", "b"]);
        let exported = restored.export();
        assert_eq!(exported.entries[0].hit_count, 2);
        assert_eq!(exported.entries[1].ttl, Some(60_000));
    }

    #[test]
    fn test_import_recomputes_remaining_ttl() {
        let (mut cache, clock) = store();
        cache.set("k".to_string(), json!(1), Some(1_000)).unwrap();
        let snapshot = cache.export();

        clock.advance(400);
        cache.import(snapshot);

        let entry = &cache.export().entries[0];
        assert_eq!(entry.ttl, Some(600));

        clock.advance(600);
        assert!(cache.has("k").unwrap());
        clock.advance(1);
        assert!(!cache.has("k").unwrap());
    }

    #[test]
    fn test_import_skips_entries_past_ttl() {
        let (mut cache, clock) = store();
        cache.set("gone".to_string(), json!(1), Some(100)).unwrap();
        cache.set("forever".to_string(), json!(2), None).unwrap();
        let snapshot = cache.export();

        clock.advance(100);
        assert_eq!(cache.import(snapshot), 1);
        assert_eq!(cache.keys(None).unwrap(), vec!["forever"]);
    }

    #[test]
    fn test_import_clears_existing_contents() {
        let (mut cache, _) = store();
        cache.set("old".to_string(), json!(1), None).unwrap();

        let restored = cache
            .import_json(r#"{"version":"1.0","timestamp":"","entries":[{"key":"new","value":5,"createdAt":0,"hitCount":3}]}"#)
            .unwrap();

        assert_eq!(restored, 1);
        assert_eq!(cache.keys(None).unwrap(), vec!["new"]);
        assert_eq!(cache.export().entries[0].hit_count, 3);
    }

    #[test]
    fn test_import_rejects_missing_entries() {
        let (mut cache, _) = store();
        cache.set("keep".to_string(), json!(1), None).unwrap();

        let result = cache.import_json(r#"{"version":"1.0","stats":{}}"#);
        assert!(matches!(result, Err(CacheError::InvalidBackup(_))));
        // Rejected up front, nothing cleared
        assert!(cache.has("keep").unwrap());
    }

    #[test]
    fn test_import_skips_invalid_keys() {
        let (mut cache, _) = store();
        let json = json!({
            "entries": [
                {"key": "", "value": 1, "createdAt": 0},
                {"key": "ok", "value": 2, "createdAt": 0}
            ]
        });

        let snapshot = Snapshot::<Value>::from_value(json).unwrap();
        assert_eq!(cache.import(snapshot), 1);
        assert!(cache.has("ok").unwrap());
    }

    #[test]
    fn test_file_round_trip() {
        let (mut cache, _) = store();
        cache.set("kb:1".to_string(), json!({"q": "why"}), None).unwrap();

        let path = std::env::temp_dir().join(format!("kb_cache_snapshot_{}.json", std::process::id()));
        cache.export().write_to(&path).unwrap();
        let loaded = Snapshot::<Value>::read_from(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].value, json!({"q": "why"}));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("kb_cache_definitely_missing_snapshot.json");
        let result = Snapshot::<Value>::read_from(&path);
        assert!(matches!(result, Err(CacheError::Io(_))));
    }
}
