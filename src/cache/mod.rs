//! Cache Module
//!
//! Provides in-process caching with TTL expiration, LRU eviction, pattern
//! invalidation and snapshot export/import.

mod clock;
mod entry;
mod lru;
mod pattern;
mod shared;
mod snapshot;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::{LruList, NodeId};
pub use pattern::KeyPattern;
pub use shared::SharedCache;
pub use snapshot::{Snapshot, SnapshotEntry, SNAPSHOT_VERSION};
pub use stats::{CacheStats, StatCounters};
pub use store::{CacheStore, MSetItem};
pub use value::CacheValue;

// == Public Constants ==
/// Maximum allowed key length in characters
pub const MAX_KEY_LENGTH: usize = 250;
