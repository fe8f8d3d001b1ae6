//! Cached Value Capability
//!
//! Values must be serializable: the JSON encoding is used both for size
//! accounting and for snapshots.

use serde::de::DeserializeOwned;
use serde::Serialize;

// == Cache Value Trait ==
/// Bound for anything the cache can hold.
///
/// Blanket-implemented for every `Serialize + DeserializeOwned + Clone` type.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Estimated footprint in bytes, taken as the compact JSON length.
    fn estimate_size(&self) -> Result<u64, serde_json::Error> {
        serde_json::to_vec(self).map(|bytes| bytes.len() as u64)
    }
}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
