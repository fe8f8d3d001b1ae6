//! Request DTOs for the cache HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MSetItem;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in milliseconds (the server default applies if absent)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Request body for POST /mget
#[derive(Debug, Clone, Deserialize)]
pub struct MGetRequest {
    pub keys: Vec<String>,
}

/// Request body for PUT /mset
#[derive(Debug, Clone, Deserialize)]
pub struct MSetRequest {
    pub items: Vec<MSetItem<Value>>,
}

/// Request body for POST /expire/:key
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    /// New TTL in milliseconds
    pub ttl: u64,
}

/// Query string for GET and DELETE /keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternQuery {
    #[serde(default)]
    pub pattern: Option<String>,
}
