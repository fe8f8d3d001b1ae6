//! KB Cache - in-process caching engine for a knowledge-base service
//!
//! LRU cache with per-entry TTL, memory accounting, hit/miss statistics,
//! wildcard invalidation and snapshot export/import, plus an optional HTTP
//! surface for out-of-process callers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, CacheStore, SharedCache, Snapshot};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
