//! API Handlers
//!
//! HTTP request handlers exposing the cache operations.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheStats, CacheStore, SharedCache, Snapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CountResponse, DeleteResponse, ExpireRequest, GetResponse, HealthResponse, KeyStatusResponse,
    KeysResponse, MGetRequest, MGetResponse, MSetRequest, PatternQuery, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// Holds a cloneable handle to the cache; the handle serialises access
/// internally.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache<Value>,
    /// TTL applied to writes that do not carry one
    pub default_ttl: Option<u64>,
}

impl AppState {
    /// Creates a new AppState around an existing cache, with no default TTL.
    pub fn new(cache: SharedCache<Value>) -> Self {
        Self {
            cache,
            default_ttl: None,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the cleanup sweep when a check period is configured, so this
    /// must run inside a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let store = CacheStore::new(config.max_size);
        Self {
            cache: SharedCache::with_cleanup(store, config.check_period()),
            default_ttl: config.default_ttl(),
        }
    }

    pub fn with_default_ttl(mut self, ttl_ms: Option<u64>) -> Self {
        self.default_ttl = ttl_ms;
        self
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let ttl = req.ttl.or(state.default_ttl);
    state.cache.set(req.key.clone(), req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await? {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyStatusResponse>> {
    let present = state.cache.has(&key).await?;
    Ok(Json(KeyStatusResponse::new(key, present)))
}

/// Handler for POST /expire/:key
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<KeyStatusResponse>> {
    let applied = state.cache.expire(&key, req.ttl).await?;
    Ok(Json(KeyStatusResponse::new(key, applied)))
}

/// Handler for POST /mget
pub async fn mget_handler(
    State(state): State<AppState>,
    Json(req): Json<MGetRequest>,
) -> Result<Json<MGetResponse>> {
    let values = state.cache.mget(&req.keys).await?;
    Ok(Json(MGetResponse { values }))
}

/// Handler for PUT /mset
pub async fn mset_handler(
    State(state): State<AppState>,
    Json(req): Json<MSetRequest>,
) -> Result<Json<CountResponse>> {
    let count = req.items.len();
    let items = req
        .items
        .into_iter()
        .map(|mut item| {
            item.ttl = item.ttl.or(state.default_ttl);
            item
        })
        .collect();
    state.cache.mset(items).await?;

    Ok(Json(CountResponse::new("Items set successfully", count)))
}

/// Handler for GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<KeysResponse>> {
    let keys = state.cache.keys(query.pattern.as_deref()).await?;
    Ok(Json(KeysResponse::new(keys)))
}

/// Handler for DELETE /keys?pattern=
pub async fn delete_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<CountResponse>> {
    let pattern = query
        .pattern
        .ok_or_else(|| CacheError::InvalidPattern {
            pattern: String::new(),
            reason: "pattern query parameter is required".to_string(),
        })?;
    let count = state.cache.delete_pattern(&pattern).await?;

    Ok(Json(CountResponse::new(
        format!("Deleted keys matching '{}'", pattern),
        count,
    )))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<CountResponse> {
    let count = state.cache.stats().await.current_size;
    state.cache.clear().await;
    Json(CountResponse::new("Cache cleared", count))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Handler for GET /export
pub async fn export_handler(State(state): State<AppState>) -> Json<Snapshot<Value>> {
    Json(state.cache.export().await)
}

/// Handler for POST /import
///
/// Takes the body as raw JSON so a malformed snapshot is reported as an
/// invalid backup rather than a generic extraction failure.
pub async fn import_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<CountResponse>> {
    let snapshot = Snapshot::from_value(body)?;
    let restored = state.cache.import(snapshot).await;
    Ok(Json(CountResponse::new("Snapshot imported", restored)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
