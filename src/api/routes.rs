//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, delete_pattern_handler, expire_handler, export_handler,
    get_handler, has_handler, health_handler, import_handler, keys_handler, mget_handler,
    mset_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key
/// - `GET /has/:key` - Check a key without touching stats
/// - `POST /expire/:key` - Reset a key's TTL
/// - `POST /mget` / `PUT /mset` - Bulk read and write
/// - `GET /keys?pattern=` - List keys
/// - `DELETE /keys?pattern=` - Delete keys matching a wildcard
/// - `POST /clear` - Drop every entry
/// - `GET /stats` - Cache statistics
/// - `GET /export` / `POST /import` - Snapshots
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/has/:key", get(has_handler))
        .route("/expire/:key", post(expire_handler))
        .route("/mget", post(mget_handler))
        .route("/mset", put(mset_handler))
        .route("/keys", get(keys_handler).delete(delete_pattern_handler))
        .route("/clear", post(clear_handler))
        .route("/stats", get(stats_handler))
        .route("/export", get(export_handler))
        .route("/import", post(import_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
