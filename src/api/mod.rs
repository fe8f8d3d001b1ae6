//! API Module
//!
//! HTTP handlers and routing that expose the cache to other services.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
