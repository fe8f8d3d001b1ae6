//! Request and Response models for the cache HTTP API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ExpireRequest, MGetRequest, MSetRequest, PatternQuery, SetRequest};
pub use responses::{
    CountResponse, DeleteResponse, GetResponse, HealthResponse, KeyStatusResponse, KeysResponse,
    MGetResponse, SetResponse,
};
