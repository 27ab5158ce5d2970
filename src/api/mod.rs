//! API Module
//!
//! HTTP surface of a cache node: the public read-through API, the peer
//! protocol endpoint, and the HTTP peer pool.
//!
//! # Endpoints
//! - `GET /api/:group/:key` - Public read-through lookup, raw bytes
//! - `GET /_cache/:group/:key` - Peer protocol endpoint
//! - `GET /stats/:group` - Group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod pool;
pub mod routes;

pub use handlers::*;
pub use pool::{HttpFetcher, HttpPool, DEFAULT_REPLICAS};
pub use routes::create_router;
