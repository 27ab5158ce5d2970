//! API Routes
//!
//! Configures the Axum router with all cache node endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_value_handler, health_handler, peer_value_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/:group/:key` - Public read-through lookup, raw bytes
/// - `GET /_cache/:group/:key` - Peer protocol endpoint, same contract
/// - `GET /stats/:group` - Group statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/api/:group/:key", get(get_value_handler))
        .route("/_cache/:group/:key", get(peer_value_handler))
        .route("/stats/:group", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
