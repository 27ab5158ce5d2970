//! API Handlers
//!
//! HTTP request handlers for each cache node endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::cache::ByteView;
use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registered cache groups
    pub groups: Arc<GroupRegistry>,
}

impl AppState {
    /// Creates a new AppState over the given registry.
    pub fn new(groups: Arc<GroupRegistry>) -> Self {
        Self { groups }
    }
}

/// Resolves a group by name and runs the read-through lookup.
async fn lookup(state: &AppState, group: &str, key: &str) -> Result<ByteView> {
    let group = state
        .groups
        .get(group)
        .ok_or_else(|| CacheError::GroupNotFound(group.to_string()))?;
    group.get(key).await
}

/// Renders a cached value as a raw octet-stream body.
fn value_response(view: ByteView) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_vec(),
    )
}

/// Handler for GET /api/:group/:key
///
/// Public read-through lookup; returns the raw value bytes.
pub async fn get_value_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let view = lookup(&state, &group, &key).await?;
    Ok(value_response(view))
}

/// Handler for GET /_cache/:group/:key
///
/// Peer protocol endpoint, same contract as the public lookup. Split out
/// so peer traffic is distinguishable in logs.
pub async fn peer_value_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    debug!(%group, %key, "serving peer request");
    let view = lookup(&state, &group, &key).await?;
    Ok(value_response(view))
}

/// Handler for GET /stats/:group
///
/// Returns the group's request counters and cache accounting.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<StatsResponse>> {
    let group = state
        .groups
        .get(&group)
        .ok_or_else(|| CacheError::GroupNotFound(group))?;

    Ok(Json(StatsResponse::new(group.name(), group.stats())))
}

/// Handler for GET /health
///
/// Returns health status of the node.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
