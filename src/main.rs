//! shardcache - a distributed in-memory cache node
//!
//! Serves one shard of a logical cache and routes misses to the peer that
//! owns the key, falling back to a local data loader.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardcache::api::{create_router, AppState, HttpPool};
use shardcache::config::Config;
use shardcache::error::{CacheError, Result};
use shardcache::group::{Group, GroupRegistry, LoaderFn};

/// Sample backing table standing in for a slow datasource.
const SCORES: &[(&str, &str)] = &[("Tom", "630"), ("Jack", "589"), ("Sam", "567")];

/// Main entry point for the shardcache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the demo group over the sample datasource
/// 4. Wire the HTTP peer pool when peers are configured
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shardcache node");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        port = config.server_port,
        cache_bytes = config.cache_bytes,
        ring_replicas = config.ring_replicas,
        peers = config.peer_urls.len(),
        "Configuration loaded"
    );

    // Register the demo group
    let registry = Arc::new(GroupRegistry::new());
    let group = registry.register(Group::new(
        "scores",
        config.cache_bytes,
        LoaderFn::new(load_score),
    ));

    // Wire peer routing when a cluster is configured
    if !config.peer_urls.is_empty() {
        let pool = Arc::new(HttpPool::with_replicas(
            &config.self_url,
            config.ring_replicas,
        ));
        let mut peers = config.peer_urls.clone();
        if !peers.contains(&config.self_url) {
            peers.push(config.self_url.clone());
        }
        pool.set_peers(&peers);
        group.register_peer_picker(pool);
        info!(self_url = %config.self_url, "Peer routing enabled");
    }

    // Create router with all endpoints
    let app = create_router(AppState::new(registry));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind server port")?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Looks a key up in the sample table, simulating a backing database.
fn load_score(key: &str) -> Result<Vec<u8>> {
    info!(key, "loading from sample datasource");
    SCORES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, score)| score.as_bytes().to_vec())
        .ok_or_else(|| CacheError::NotFound(key.to_string()))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
