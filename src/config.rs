//! Configuration Module
//!
//! Handles loading and managing node configuration from environment
//! variables.

use std::env;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache byte budget per group
    pub cache_bytes: usize,
    /// Virtual nodes per peer on the hash ring
    pub ring_replicas: usize,
    /// This node's base URL as peers see it
    pub self_url: String,
    /// Base URLs of every cluster member; empty = standalone node
    pub peer_urls: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_BYTES` - Cache byte budget per group (default: 8 MiB)
    /// - `RING_REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `SELF_URL` - This node's base URL (default: http://127.0.0.1:PORT)
    /// - `PEER_URLS` - Comma-separated cluster member URLs (default: empty)
    pub fn from_env() -> Self {
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        Self {
            server_port,
            cache_bytes: env::var("CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8 * 1024 * 1024),
            ring_replicas: env::var("RING_REPLICAS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            self_url: env::var("SELF_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:{}", server_port)),
            peer_urls: env::var("PEER_URLS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_bytes: 8 * 1024 * 1024,
            ring_replicas: 50,
            self_url: "http://127.0.0.1:3000".to_string(),
            peer_urls: Vec::new(),
        }
    }
}
