//! HTTP Peer Pool
//!
//! Implements the peer routing and peer fetch contracts over HTTP. The
//! pool owns a consistent-hash ring of peer base URLs plus one fetcher per
//! peer; the server side of the protocol is the `/_cache/:group/:key`
//! route in [`crate::api::routes`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::peers::{PeerFetcher, PeerPicker};
use crate::ring::HashRing;

/// Default virtual nodes per peer.
pub const DEFAULT_REPLICAS: usize = 50;

/// Per-request timeout for peer fetches.
const PEER_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Ring and fetchers are replaced together so routing and fetching never
/// disagree about the peer set.
struct PoolState {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

// == HTTP Pool ==
/// Routes keys across a set of HTTP peers.
///
/// Registration takes the write lock, routing the read lock; lookups are
/// read-heavy once the peer set is configured.
pub struct HttpPool {
    /// This node's own base URL; keys it owns are loaded locally
    self_url: String,
    replicas: usize,
    client: reqwest::Client,
    state: RwLock<PoolState>,
}

impl HttpPool {
    // == Constructors ==
    /// Creates a pool with the default virtual-node count.
    pub fn new(self_url: impl Into<String>) -> Self {
        Self::with_replicas(self_url, DEFAULT_REPLICAS)
    }

    /// Creates a pool with an explicit virtual-node count per peer.
    pub fn with_replicas(self_url: impl Into<String>, replicas: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PEER_FETCH_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            self_url: self_url.into(),
            replicas,
            client,
            state: RwLock::new(PoolState {
                ring: HashRing::new(replicas),
                fetchers: HashMap::new(),
            }),
        }
    }

    // == Set Peers ==
    /// Replaces the peer set wholesale: a fresh ring with every URL
    /// registered, and one fetcher per URL.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = HashRing::new(self.replicas);
        let mut fetchers = HashMap::new();
        for peer in peers {
            let peer = peer.as_ref();
            ring.add([peer]);
            fetchers.insert(
                peer.to_string(),
                Arc::new(HttpFetcher {
                    base_url: peer.to_string(),
                    client: self.client.clone(),
                }),
            );
        }

        let mut state = self.state.write();
        state.ring = ring;
        state.fetchers = fetchers;
        info!(peers = state.fetchers.len(), "peer set replaced");
    }
}

impl PeerPicker for HttpPool {
    /// Ring lookup for the key's owner. `None` when the ring is empty or
    /// this node owns the key itself.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        if owner == self.self_url {
            return None;
        }
        debug!(key, peer = owner, "routing key to remote peer");
        state
            .fetchers
            .get(owner)
            .cloned()
            .map(|fetcher| fetcher as Arc<dyn PeerFetcher>)
    }
}

// == HTTP Fetcher ==
/// Fetches values from one peer via `GET {base_url}/_cache/:group/:key`.
pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CacheError::PeerFetch(format!("invalid peer url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| CacheError::PeerFetch(format!("peer url {} cannot take a path", self.base_url)))?
            .extend(["_cache", group, key]);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::PeerFetch(format!("peer {}: {}", self.base_url, e)))?;

        match response.status() {
            StatusCode::OK => response
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|e| CacheError::PeerFetch(format!("peer {}: {}", self.base_url, e))),
            StatusCode::NOT_FOUND => Err(CacheError::NotFound(key.to_string())),
            status => Err(CacheError::PeerFetch(format!(
                "peer {} returned {}",
                self.base_url, status
            ))),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_empty_picks_nothing() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        assert!(pool.pick_peer("any-key").is_none());
    }

    #[test]
    fn test_pool_never_picks_self() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        pool.set_peers(["http://127.0.0.1:3000"]);

        // Sole member is this node; every key is owned locally
        for key in ["a", "b", "c", "d"] {
            assert!(pool.pick_peer(key).is_none());
        }
    }

    #[test]
    fn test_pool_routes_deterministically() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        pool.set_peers(["http://127.0.0.1:3000", "http://127.0.0.1:3001"]);

        let first = pool.pick_peer("stable-key").is_some();
        for _ in 0..10 {
            assert_eq!(pool.pick_peer("stable-key").is_some(), first);
        }
    }

    #[test]
    fn test_pool_set_peers_replaces_ring() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        pool.set_peers(["http://127.0.0.1:3000", "http://127.0.0.1:3001"]);

        // Shrinking back to self-only must route everything locally again
        pool.set_peers(["http://127.0.0.1:3000"]);
        for key in ["a", "b", "c", "d", "e"] {
            assert!(pool.pick_peer(key).is_none());
        }
    }

    #[test]
    fn test_pool_spreads_keys_across_peers() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        pool.set_peers([
            "http://127.0.0.1:3000",
            "http://127.0.0.1:3001",
            "http://127.0.0.1:3002",
        ]);

        // With two remote peers of three, a fair share of keys routes away
        let remote = (0..100)
            .filter(|i| pool.pick_peer(&format!("key-{}", i)).is_some())
            .count();
        assert!(remote > 30, "only {} of 100 keys routed remotely", remote);
        assert!(remote < 100, "no keys owned locally");
    }
}
