//! Peer Contracts
//!
//! Trait boundaries between a cache group and the cluster: picking the
//! peer that owns a key, and fetching a value from that peer. The shipped
//! HTTP implementations live in [`crate::api::pool`]; groups only ever see
//! these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

// == Peer Picker ==
/// Routes a key to the remote peer that owns it.
pub trait PeerPicker: Send + Sync {
    /// Returns a fetcher for the owning peer, or `None` when the key is
    /// owned locally or no peers are registered.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}

// == Peer Fetcher ==
/// Fetches a value for a (group, key) pair from one remote peer.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}
