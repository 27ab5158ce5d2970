//! Group Module
//!
//! A group is a named cache namespace with its own byte budget, a
//! user-supplied loader for misses, and optional peer routing. A lookup
//! probes the local cache first, then asks the owning peer, and finally
//! falls back to the loader, with concurrent identical lookups collapsed
//! into a single load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, SharedCache};
use crate::error::{CacheError, Result};
use crate::peers::PeerPicker;
use crate::singleflight::FlightGroup;

// == Loader ==
/// Fall-through data source supplied by the embedding application,
/// consulted when a key is cached nowhere in the cluster.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

/// Adapts a plain closure into a [`Loader`].
pub struct LoaderFn<F> {
    f: F,
}

impl<F> LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.f)(key)
    }
}

// == Group Stats ==
/// Snapshot of a group's request counters and its cache's accounting.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    /// Total lookups received
    pub gets: u64,
    /// Lookups served from the local cache
    pub cache_hits: u64,
    /// Values produced by the local loader
    pub local_loads: u64,
    /// Values fetched from remote peers
    pub peer_loads: u64,
    /// Failed peer fetches (fell through to the loader)
    pub peer_errors: u64,
    /// Current cache entry count
    pub entries: usize,
    /// Current cache byte usage
    pub used_bytes: usize,
    /// Entries evicted under byte pressure
    pub evictions: u64,
}

impl GroupStats {
    /// Cache hits over total lookups, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.gets as f64
        }
    }
}

// == Group ==
/// A named cache namespace implementing the
/// local-hit, peer-fetch, local-load lookup flow.
pub struct Group {
    name: String,
    loader: Box<dyn Loader>,
    cache: SharedCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: FlightGroup<ByteView>,
    gets: AtomicU64,
    cache_hits: AtomicU64,
    local_loads: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
}

impl Group {
    // == Constructor ==
    /// Creates a group with the given byte budget and loader, no peers.
    pub fn new(name: impl Into<String>, cache_bytes: usize, loader: impl Loader + 'static) -> Self {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            cache: SharedCache::new(cache_bytes),
            peers: OnceLock::new(),
            flight: FlightGroup::new(),
            gets: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            local_loads: AtomicU64::new(0),
            peer_loads: AtomicU64::new(0),
            peer_errors: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Peer Registration ==
    /// Installs peer routing. Only the first registration takes effect; a
    /// repeat is ignored with a warning.
    pub fn register_peer_picker(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            warn!(group = %self.name, "peer picker already registered, ignoring");
        }
    }

    // == Get ==
    /// Looks up a key: local cache, then owning peer, then loader.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key is required".to_string()));
        }
        self.gets.fetch_add(1, Ordering::Relaxed);

        if let Some(view) = self.cache.get(key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }

        self.load(key).await
    }

    /// Runs the miss path behind the singleflight barrier, so concurrent
    /// misses for one key produce a single load.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight.fly(key, || self.load_once(key)).await
    }

    async fn load_once(&self, key: &str) -> Result<ByteView> {
        if let Some(picker) = self.peers.get() {
            if let Some(peer) = picker.pick_peer(key) {
                match peer.fetch(&self.name, key).await {
                    Ok(bytes) => {
                        self.peer_loads.fetch_add(1, Ordering::Relaxed);
                        debug!(group = %self.name, key, "served from peer");
                        // The owning peer caches the value; keeping a copy
                        // here would duplicate it across the cluster
                        return Ok(ByteView::from(bytes));
                    }
                    Err(err) => {
                        self.peer_errors.fetch_add(1, Ordering::Relaxed);
                        warn!(group = %self.name, key, %err, "peer fetch failed, loading locally");
                    }
                }
            }
        }

        let bytes = self.loader.load(key).await?;
        let view = ByteView::from(bytes);
        self.cache.add(key, view.clone());
        self.local_loads.fetch_add(1, Ordering::Relaxed);
        debug!(group = %self.name, key, "loaded from local datasource");
        Ok(view)
    }

    // == Stats ==
    /// Snapshot of request counters plus the cache's accounting.
    pub fn stats(&self) -> GroupStats {
        let cache = self.cache.stats();
        GroupStats {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            entries: cache.entries,
            used_bytes: cache.used_bytes,
            evictions: cache.evictions,
        }
    }
}

// == Group Registry ==
/// Application-owned map of group name to group. Explicit shared state,
/// not a process-global.
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group under its name, replacing any previous holder.
    pub fn register(&self, group: Group) -> Arc<Group> {
        let group = Arc::new(group);
        self.groups
            .write()
            .insert(group.name().to_string(), Arc::clone(&group));
        info!(group = %group.name(), "registered cache group");
        group
    }

    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }
}
