//! Shared Cache Module
//!
//! Lock-guarded façade over the LRU eviction engine. The engine is created
//! lazily on the first write, so a cache that is never written to never
//! allocates the engine's internal structures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{ByteView, CacheStats, LruCache};

// == Shared Cache ==
/// Thread-safe wrapper around a lazily constructed [`LruCache`].
///
/// All access is serialized by a single mutex, so operations observed by
/// any two callers are linearizable. The engine itself is never exposed.
pub struct SharedCache {
    /// Byte budget handed to the engine on first construction
    capacity_bytes: usize,
    /// Total evictions, bumped from inside the engine's callback
    evictions: Arc<AtomicU64>,
    /// Engine slot; None until the first add
    inner: Mutex<Option<LruCache<ByteView>>>,
}

impl SharedCache {
    // == Constructor ==
    /// Creates a wrapper with the given byte budget. The engine is not
    /// constructed here.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            evictions: Arc::new(AtomicU64::new(0)),
            inner: Mutex::new(None),
        }
    }

    // == Add ==
    /// Stores a value, constructing the engine under the lock on first use.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut guard = self.inner.lock();
        let engine = guard.get_or_insert_with(|| {
            let evictions = Arc::clone(&self.evictions);
            LruCache::with_eviction_callback(self.capacity_bytes, move |key, _value| {
                evictions.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "evicted entry under byte pressure");
            })
        });
        engine.add(key, value);
    }

    // == Get ==
    /// Looks up a value. Returns `None` without constructing the engine if
    /// nothing was ever added.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        guard.as_mut()?.get(key).cloned()
    }

    // == Observers ==
    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current byte usage.
    pub fn used_bytes(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, LruCache::used_bytes)
    }

    /// Configured byte budget.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Total entries evicted under byte pressure.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Snapshot of entry count, byte accounting, and evictions.
    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock();
        CacheStats {
            entries: guard.as_ref().map_or(0, LruCache::len),
            used_bytes: guard.as_ref().map_or(0, LruCache::used_bytes),
            max_bytes: self.capacity_bytes,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
