//! Cache Statistics Module
//!
//! Snapshot of a cache's entry count, byte accounting, and eviction total.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time statistics for one cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Current sum of entry size contributions in bytes
    pub used_bytes: usize,
    /// Configured byte budget (0 = unbounded)
    pub max_bytes: usize,
    /// Number of entries evicted under byte pressure
    pub evictions: u64,
}
