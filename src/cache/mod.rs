//! Cache Module
//!
//! Node-local bounded caching: an immutable byte payload type, a
//! byte-budgeted LRU eviction engine, and the thread-safe wrapper that
//! guards it.

mod byte_view;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byte_view::ByteView;
pub use lru::{EvictionCallback, LruCache, Weighted};
pub use stats::CacheStats;
pub use store::SharedCache;
