//! shardcache - a distributed in-memory key-value cache
//!
//! Each node holds a byte-budgeted LRU shard of a logical cache; a
//! consistent-hash ring routes every key to its owning node, so membership
//! changes reshuffle only a bounded minority of the keyspace.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod ring;
pub mod singleflight;

pub use api::{AppState, HttpPool};
pub use cache::{ByteView, SharedCache};
pub use config::Config;
pub use group::{Group, GroupRegistry};
pub use ring::HashRing;
