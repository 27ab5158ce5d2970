//! Response models for the cache node API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies. Value lookups return raw bytes, so
//! only statistics, health, and error bodies need a shape here.

pub mod responses;

// Re-export commonly used types
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
