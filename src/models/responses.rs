//! Response DTOs for the cache node API
//!
//! Defines the structure of outgoing JSON response bodies. Value lookups
//! return raw bytes and have no DTO.

use serde::Serialize;

use crate::group::GroupStats;

/// Response body for the group statistics endpoint (GET /stats/:group)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Group name
    pub group: String,
    /// Total lookups received
    pub gets: u64,
    /// Lookups served from the local cache
    pub cache_hits: u64,
    /// Cache hits over total lookups
    pub hit_rate: f64,
    /// Values produced by the local loader
    pub local_loads: u64,
    /// Values fetched from remote peers
    pub peer_loads: u64,
    /// Failed peer fetches
    pub peer_errors: u64,
    /// Current cache entry count
    pub entries: usize,
    /// Current cache byte usage
    pub used_bytes: usize,
    /// Entries evicted under byte pressure
    pub evictions: u64,
}

impl StatsResponse {
    /// Creates a StatsResponse from a group's statistics snapshot
    pub fn new(group: impl Into<String>, stats: GroupStats) -> Self {
        Self {
            group: group.into(),
            gets: stats.gets,
            cache_hits: stats.cache_hits,
            hit_rate: stats.hit_rate(),
            local_loads: stats.local_loads,
            peer_loads: stats.peer_loads,
            peer_errors: stats.peer_errors,
            entries: stats.entries,
            used_bytes: stats.used_bytes,
            evictions: stats.evictions,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in RFC 3339 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> GroupStats {
        GroupStats {
            gets: 10,
            cache_hits: 8,
            local_loads: 2,
            peer_loads: 0,
            peer_errors: 0,
            entries: 2,
            used_bytes: 40,
            evictions: 1,
        }
    }

    #[test]
    fn test_stats_response_serialize() {
        let resp = StatsResponse::new("scores", sample_stats());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"group\":\"scores\""));
        assert!(json.contains("\"gets\":10"));
        assert!(json.contains("\"used_bytes\":40"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let resp = StatsResponse::new("scores", sample_stats());
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let mut stats = sample_stats();
        stats.gets = 0;
        stats.cache_hits = 0;
        let resp = StatsResponse::new("scores", stats);
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
