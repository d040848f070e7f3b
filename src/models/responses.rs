//! Response DTOs for the API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::cache::StatsSnapshot;

/// Number of keys listed under `popularResources`
pub const POPULAR_RESOURCES_LIMIT: usize = 10;

/// Popularity ranking, serialized as a `{key: count}` object whose entries
/// keep the ranking order (highest count first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopularResources(pub Vec<(String, u64)>);

impl PopularResources {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PopularResources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Response body for the cache stats endpoint (GET /api/cache/stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// hits / (hits + misses), 0 before any lookup
    pub hit_ratio: f64,
    /// Entries evicted by the size limit
    pub evictions: u64,
    /// Current number of entries in cache
    pub entries: usize,
    /// Resident size in MiB, two decimals
    #[serde(rename = "sizeInMB")]
    pub size_in_mb: f64,
    /// Most requested keys, highest first
    pub popular_resources: PopularResources,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a cache snapshot
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        Self {
            hits: snapshot.hits,
            misses: snapshot.misses,
            hit_ratio: snapshot.hit_ratio(),
            evictions: snapshot.evictions,
            entries: snapshot.entries,
            size_in_mb: snapshot.size_in_mb(),
            popular_resources: PopularResources(
                snapshot.popular_resources(POPULAR_RESOURCES_LIMIT),
            ),
        }
    }
}

/// Plain confirmation body, e.g. for DELETE /api/cache
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
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
