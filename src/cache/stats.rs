//! Cache Statistics Module
//!
//! Running counters for hits, misses and resident size, plus the snapshot
//! type handed out to reporting code.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::popularity::rank;
use crate::cache::MIB;

// == Cache Stats ==
/// Live cache counters. `entries` and `size_bytes` move in lockstep with the
/// entry store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that fell through to the handler
    pub misses: u64,
    /// Entries removed by the size limit
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of live entries
    pub entries: usize,
    /// Sum of recorded sizes of live entries
    pub size_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Insert ==
    /// Accounts for a newly stored entry of `size` bytes.
    pub fn record_insert(&mut self, size: u64) {
        self.entries += 1;
        self.size_bytes += size;
    }

    // == Record Removal ==
    /// Accounts for a removed entry using its recorded `size`.
    pub fn record_removal(&mut self, size: u64) {
        self.entries = self.entries.saturating_sub(1);
        self.size_bytes = self.size_bytes.saturating_sub(size);
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Expiration ==
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the counters and the popularity map. Owns its data,
/// so callers may serialize or mutate it freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub size_bytes: u64,
    /// Request count per key
    pub popularity: HashMap<String, u64>,
}

impl StatsSnapshot {
    /// Builds a snapshot from live counters and a copied popularity map.
    pub fn new(stats: &CacheStats, popularity: HashMap<String, u64>) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            entries: stats.entries,
            size_bytes: stats.size_bytes,
            popularity,
        }
    }

    /// hits / (hits + misses), using `1` as the denominator when no
    /// lookups have happened yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = (self.hits + self.misses).max(1);
        self.hits as f64 / total as f64
    }

    /// Resident size in MiB, rounded to two decimals.
    pub fn size_in_mb(&self) -> f64 {
        (self.size_bytes as f64 / MIB as f64 * 100.0).round() / 100.0
    }

    /// The `n` most requested keys, highest count first, ties by key.
    pub fn popular_resources(&self, n: usize) -> Vec<(String, u64)> {
        rank(
            self.popularity
                .iter()
                .map(|(key, count)| (key.clone(), *count)),
            n,
        )
    }
}
