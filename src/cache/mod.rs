//! Cache Module
//!
//! In-memory HTTP response cache with popularity-aware TTL extension and
//! size-bounded eviction.
//!
//! Leaf parts (`EntryStore`, `PopularityTracker`, `CacheStats`) hold state,
//! the policies (`TtlPolicy`, `EvictionPolicy`) decide, `CacheStore` applies
//! both under one owner and `CacheGate` puts it in front of a request.

/// Logs a cache lifecycle event at `info` when verbose cache logging is on,
/// at `debug` otherwise.
macro_rules! cache_event {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

mod admin;
mod entries;
mod entry;
mod eviction;
mod gate;
mod key;
mod popularity;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entries::EntryStore;
pub use entry::{CacheEntry, CachedResponse};
pub use eviction::{EvictionPolicy, LOW_WATER_RATIO};
pub use gate::{
    Admission, CacheGate, CacheHeaders, CacheStatus, GateResponse, MissTicket, X_CACHE,
};
pub use key::{
    derive_key, is_cacheable_method, route_item_key, route_list_key, KeyFn, RequestIdentity,
};
pub use popularity::{PopularityMode, PopularityTracker};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CacheStore, Lookup};
pub use ttl::TtlPolicy;

// == Public Constants ==
/// Bytes in one mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Popularity count a key must exceed before its TTL is extended
pub const DEFAULT_POPULARITY_THRESHOLD: u64 = 10;

/// Default TTL multiplier for popular resources
pub const DEFAULT_POPULARITY_MULTIPLIER: f64 = 2.0;

/// Upper bound for an extended TTL in seconds
pub const DEFAULT_TTL_CAP_SECS: u64 = 3600;

/// Default resident size ceiling in bytes
pub const DEFAULT_SIZE_LIMIT_BYTES: u64 = 100 * MIB;
