//! Cache Store Module
//!
//! Main cache engine combining entry storage, popularity tracking, TTL
//! extension and size-bounded eviction.
//!
//! Every removal, whatever its cause, goes through `remove_entry` so the
//! resident size in the stats always equals the sum of live entry sizes.

use std::collections::HashMap;

use crate::cache::{
    route_item_key, route_list_key, CacheEntry, CacheStats, CachedResponse, EntryStore,
    EvictionPolicy, PopularityMode, PopularityTracker, StatsSnapshot, TtlPolicy, MIB,
};
use crate::config::CacheConfig;

// == Lookup ==
/// Outcome of consulting the store for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A live entry was found; its response is returned verbatim
    Hit(CachedResponse),
    /// No live entry
    Miss,
}

// == Cache Store ==
/// Response cache state. Not synchronized; wrap it in a lock to share.
#[derive(Debug)]
pub struct CacheStore {
    /// Stored responses
    entries: EntryStore,
    /// Request counts per key
    popularity: PopularityTracker,
    /// Performance and size counters
    stats: CacheStats,
    /// Popularity-aware TTL extension
    ttl: TtlPolicy,
    /// Size-bounded eviction
    eviction: EvictionPolicy,
    /// Which lookups count toward popularity
    popularity_mode: PopularityMode,
    /// Log lifecycle events at info level
    verbose: bool,
    /// Generation of the last explicit clear, per key
    generations: HashMap<String, u64>,
    /// Generation of keys not cleared since the last `clear_all`
    generation_floor: u64,
    next_generation: u64,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store tuned by `config`.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: EntryStore::new(),
            popularity: PopularityTracker::new(),
            stats: CacheStats::new(),
            ttl: TtlPolicy::new(
                config.popularity_threshold,
                config.popularity_multiplier,
                config.ttl_cap_secs,
            ),
            eviction: EvictionPolicy::new(config.size_limit_bytes),
            popularity_mode: config.popularity_mode,
            verbose: config.debug,
            generations: HashMap::new(),
            generation_floor: 0,
            next_generation: 1,
        }
    }

    // == Lookup ==
    /// Consults the store for `key`, counting the request toward the key's
    /// popularity and recording a hit or a miss.
    ///
    /// An entry found expired is removed and the lookup counts as a miss.
    pub fn lookup(&mut self, key: &str) -> Lookup {
        if self.popularity_mode == PopularityMode::AllLookups {
            self.popularity.increment(key);
        }

        if self.entries.get(key).is_some_and(CacheEntry::is_expired) {
            self.expire(key);
        }

        match self.entries.get(key) {
            Some(entry) => {
                let response = entry.response.clone();
                self.stats.record_hit();
                cache_event!(self.verbose, key, "cache hit");
                self.log_stats();
                Lookup::Hit(response)
            }
            None => {
                if self.popularity_mode == PopularityMode::MissesOnly {
                    self.popularity.increment(key);
                }
                self.stats.record_miss();
                cache_event!(self.verbose, key, "cache miss");
                self.log_stats();
                Lookup::Miss
            }
        }
    }

    // == Store ==
    /// Stores a downstream response under `key`.
    ///
    /// Non-2xx responses are ignored. The entry lives for the popularity
    /// adjusted TTL; eviction runs right after the insert. Returns whether
    /// the response was stored.
    ///
    /// # Arguments
    /// * `key` - Cache key of the request that produced `response`
    /// * `response` - The downstream response
    /// * `base_ttl` - Route's base duration in seconds
    pub fn store(&mut self, key: &str, response: CachedResponse, base_ttl: u64) -> bool {
        if !response.is_success() {
            return false;
        }

        let effective_ttl = self.ttl.adjust_for(&self.popularity, key, base_ttl);
        if effective_ttl != base_ttl {
            cache_event!(
                self.verbose,
                key,
                base_ttl,
                effective_ttl,
                "extended TTL for popular resource"
            );
        }

        let entry = CacheEntry::new(response, effective_ttl);
        let size = entry.size_bytes;
        if let Some(replaced) = self.entries.insert(key.to_string(), entry) {
            self.stats.record_removal(replaced.size_bytes);
        }
        self.stats.record_insert(size);
        cache_event!(self.verbose, key, size, ttl = effective_ttl, "cache store");

        self.maybe_evict();
        true
    }

    // == Maybe Evict ==
    /// Evicts least popular entries while resident size is over the limit.
    ///
    /// Returns the number of entries evicted. Popularity counters of evicted
    /// keys are kept.
    pub fn maybe_evict(&mut self) -> usize {
        let victims = self
            .eviction
            .plan(self.stats.size_bytes, &self.entries, &self.popularity);
        if victims.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for key in &victims {
            if self.remove_entry(key).is_some() {
                self.stats.record_eviction();
                removed += 1;
            }
        }
        cache_event!(self.verbose, removed, "evicted entries due to size limit");

        if self.stats.size_bytes > self.eviction.low_water_mark() {
            tracing::warn!(
                resident_bytes = self.stats.size_bytes,
                limit_bytes = self.eviction.size_limit_bytes(),
                remaining_entries = self.entries.len(),
                "eviction ran out of entries above the low-water mark"
            );
        }
        removed
    }

    // == Clear All ==
    /// Drops every entry, zeroes all counters and forgets all popularity.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.popularity.clear();
        self.stats.reset();
        self.generations.clear();
        self.generation_floor = self.bump_generation();
        cache_event!(self.verbose, "all cache entries cleared");
    }

    // == Clear Key ==
    /// Drops the entry for `key`, if any, and its popularity counter.
    ///
    /// Returns whether an entry was removed.
    pub fn clear_key(&mut self, key: &str) -> bool {
        let generation = self.bump_generation();
        self.generations.insert(key.to_string(), generation);
        self.popularity.remove(key);
        let removed = self.remove_entry(key).is_some();
        if removed {
            cache_event!(self.verbose, key, "cache entry cleared");
        }
        removed
    }

    // == Invalidate Route ==
    /// Clears the listing key of `/api/<route>` and, given an id, the item key
    /// of `/api/<route>/<id>`. Returns the number of entries removed.
    ///
    /// Only the canonical paths are cleared: a route whose ids can be spelled
    /// several ways must key its entries canonically (see [`KeyFn`]).
    ///
    /// [`KeyFn`]: crate::cache::KeyFn
    pub fn invalidate_route(&mut self, route: &str, id: Option<&str>) -> usize {
        let mut removed = usize::from(self.clear_key(&route_list_key(route)));
        if let Some(id) = id {
            removed += usize::from(self.clear_key(&route_item_key(route, id)));
        }
        cache_event!(self.verbose, route, id = ?id, removed, "invalidated route");
        removed
    }

    // == Purge Expired ==
    /// Removes every expired entry. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let expired = self.entries.expired_keys();
        for key in &expired {
            self.expire(key);
        }
        expired.len()
    }

    // == Stats ==
    /// Snapshot of the counters and popularity map.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::new(&self.stats, self.popularity.snapshot())
    }

    /// Changes whenever `key` is explicitly cleared. A response produced
    /// before a clear must not be stored after it.
    pub fn generation(&self, key: &str) -> u64 {
        self.generations
            .get(key)
            .copied()
            .unwrap_or(self.generation_floor)
    }

    /// Current popularity count for `key`.
    pub fn popularity(&self, key: &str) -> u64 {
        self.popularity.count(key)
    }

    /// The stored entry for `key`, expired or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Sum of recorded sizes over stored entries, computed from the entries
    /// themselves rather than the running counter.
    pub fn resident_bytes(&self) -> u64 {
        self.entries.total_size()
    }

    pub fn size_limit_bytes(&self) -> u64 {
        self.eviction.size_limit_bytes()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    fn expire(&mut self, key: &str) {
        if self.remove_entry(key).is_some() {
            self.stats.record_expiration();
            cache_event!(self.verbose, key, "cache entry expired");
        }
    }

    /// The single removal path; keeps stats in lockstep with the entries.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.stats.record_removal(entry.size_bytes);
        Some(entry)
    }

    fn log_stats(&self) {
        cache_event!(
            self.verbose,
            hits = self.stats.hits,
            misses = self.stats.misses,
            entries = self.stats.entries,
            size_mb = self.stats.size_bytes / MIB,
            "cache stats"
        );
    }

    #[cfg(test)]
    pub(crate) fn force_expire(&mut self, key: &str) {
        self.entries.force_expire(key);
    }
}
