//! Entry Store Module
//!
//! Plain key to entry storage. Holds no policy and keeps no statistics;
//! callers account for every insert and removal themselves.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Entry Store ==
/// Mapping from cache key to stored entry.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: HashMap<String, CacheEntry>,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the entry for `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Insert ==
    /// Stores `entry` under `key`, returning the entry it replaced.
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    // == Remove ==
    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    // == Expired Keys ==
    /// Collects the keys of all entries whose TTL has elapsed.
    pub fn expired_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Iterates over keys with their recorded sizes.
    pub fn sizes(&self) -> impl Iterator<Item = (&String, u64)> {
        self.entries.iter().map(|(key, entry)| (key, entry.size_bytes))
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of recorded sizes over all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|entry| entry.size_bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves an entry's expiry into the past.
    #[cfg(test)]
    pub(crate) fn force_expire(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = entry.stored_at.saturating_sub(1);
        }
    }
}
