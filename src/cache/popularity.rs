//! Popularity Tracker Module
//!
//! Counts how often each key is requested. Counters outlive the entries they
//! describe: popularity belongs to the resource, not to one cached copy.

use std::collections::HashMap;
use std::str::FromStr;

// == Popularity Mode ==
/// Which lookups count toward a key's popularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopularityMode {
    /// Every lookup, hit or miss
    #[default]
    AllLookups,
    /// Only lookups that miss, i.e. cache refreshes
    MissesOnly,
}

impl FromStr for PopularityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::AllLookups),
            "misses" => Ok(Self::MissesOnly),
            other => Err(format!("unknown popularity mode '{}'", other)),
        }
    }
}

// == Popularity Tracker ==
/// Monotonic per-key request counters.
#[derive(Debug, Default)]
pub struct PopularityTracker {
    counts: HashMap<String, u64>,
}

impl PopularityTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Increment ==
    /// Records one request for `key` and returns the new count.
    pub fn increment(&mut self, key: &str) -> u64 {
        match self.counts.get_mut(key) {
            Some(count) => {
                *count = count.saturating_add(1);
                *count
            }
            None => {
                self.counts.insert(key.to_string(), 1);
                1
            }
        }
    }

    // == Count ==
    /// Current count for `key`, `0` if never seen.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    // == Remove ==
    /// Forgets `key`. Only an explicit clear of that key should call this.
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.counts.remove(key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    // == Snapshot ==
    /// Owned copy of every counter.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.clone()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Orders `(key, count)` pairs by descending count then ascending key and
/// keeps the first `n`.
pub(crate) fn rank(pairs: impl Iterator<Item = (String, u64)>, n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = pairs.collect();
    ranked.sort_by(|(key_a, count_a), (key_b, count_b)| {
        count_b.cmp(count_a).then_with(|| key_a.cmp(key_b))
    });
    ranked.truncate(n);
    ranked
}
