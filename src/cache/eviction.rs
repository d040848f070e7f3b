//! Eviction Policy Module
//!
//! Keeps resident size under a soft ceiling by dropping the least popular
//! entries first. Once triggered, eviction continues down to a low-water mark
//! so the next few inserts do not trigger it again.

use crate::cache::{EntryStore, PopularityTracker, DEFAULT_SIZE_LIMIT_BYTES};

/// Fraction of the size limit that eviction drains down to
pub const LOW_WATER_RATIO: f64 = 0.8;

// == Eviction Policy ==
/// Size-bounded, popularity-ordered eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    size_limit_bytes: u64,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_LIMIT_BYTES)
    }
}

impl EvictionPolicy {
    // == Constructor ==
    /// Creates a policy that triggers once resident size exceeds
    /// `size_limit_bytes`.
    pub fn new(size_limit_bytes: u64) -> Self {
        Self { size_limit_bytes }
    }

    pub fn size_limit_bytes(&self) -> u64 {
        self.size_limit_bytes
    }

    /// Resident size eviction drains down to.
    pub fn low_water_mark(&self) -> u64 {
        (self.size_limit_bytes as f64 * LOW_WATER_RATIO) as u64
    }

    // == Should Evict ==
    pub fn should_evict(&self, resident_bytes: u64) -> bool {
        resident_bytes > self.size_limit_bytes
    }

    // == Candidates ==
    /// Every live key, least popular first, ties broken by key.
    pub fn candidates(&self, entries: &EntryStore, popularity: &PopularityTracker) -> Vec<String> {
        let mut keys: Vec<(u64, &String)> = entries
            .sizes()
            .map(|(key, _)| (popularity.count(key), key))
            .collect();
        keys.sort();
        keys.into_iter().map(|(_, key)| key.clone()).collect()
    }

    // == Plan ==
    /// Picks the keys to remove, in removal order, given the current
    /// `resident_bytes`.
    ///
    /// Walks the candidates subtracting each entry's recorded size until the
    /// running total is at or below the low-water mark. The result is empty
    /// when the limit is not exceeded, and is bounded by the number of live
    /// entries either way.
    pub fn plan(
        &self,
        resident_bytes: u64,
        entries: &EntryStore,
        popularity: &PopularityTracker,
    ) -> Vec<String> {
        if !self.should_evict(resident_bytes) {
            return Vec::new();
        }

        let low_water = self.low_water_mark();
        let mut remaining = resident_bytes;
        let mut victims = Vec::new();

        for key in self.candidates(entries, popularity) {
            if remaining <= low_water {
                break;
            }
            if let Some(entry) = entries.get(&key) {
                remaining = remaining.saturating_sub(entry.size_bytes);
                victims.push(key);
            }
        }

        victims
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CachedResponse};

    fn insert(entries: &mut EntryStore, key: &str, size: usize) {
        let response = CachedResponse::json(200, vec![b'x'; size]);
        entries.insert(key.to_string(), CacheEntry::new(response, 60));
    }

    #[test]
    fn test_low_water_mark() {
        let policy = EvictionPolicy::new(1000);
        assert_eq!(policy.low_water_mark(), 800);
        assert_eq!(EvictionPolicy::default().size_limit_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_no_plan_under_limit() {
        let policy = EvictionPolicy::new(100);
        let mut entries = EntryStore::new();
        insert(&mut entries, "a", 100);

        assert!(policy
            .plan(entries.total_size(), &entries, &PopularityTracker::new())
            .is_empty());
    }

    #[test]
    fn test_candidates_least_popular_first_ties_by_key() {
        let policy = EvictionPolicy::new(100);
        let mut entries = EntryStore::new();
        let mut popularity = PopularityTracker::new();
        for key in ["b", "a", "c", "d"] {
            insert(&mut entries, key, 10);
        }
        popularity.increment("c");
        popularity.increment("c");
        popularity.increment("d");
        popularity.increment("a");

        assert_eq!(
            policy.candidates(&entries, &popularity),
            vec!["b", "a", "d", "c"]
        );
    }

    #[test]
    fn test_plan_stops_at_low_water_mark() {
        let policy = EvictionPolicy::new(100);
        let mut entries = EntryStore::new();
        let mut popularity = PopularityTracker::new();
        insert(&mut entries, "cold", 30);
        insert(&mut entries, "warm", 30);
        insert(&mut entries, "hot", 50);
        popularity.increment("warm");
        for _ in 0..5 {
            popularity.increment("hot");
        }

        // 110 -> drop cold (80) and stop
        let victims = policy.plan(entries.total_size(), &entries, &popularity);
        assert_eq!(victims, vec!["cold"]);
    }

    #[test]
    fn test_plan_exhausts_entries_when_accounting_drifts() {
        let policy = EvictionPolicy::new(100);
        let mut entries = EntryStore::new();
        insert(&mut entries, "a", 10);
        insert(&mut entries, "b", 10);

        // Resident size claims far more than the entries hold
        let victims = policy.plan(10_000, &entries, &PopularityTracker::new());
        assert_eq!(victims, vec!["a", "b"]);
    }
}
