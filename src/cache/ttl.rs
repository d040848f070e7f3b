//! TTL Policy Module
//!
//! Extends the lifetime of entries for resources that are requested often.

use crate::cache::{
    PopularityTracker, DEFAULT_POPULARITY_MULTIPLIER, DEFAULT_POPULARITY_THRESHOLD,
    DEFAULT_TTL_CAP_SECS,
};

// == TTL Policy ==
/// Maps a base duration and a popularity count to the duration an entry is
/// actually stored for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtlPolicy {
    /// A key is popular once its count is strictly greater than this
    pub threshold: u64,
    /// Factor applied to the base duration of popular keys
    pub multiplier: f64,
    /// Ceiling for an extended duration, in seconds
    pub cap_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_POPULARITY_THRESHOLD,
            multiplier: DEFAULT_POPULARITY_MULTIPLIER,
            cap_secs: DEFAULT_TTL_CAP_SECS,
        }
    }
}

impl TtlPolicy {
    pub fn new(threshold: u64, multiplier: f64, cap_secs: u64) -> Self {
        Self {
            threshold,
            multiplier,
            cap_secs,
        }
    }

    // == Adjust ==
    /// Effective duration for a key requested `popularity` times.
    ///
    /// Unpopular keys keep `base_secs` unchanged, even when it is above the
    /// cap. Popular keys get `min(base_secs * multiplier, cap_secs)`.
    pub fn adjust(&self, popularity: u64, base_secs: u64) -> u64 {
        if popularity <= self.threshold {
            return base_secs;
        }
        let extended = (base_secs as f64 * self.multiplier).round() as u64;
        extended.min(self.cap_secs)
    }

    /// Reads the current count for `key` and adjusts. Never touches the
    /// tracker.
    pub fn adjust_for(&self, popularity: &PopularityTracker, key: &str, base_secs: u64) -> u64 {
        self.adjust(popularity.count(key), base_secs)
    }
}
