//! Cache Administration
//!
//! Clearing, invalidation and statistics on a shared [`CacheGate`]. Removals
//! go through the same store path the gate uses, so accounting stays exact.

use crate::cache::{CacheGate, StatsSnapshot};

impl CacheGate {
    // == Clear All ==
    /// Empties the cache and resets every counter.
    pub async fn clear_all(&self) {
        self.store.write().await.clear_all();
    }

    // == Clear Key ==
    /// Removes one entry and its popularity counter.
    pub async fn clear_key(&self, key: &str) -> bool {
        self.store.write().await.clear_key(key)
    }

    // == Invalidate Route ==
    /// Drops the cached listing of `/api/<route>` and, with an `id`, the
    /// cached `/api/<route>/<id>`. Called after writes to that route.
    pub async fn invalidate_route(&self, route: &str, id: Option<&str>) -> usize {
        self.store.write().await.invalidate_route(route, id)
    }

    // == Stats ==
    /// Detached snapshot of the counters and popularity map.
    pub async fn stats(&self) -> StatsSnapshot {
        self.store.read().await.stats()
    }

    // == Purge Expired ==
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.purge_expired()
    }

    // == Shutdown ==
    /// Releases every entry at process end.
    pub async fn shutdown(&self) {
        let mut store = self.store.write().await;
        let entries = store.len();
        store.clear_all();
        tracing::info!(entries, "response cache released");
    }
}
