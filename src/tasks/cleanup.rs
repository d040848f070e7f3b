//! Expiry Sweep Task
//!
//! Background task that periodically drops expired cached responses, so
//! entries nobody asks for again still give their bytes back.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheGate;

/// Spawns a background task that purges expired entries from `cache`.
///
/// The task loops forever, sleeping `interval_secs` between sweeps. The
/// returned handle is used to abort it during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = CacheGate::default();
/// let sweep = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(cache: CacheGate, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs, "starting expiry sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "expiry sweep dropped stale responses");
            } else {
                debug!("expiry sweep: nothing expired");
            }
        }
    })
}
