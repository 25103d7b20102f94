//! Idle Sweeper Task
//!
//! Background task that periodically removes cache entries nobody has used
//! for a while. Independent of size and count pressure.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::loader::ImageCache;

/// Spawns a background task that sweeps idle entries on a fixed interval.
///
/// The task only holds a weak reference and stops on its own once the cache
/// is dropped. Removals are not counted as evictions.
///
/// # Arguments
/// * `cache` - The cache to sweep
/// * `interval` - Time between sweeps
/// * `max_age` - Entries idle longer than this are removed
///
/// # Returns
/// A JoinHandle that can be used to abort the task early.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweeper_task(&cache, Duration::from_secs(300), Duration::from_secs(1800));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweeper_task(cache: &ImageCache, interval: Duration, max_age: Duration) -> JoinHandle<()> {
    let cache = cache.downgrade();

    tokio::spawn(async move {
        info!(?interval, ?max_age, "starting idle sweeper");

        loop {
            tokio::time::sleep(interval).await;

            let Some(cache) = cache.upgrade() else {
                debug!("cache dropped, stopping idle sweeper");
                break;
            };

            let removed = cache.sweep_idle(max_age);
            if removed > 0 {
                info!("idle sweep: removed {} entries", removed);
            } else {
                debug!("idle sweep: no idle entries found");
            }
        }
    })
}
