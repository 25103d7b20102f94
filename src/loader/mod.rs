//! Loader Module
//!
//! The image cache facade: cache lookups, request deduplication, retrying
//! fetches, preloading and statistics.

mod fetcher;
mod identifier;
mod inflight;
mod transport;

pub use fetcher::{FetchOutcome, RetryPolicy, RetryingFetcher};
pub use identifier::{create_optimized_identifier, credentials_mode, parse_identifier, CredentialsMode};
pub use inflight::{InFlightLedger, InFlightRequest, SettleGuard, SharedFetch};
pub use transport::{FetchRequest, HttpTransport, ImageTransport};

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{CacheStatistics, CacheStore, ImageHandle};
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::models::{LoadOptions, LoadResult};
use crate::tasks::{spawn_sweeper_task, PreloadProgress, PreloadQueue};

struct Inner {
    store: Mutex<CacheStore>,
    inflight: InFlightLedger,
    fetcher: RetryingFetcher,
    preload: PreloadQueue,
    config: Config,
}

// == Image Cache ==
/// Loads images through a shared in-memory cache.
///
/// Cloning is cheap; every clone refers to the same cache. Counters and
/// entries live exactly as long as the last clone.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

/// Non-owning reference held by background tasks
#[derive(Clone)]
pub struct WeakImageCache {
    inner: Weak<Inner>,
}

impl WeakImageCache {
    pub fn upgrade(&self) -> Option<ImageCache> {
        self.inner.upgrade().map(|inner| ImageCache { inner })
    }
}

impl ImageCache {
    // == Constructor ==
    /// Creates a cache that fetches through `transport`.
    pub fn new(config: Config, transport: Arc<dyn ImageTransport>) -> Self {
        let fetcher = RetryingFetcher::new(
            transport,
            RetryPolicy::from_config(&config),
            config.origin.clone(),
        );

        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(CacheStore::new(config.max_size, config.max_entries)),
                inflight: InFlightLedger::new(),
                fetcher,
                preload: PreloadQueue::new(config.preload_delay),
                config,
            }),
        }
    }

    /// Creates a cache backed by [`HttpTransport`].
    pub fn with_http(config: Config) -> anyhow::Result<Self> {
        let mut transport = HttpTransport::new()?;
        if let Some(origin) = &config.origin {
            transport = transport.with_origin(origin.clone());
        }
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakImageCache {
        WeakImageCache {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // == Load Image ==
    /// Returns the image for `id`, fetching it on a miss.
    ///
    /// Concurrent loads of the same identifier share one fetch and observe
    /// the same result.
    pub async fn load_image(&self, id: &str, options: LoadOptions) -> Result<LoadResult> {
        let cached = self.inner.store.lock().get(id);
        if let Some(handle) = cached {
            return Ok(LoadResult::cached(id, handle));
        }

        // A fetch may have settled between the miss above and the ledger lock
        let begun = self.inner.inflight.join_or_begin(id, &options, || {
            let settled = self.inner.store.lock().peek(id).map(|entry| entry.handle.clone());
            match settled {
                Some(handle) => Err(handle),
                None => Ok(self.spawn_fetch(id, options.clone())),
            }
        });
        let (future, leader) = match begun {
            Ok(begun) => begun,
            Err(handle) => return Ok(LoadResult::cached(id, handle)),
        };
        if !leader {
            debug!(id, "joined in-flight request");
        }

        future.await
    }

    /// Runs the fetch in its own task so it settles even if every caller
    /// stops waiting.
    fn spawn_fetch(&self, id: &str, options: LoadOptions) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        let id = id.to_string();

        let task = tokio::spawn(async move {
            let _settle = SettleGuard::new(&inner.inflight, &id);
            let outcome = inner.fetcher.fetch(&id, &options).await?;

            inner
                .store
                .lock()
                .insert(id.clone(), outcome.handle.clone(), outcome.size);
            debug!(id = %id, size = outcome.size, elapsed = ?outcome.elapsed, "image cached");

            Ok::<_, FetchError>(LoadResult::fetched(
                id.clone(),
                outcome.handle,
                outcome.size,
                outcome.elapsed,
            ))
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(FetchError::TransportFailure(format!(
                    "fetch task failed: {}",
                    err
                ))),
            }
        }
        .boxed()
        .shared()
    }

    // == Preload Images ==
    /// Queues identifiers for low-priority background loading.
    ///
    /// Failures are logged and skipped, never returned.
    pub fn preload_images<S: AsRef<str>>(&self, ids: &[S], options: LoadOptions) -> PreloadProgress {
        self.inner.preload.enqueue(self, ids, options)
    }

    pub(crate) fn preload_queue(&self) -> &PreloadQueue {
        &self.inner.preload
    }

    // == Lookups ==
    /// Presence check; does not count as a hit or refresh recency.
    pub fn is_cached(&self, id: &str) -> bool {
        self.inner.store.lock().contains(id)
    }

    /// Returns the cached handle without fetching. Counts as a hit or miss.
    pub fn get_cached_handle(&self, id: &str) -> Option<ImageHandle> {
        self.inner.store.lock().get(id)
    }

    /// True while a fetch for `id` is outstanding.
    pub fn is_loading(&self, id: &str) -> bool {
        self.inner.inflight.is_pending(id)
    }

    // == Removal ==
    pub fn clear_image(&self, id: &str) {
        if self.inner.store.lock().remove(id) {
            debug!(id, "image removed from cache");
        }
    }

    /// Drops every entry and resets hit, miss and eviction counters.
    pub fn clear_cache(&self) {
        self.inner.store.lock().clear();
        info!("image cache cleared");
    }

    // == Configure Limits ==
    /// Replaces the size and count limits, evicting immediately if needed.
    pub fn configure_limits(&self, max_size: u64, max_entries: usize) {
        self.inner.store.lock().configure_limits(max_size, max_entries);
        info!(max_size, max_entries, "cache limits configured");
    }

    // == Statistics ==
    pub fn statistics(&self) -> CacheStatistics {
        self.inner.store.lock().statistics()
    }

    /// Receiver updated after every store mutation.
    pub fn statistics_stream(&self) -> watch::Receiver<CacheStatistics> {
        self.inner.store.lock().subscribe()
    }

    pub fn create_optimized_identifier(&self, id: &str, options: &LoadOptions) -> String {
        create_optimized_identifier(id, options)
    }

    // == Idle Sweeping ==
    /// Removes entries unused for longer than `max_age`.
    pub fn sweep_idle(&self, max_age: Duration) -> usize {
        self.inner.store.lock().sweep_idle(Instant::now(), max_age)
    }

    /// Starts the periodic sweeper with the configured interval and age.
    pub fn start_idle_sweeper(&self) -> JoinHandle<()> {
        spawn_sweeper_task(
            self,
            self.inner.config.sweep_interval,
            self.inner.config.max_idle_age,
        )
    }
}
