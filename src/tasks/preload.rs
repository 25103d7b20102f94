//! Preload Queue
//!
//! Low-priority, strictly sequential cache warming. One worker task drains
//! the queue, pausing between items so foreground loads keep the network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::loader::ImageCache;
use crate::models::{LoadOptions, Priority};

/// Bookkeeping for one `preload_images` call
struct Batch {
    total: usize,
    /// Identifiers processed so far; never decreases
    processed: watch::Sender<usize>,
    /// Identifiers whose preload failed
    skipped: Mutex<HashSet<String>>,
}

impl Batch {
    fn new(total: usize) -> Arc<Self> {
        let (processed, _) = watch::channel(0);
        Arc::new(Self {
            total,
            processed,
            skipped: Mutex::new(HashSet::new()),
        })
    }

    fn record(&self, id: &str, failed: bool) {
        if failed {
            self.skipped.lock().insert(id.to_string());
        }
        self.processed.send_modify(|count| *count += 1);
    }
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<(String, LoadOptions)>,
    /// Queued or in-progress identifiers and the batches waiting on each
    waiting: HashMap<String, Vec<Arc<Batch>>>,
    /// True while a worker task is alive
    running: bool,
}

// == Preload Queue ==
pub struct PreloadQueue {
    state: Mutex<QueueState>,
    delay: Duration,
}

impl PreloadQueue {
    /// Creates an idle queue that pauses `delay` between items.
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            delay,
        }
    }

    // == Enqueue ==
    /// Appends identifiers that are neither cached nor already queued and
    /// starts a worker if none is running.
    ///
    /// Cached identifiers count as processed right away. Identifiers already
    /// queued by an earlier batch count once that item is processed.
    pub fn enqueue<S: AsRef<str>>(&self, cache: &ImageCache, ids: &[S], options: LoadOptions) -> PreloadProgress {
        let options = options.with_priority(Priority::Low);
        let batch = Batch::new(ids.len());

        let (added, start_worker) = {
            let mut state = self.state.lock();
            let mut added = 0;
            for id in ids {
                let id: &str = id.as_ref();
                if let Some(waiters) = state.waiting.get_mut(id) {
                    waiters.push(Arc::clone(&batch));
                    continue;
                }
                if cache.is_cached(id) {
                    batch.record(id, false);
                    continue;
                }
                state.waiting.insert(id.to_string(), vec![Arc::clone(&batch)]);
                state.queue.push_back((id.to_string(), options.clone()));
                added += 1;
            }

            let start_worker = !state.running && !state.queue.is_empty();
            if start_worker {
                state.running = true;
            }
            (added, start_worker)
        };

        debug!(requested = ids.len(), added, "preload batch queued");
        if start_worker {
            spawn_preload_worker(cache.clone());
        }

        PreloadProgress { batch }
    }

    /// Takes the next item, or marks the worker stopped when empty.
    fn next(&self) -> Option<(String, LoadOptions)> {
        let mut state = self.state.lock();
        let item = state.queue.pop_front();
        if item.is_none() {
            state.running = false;
        }
        item
    }

    fn mark_processed(&self, id: &str, failed: bool) {
        let waiters = self.state.lock().waiting.remove(id).unwrap_or_default();
        for batch in waiters {
            batch.record(id, failed);
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

// == Preload Worker ==
/// Drains the preload queue one identifier at a time, then exits.
///
/// Failures are logged and skipped; nothing is surfaced to callers.
pub fn spawn_preload_worker(cache: ImageCache) -> JoinHandle<()> {
    tokio::spawn(async move {
        let queue = cache.preload_queue();
        let mut loaded = 0usize;
        let mut failed = 0usize;

        while let Some((id, options)) = queue.next() {
            let skipped = if cache.is_cached(&id) {
                false
            } else {
                match cache.load_image(&id, options).await {
                    Ok(result) => {
                        loaded += 1;
                        debug!(id = %id, from_cache = result.from_cache, "preloaded image");
                        false
                    }
                    Err(err) => {
                        failed += 1;
                        warn!(id = %id, error = %err, "preload failed, skipping");
                        true
                    }
                }
            };

            queue.mark_processed(&id, skipped);
            tokio::time::sleep(queue.delay()).await;
        }

        info!(loaded, failed, "preload queue drained");
    })
}

// == Preload Progress ==
/// Progress of one preload batch.
///
/// An identifier counts once it has been loaded, found cached, or skipped
/// after a failure. Later removal from the cache does not lower the count.
/// Every call to [`PreloadProgress::stream`] starts a fresh sequence from
/// the current count.
#[derive(Clone)]
pub struct PreloadProgress {
    batch: Arc<Batch>,
}

impl PreloadProgress {
    pub fn total(&self) -> usize {
        self.batch.total
    }

    pub fn completed(&self) -> usize {
        *self.batch.processed.borrow()
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total()
    }

    /// True if the identifier's preload in this batch failed and was skipped.
    pub fn is_skipped(&self, id: &str) -> bool {
        self.batch.skipped.lock().contains(id)
    }

    // == Stream ==
    /// Emits the completed count now and after every change, ending once it
    /// reaches the batch size.
    pub fn stream(&self) -> impl Stream<Item = usize> + Send + 'static {
        let total = self.total();
        let initial = Some((self.batch.processed.subscribe(), None::<usize>));

        stream::unfold(initial, move |state| async move {
            let (mut processed, last) = state?;
            loop {
                let count = *processed.borrow_and_update();
                if last != Some(count) {
                    let next = (count < total).then_some((processed, Some(count)));
                    return Some((count, next));
                }

                processed.changed().await.ok()?;
            }
        })
    }

    /// Waits until every identifier is processed and returns the final count.
    pub async fn wait(&self) -> usize {
        self.stream().fold(0, |_, count| async move { count }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ImageHandle;
    use crate::config::Config;
    use crate::loader::{FetchRequest, ImageTransport};
    use async_trait::async_trait;
    use image::DynamicImage;

    /// Fails for URLs containing "bad" and records every request
    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<FetchRequest>>,
    }

    #[async_trait]
    impl ImageTransport for Recording {
        async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<ImageHandle> {
            self.requests.lock().push(request.clone());
            tokio::time::sleep(Duration::from_millis(30)).await;
            if request.url.contains("bad") {
                anyhow::bail!("404 Not Found");
            }
            Ok(ImageHandle::new(DynamicImage::new_rgba8(2, 2)))
        }
    }

    fn cache() -> (ImageCache, Arc<Recording>) {
        cache_with(Config::default())
    }

    fn cache_with(config: Config) -> (ImageCache, Arc<Recording>) {
        let transport = Arc::new(Recording::default());
        let config = Config {
            default_retries: 0,
            ..config
        };
        (ImageCache::new(config, transport.clone()), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_uses_low_priority() {
        let (cache, transport) = cache();

        let progress = cache.preload_images(&["a", "b"], LoadOptions::default());
        assert_eq!(progress.wait().await, 2);

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.priority == Priority::Low));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_is_sequential() {
        let (cache, transport) = cache();
        let progress = cache.preload_images(&["a", "b", "c"], LoadOptions::default());

        // first fetch in flight, nothing else started
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.requests.lock().len(), 1);
        assert_eq!(progress.completed(), 0);

        progress.wait().await;
        assert_eq!(transport.requests.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_cached_and_queued() {
        let (cache, transport) = cache();
        cache.load_image("a", LoadOptions::default()).await.unwrap();

        let first = cache.preload_images(&["a", "b", "b"], LoadOptions::default());
        let second = cache.preload_images(&["b", "c"], LoadOptions::default());

        assert_eq!(first.wait().await, 3);
        assert_eq!(second.wait().await, 2);

        let urls: Vec<String> = transport.requests.lock().iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_reports_each_item() {
        let (cache, _) = cache();
        let progress = cache.preload_images(&["a", "bad", "c"], LoadOptions::default());

        let counts: Vec<usize> = progress.stream().collect().await;

        assert_eq!(counts, vec![0, 1, 2, 3]);
        assert!(progress.is_skipped("bad"));
        assert!(!progress.is_skipped("a"));
        assert!(!cache.is_cached("bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_is_restartable() {
        let (cache, _) = cache();
        let progress = cache.preload_images(&["a", "b"], LoadOptions::default());
        progress.wait().await;

        let replay: Vec<usize> = progress.stream().collect().await;
        assert_eq!(replay, vec![2]);
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let (cache, _) = cache();
        let progress = cache.preload_images::<&str>(&[], LoadOptions::default());

        let counts: Vec<usize> = progress.stream().collect().await;
        assert_eq!(counts, vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_does_not_stall_progress() {
        let (cache, _) = cache_with(Config {
            max_entries: 1,
            ..Config::default()
        });
        let progress = cache.preload_images(&["a", "b", "c"], LoadOptions::default());

        let done = tokio::time::timeout(Duration::from_secs(600), progress.wait()).await;

        assert_eq!(done.unwrap(), 3);
        assert_eq!(progress.completed(), 3);
        assert!(cache.is_cached("c"));
        assert!(!cache.is_cached("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_clear_still_completes() {
        let (cache, _) = cache();
        let progress = cache.preload_images(&["a", "b"], LoadOptions::default());
        assert_eq!(progress.wait().await, 2);

        cache.clear_cache();

        let replay = tokio::time::timeout(Duration::from_secs(600), progress.stream().collect::<Vec<_>>()).await;
        assert_eq!(replay.unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_ids_belong_to_their_batch() {
        let (cache, _) = cache();
        let first = cache.preload_images(&["bad"], LoadOptions::default());
        first.wait().await;
        assert!(first.is_skipped("bad"));

        let second = cache.preload_images(&["bad"], LoadOptions::default());
        assert!(!second.is_skipped("bad"));
        assert_eq!(second.wait().await, 1);
        assert!(second.is_skipped("bad"));
    }
}
