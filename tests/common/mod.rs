//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use image_cache::loader::FetchRequest;
use image_cache::{ImageHandle, ImageTransport};
use parking_lot::Mutex;

/// Installs a test subscriber once; output shows with `RUST_LOG=image_cache=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One scripted attempt
#[derive(Debug, Clone, Copy)]
pub enum Attempt {
    /// Succeed after the delay with a `width x height` image
    Ok { delay: Duration, width: u32, height: u32 },
    /// Fail after the delay
    Fail { delay: Duration },
}

impl Attempt {
    pub fn ok() -> Self {
        Attempt::Ok {
            delay: Duration::ZERO,
            width: 10,
            height: 10,
        }
    }

    pub fn ok_after(delay: Duration) -> Self {
        Attempt::Ok {
            delay,
            width: 10,
            height: 10,
        }
    }

    pub fn fail() -> Self {
        Attempt::Fail {
            delay: Duration::ZERO,
        }
    }
}

/// Transport that plays back scripted attempts per URL.
///
/// URLs without a script succeed immediately with a 10x10 image.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Attempt>>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, attempts: Vec<Attempt>) {
        self.scripts.lock().insert(url.to_string(), attempts.into());
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl ImageTransport for ScriptedTransport {
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<ImageHandle> {
        self.calls.lock().push(request.clone());
        let attempt = self
            .scripts
            .lock()
            .get_mut(&request.url)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(Attempt::ok);

        match attempt {
            Attempt::Ok { delay, width, height } => {
                tokio::time::sleep(delay).await;
                Ok(ImageHandle::new(DynamicImage::new_rgba8(width, height)))
            }
            Attempt::Fail { delay } => {
                tokio::time::sleep(delay).await;
                anyhow::bail!("connection reset by peer")
            }
        }
    }
}
