//! Image transport
//!
//! The seam that retrieves a URL and hands back a decoded image. The cache
//! never decodes anything itself.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::cache::ImageHandle;
use crate::loader::CredentialsMode;
use crate::models::Priority;

/// A single retrieval issued by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Optimized identifier to retrieve
    pub url: String,
    pub credentials: CredentialsMode,
    pub priority: Priority,
}

/// Retrieves and decodes an image.
///
/// Implementations must not retry or time out on their own; the fetcher
/// composes both around every call.
#[async_trait]
pub trait ImageTransport: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> Result<ImageHandle>;
}

// == HTTP Transport ==
/// Fetches images over HTTP with reqwest and decodes them with `image`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    /// Base for relative identifiers
    origin: Option<Url>,
    /// Sent only with same-origin requests
    credentials: HeaderMap,
}

impl HttpTransport {
    /// Creates a transport without a page origin or credentials.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("image_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            origin: None,
            credentials: HeaderMap::new(),
        })
    }

    /// Resolves relative identifiers against `origin`.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Headers (cookies, authorization) attached to same-origin requests.
    pub fn with_credentials(mut self, credentials: HeaderMap) -> Self {
        self.credentials = credentials;
        self
    }

    fn resolve(&self, id: &str) -> Result<Url> {
        match &self.origin {
            Some(origin) => origin
                .join(id)
                .with_context(|| format!("cannot resolve {} against {}", id, origin)),
            None => Url::parse(id).with_context(|| format!("invalid image URL {}", id)),
        }
    }
}

#[async_trait]
impl ImageTransport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<ImageHandle> {
        let url = self.resolve(&request.url)?;

        let mut builder = self.client.get(url.clone());
        if request.credentials == CredentialsMode::SameOrigin {
            builder = builder.headers(self.credentials.clone());
        }

        debug!(url = %url, priority = ?request.priority, credentials = ?request.credentials, "fetching image");

        let response = builder
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            bail!("failed to fetch {}: HTTP {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", url))?;

        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode image from {}", url))?;

        Ok(ImageHandle::new(image))
    }
}
