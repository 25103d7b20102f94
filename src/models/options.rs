//! Load options
//!
//! Per-request configuration passed by value into every load.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduling hint forwarded to the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// Requested encoding quality, appended as `quality=<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    /// Query parameter value for this quality level.
    pub fn value(self) -> u8 {
        match self {
            Quality::Low => 50,
            Quality::Medium => 70,
            Quality::High => 90,
        }
    }
}

/// Options for a single load request.
///
/// Unset fields fall back to the cache configuration.
///
/// # Fields
/// - `timeout`: Per-attempt deadline
/// - `retries`: Retries after the first attempt
/// - `priority`: Scheduling hint
/// - `quality`, `max_width`, `max_height`: URL construction hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    #[serde(with = "millis")]
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub priority: Priority,
    pub quality: Option<Quality>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Requests a bounding box; either side may be left open.
    pub fn with_max_size(mut self, max_width: Option<u32>, max_height: Option<u32>) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Returns true if any URL construction hint is set.
    pub fn has_url_hints(&self) -> bool {
        self.quality.is_some() || self.max_width.is_some() || self.max_height.is_some()
    }
}

/// Serializes an optional duration as whole milliseconds
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
