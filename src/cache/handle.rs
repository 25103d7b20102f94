//! Image Handle Module
//!
//! Opaque, cheaply cloneable reference to an already-decoded image.

use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

// == Image Handle ==
/// Shared handle to a decoded image.
///
/// Cloning only bumps a reference count; the pixel data is never copied.
#[derive(Clone)]
pub struct ImageHandle {
    image: Arc<DynamicImage>,
}

impl ImageHandle {
    /// Wraps a decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Returns the decoded image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // == Estimated Size ==
    /// Raw RGBA footprint: `width * height * 4`.
    ///
    /// Deliberately not the compressed transfer size.
    pub fn estimated_size(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) * 4
    }

    /// Returns true if both handles point at the same decoded image.
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
