//! Request and result models for the image loader
//!
//! Value types passed into and returned from load operations.

pub mod options;
pub mod result;

// Re-export commonly used types
pub use options::{LoadOptions, Priority, Quality};
pub use result::LoadResult;
