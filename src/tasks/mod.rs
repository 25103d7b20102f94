//! Background Tasks Module
//!
//! Work that runs alongside foreground loads.
//!
//! # Tasks
//! - Idle sweeper: removes entries unused beyond a maximum age
//! - Preload worker: warms the cache one identifier at a time

mod preload;
mod sweeper;

pub use preload::{spawn_preload_worker, PreloadProgress, PreloadQueue};
pub use sweeper::spawn_sweeper_task;
