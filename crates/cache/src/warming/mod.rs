//! Cache warming: segment planning, concurrent reads and progress tracking
//!
//! A file is split into overlapping segments, each read sequentially by its
//! own worker and file handle. Workers batch their byte counts and flush
//! into a shared [`ProgressTracker`].

mod core;
mod segment;
mod tracker;

pub use self::core::CacheWarmer;
pub use segment::{effective_threads, plan_segments, segment_overlap, Segment};
pub use tracker::{ProgressCounters, ProgressTracker};
