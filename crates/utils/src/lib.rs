//! Shared utilities and pure functions for prewarm
//!
//! Request-path resolution and timestamp helpers are pure; `tracing::init`
//! is the only function here with process-wide side effects.

pub mod file_times;
pub mod paths;
pub mod tracing;

pub use file_times::*;
pub use paths::*;
