//! Error types for prewarm operations

mod builders;
mod classify;
mod types;

pub use types::{Error, Result};
