//! Core domain types, errors, and constants for `prewarm`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate.
//! - **`types`**: serializable snapshots of jobs, global progress and
//!   directory listings.
//! - **`constants`**: tuning constants for sizing, warming and progress.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
