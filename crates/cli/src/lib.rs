//! HTTP front end and argument handling for the `prewarm` binary

pub mod api;
pub mod args;
pub mod error;

pub use api::{create_router, AppState};
pub use args::Args;
pub use error::ApiError;
