//! Cache warming engine for prewarm
//!
//! This crate pre-populates an external filesystem cache (for example a
//! VFS cache in front of a slow remote mount) by reading file bytes through
//! it. It provides:
//! - TTL-memoized, sparse-aware allocated-size computation
//! - Segmented, concurrent per-file warming
//! - Sliding-window throughput tracking
//! - A job registry enforcing one live job per source root
//! - The service operations consumed by the HTTP layer

pub mod config;
pub mod registry;
pub mod service;
pub mod sizer;
pub mod warming;

pub use config::{RegistryConfig, ServiceConfig, SizerConfig, WarmerConfig};
pub use prewarm_core::{Error, Result};
pub use registry::{Job, JobRegistry};
pub use service::PrecacheService;
pub use sizer::DiskUsageCache;
pub use warming::{plan_segments, CacheWarmer, ProgressTracker, Segment};
