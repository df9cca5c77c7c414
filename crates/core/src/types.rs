//! Report types shared between the warming engine and its callers
//!
//! Everything here is a plain snapshot: values are copied out of the
//! lock-protected job state, so holding one never blocks a worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Point-in-time view of one precache job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Resolved source root the job was started for
    pub root: PathBuf,
    /// Allocated bytes beneath the root, fixed when the job starts
    pub total_size: u64,
    /// Cumulative bytes read by all workers
    pub bytes_read: u64,
    /// Sliding-window throughput in bytes per second
    pub current_speed: f64,
    /// Bytes reported as pulled into the underlying cache
    pub cached_size: u64,
    pub is_complete: bool,
    /// `bytes_read / total_size * 100`, may slightly exceed 100 due to segment overlap
    pub percent: f64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate over every job that has not completed yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalProgress {
    pub total_speed: f64,
    pub overall_percent: f64,
    pub active_jobs: usize,
    pub total_size: u64,
    pub bytes_read: u64,
    pub cached_size: u64,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Path relative to the mount, always starting with `/`
    pub path: String,
    pub is_dir: bool,
    /// Logical length; `None` for directories
    pub size: Option<u64>,
    /// Seconds since the Unix epoch
    pub modified_time: f64,
    /// Allocated bytes of the matching entry in the cache directory
    pub cached_size: u64,
}

/// Answer to a progress query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressReport {
    Global(GlobalProgress),
    Job(JobSnapshot),
}

/// Percentage helper that treats an empty total as 0%
#[must_use]
pub fn percent_of(done: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}
