//! One logical precache operation

use crate::warming::ProgressTracker;
use chrono::{DateTime, Utc};
use prewarm_core::{percent_of, JobSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A job covering a file or a whole directory subtree.
///
/// Directory jobs fold every file beneath the root into one tracker.
#[derive(Debug)]
pub struct Job {
    root: PathBuf,
    created_at: DateTime<Utc>,
    progress: Arc<ProgressTracker>,
}

impl Job {
    pub fn new(root: PathBuf, total_size: u64) -> Self {
        Self {
            root,
            created_at: Utc::now(),
            progress: Arc::new(ProgressTracker::new(total_size)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.progress.is_expired(now)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let counters = self.progress.counters();
        JobSnapshot {
            root: self.root.clone(),
            total_size: counters.total_size,
            bytes_read: counters.bytes_read,
            current_speed: counters.current_speed,
            cached_size: counters.cached_size,
            is_complete: counters.is_complete,
            percent: percent_of(counters.bytes_read, counters.total_size),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_reflects_progress() {
        let job = Job::new(PathBuf::from("/mnt/media"), 400);
        job.progress().update(100, Instant::now());

        let snapshot = job.snapshot();
        assert_eq!(snapshot.root, PathBuf::from("/mnt/media"));
        assert_eq!(snapshot.bytes_read, 100);
        assert_eq!(snapshot.percent, 25.0);
        assert!(!snapshot.is_complete);
    }

    #[test]
    fn test_zero_sized_job_reports_zero_percent() {
        let job = Job::new(PathBuf::from("/mnt/empty"), 0);
        assert_eq!(job.snapshot().percent, 0.0);
    }

    #[test]
    fn test_expiry_follows_tracker() {
        let job = Job::new(PathBuf::from("/mnt/a"), 0);
        let now = Instant::now();
        assert!(!job.is_expired(now));
        job.progress().finish(now, Duration::ZERO);
        assert!(job.is_expired(now));
    }
}
