//! Job registry
//!
//! Maps resolved source roots to their jobs. A job is live while it is in
//! the table and its completion grace has not elapsed; expired jobs are
//! removed lazily by the next operation that touches them.

mod job;
mod traversal;

pub use job::Job;
pub use traversal::TraversalSummary;

use crate::config::RegistryConfig;
use crate::sizer::DiskUsageCache;
use crate::warming::CacheWarmer;
use parking_lot::RwLock;
use prewarm_core::{percent_of, Error, GlobalProgress, JobSnapshot, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Concurrent table of precache jobs
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<PathBuf, Arc<Job>>>>,
    sizer: Arc<DiskUsageCache>,
    warmer: CacheWarmer,
    config: RegistryConfig,
}

impl JobRegistry {
    pub fn new(config: RegistryConfig, sizer: Arc<DiskUsageCache>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            sizer,
            warmer: CacheWarmer::new(config.warmer.clone()),
            config,
        }
    }

    /// Start warming `path` in the background.
    ///
    /// The path is canonicalized so aliases of the same root share one job.
    /// Fails with `AlreadyInProgress` when a live job covers the root.
    pub async fn start_job(&self, path: &Path) -> Result<JobSnapshot> {
        let root = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| Error::path_not_found_with_source(path, e))?;

        if self.live_job(&root).is_some() {
            return Err(Error::already_in_progress(root));
        }

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| Error::path_not_found_with_source(&root, e))?;

        let total_size = Arc::clone(&self.sizer)
            .allocated_size_async(root.clone())
            .await;
        debug!(
            root = %root.display(),
            total_size,
            stat_calls = self.sizer.stat_calls(),
            "root sized"
        );

        let job = {
            let mut jobs = self.jobs.write();
            // sizing ran unlocked, so another request may have won the race
            if let Some(existing) = jobs.get(&root) {
                if !existing.is_expired(Instant::now()) {
                    return Err(Error::already_in_progress(root));
                }
            }
            let job = Arc::new(Job::new(root.clone(), total_size));
            jobs.insert(root.clone(), Arc::clone(&job));
            job
        };

        info!(
            root = %root.display(),
            total_size,
            is_dir = metadata.is_dir(),
            "precache job started"
        );

        let span = prewarm_utils::tracing::job_span(&root);
        tokio::spawn(
            run_job(
                Arc::clone(&job),
                self.warmer.clone(),
                metadata.file_type(),
                self.config.completion_grace,
            )
            .instrument(span),
        );

        Ok(job.snapshot())
    }

    /// Snapshot of the live job rooted at `path`
    pub async fn get_progress(&self, path: &Path) -> Result<JobSnapshot> {
        let root = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| Error::not_found(path))?;

        self.live_job(&root)
            .map(|job| job.snapshot())
            .ok_or_else(|| Error::not_found(root))
    }

    /// Aggregate over jobs that have not completed yet
    pub fn get_global_progress(&self) -> GlobalProgress {
        self.prune_expired();

        let jobs = self.jobs.read();
        let mut global = GlobalProgress::default();
        for job in jobs.values() {
            let counters = job.progress().counters();
            if counters.is_complete {
                continue;
            }
            global.active_jobs += 1;
            global.total_speed += counters.current_speed;
            global.total_size += counters.total_size;
            global.bytes_read += counters.bytes_read;
            global.cached_size += counters.cached_size;
        }
        global.overall_percent = percent_of(global.bytes_read, global.total_size);
        global
    }

    /// Drop every job whose completion grace has elapsed
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| !job.is_expired(now));
        before - jobs.len()
    }

    fn live_job(&self, root: &Path) -> Option<Arc<Job>> {
        let now = Instant::now();
        {
            let jobs = self.jobs.read();
            match jobs.get(root) {
                None => return None,
                Some(job) if !job.is_expired(now) => return Some(Arc::clone(job)),
                Some(_) => {}
            }
        }

        let mut jobs = self.jobs.write();
        if jobs.get(root).is_some_and(|job| job.is_expired(now)) {
            jobs.remove(root);
        }
        None
    }
}

async fn run_job(
    job: Arc<Job>,
    warmer: CacheWarmer,
    file_type: std::fs::FileType,
    grace: std::time::Duration,
) {
    let started = Instant::now();

    if file_type.is_file() {
        if let Err(err) = warmer.warm_file(job.root(), job.progress()).await {
            warn!(error = %err, "failed to warm file");
        }
    } else if file_type.is_dir() {
        let summary = traversal::warm_tree(&warmer, &job).await;
        info!(
            files_warmed = summary.files_warmed,
            files_failed = summary.files_failed,
            enumeration_failures = summary.enumeration_failures,
            "directory traversal finished"
        );
    } else {
        warn!("root is neither a file nor a directory, nothing to warm");
    }

    job.progress().finish(Instant::now(), grace);
    let counters = job.progress().counters();
    info!(
        root = %job.root().display(),
        bytes_read = counters.bytes_read,
        total_size = counters.total_size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "precache job complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarmerConfig;
    use std::time::Duration;
    use tempfile::TempDir;

    fn registry(grace: Duration) -> JobRegistry {
        let config = RegistryConfig {
            warmer: WarmerConfig::default(),
            completion_grace: grace,
        };
        JobRegistry::new(config, Arc::new(DiskUsageCache::default()))
    }

    async fn wait_complete(registry: &JobRegistry, path: &Path) -> JobSnapshot {
        for _ in 0..500 {
            let snapshot = registry.get_progress(path).await.unwrap();
            if snapshot.is_complete {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job for {} never completed", path.display());
    }

    #[tokio::test]
    async fn test_start_missing_path_is_path_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = registry(Duration::from_secs(1));
        let err = registry
            .start_job(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, Error::PathNotFound { .. }));
        assert!(registry.jobs.read().is_empty());
    }

    #[tokio::test]
    async fn test_single_file_job_completes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("movie.mkv");
        std::fs::write(&file, vec![7u8; 64 * 1024]).unwrap();

        let registry = registry(Duration::from_secs(5));
        let started = registry.start_job(&file).await.unwrap();
        assert!(started.total_size >= 64 * 1024);

        let done = wait_complete(&registry, &file).await;
        assert_eq!(done.bytes_read, 64 * 1024);
        assert_eq!(done.cached_size, done.bytes_read);
    }

    #[tokio::test]
    async fn test_duplicate_start_conflicts_until_expiry() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a"), b"hello").unwrap();

        let registry = registry(Duration::from_secs(30));
        registry.start_job(dir.path()).await.unwrap();
        let err = registry.start_job(dir.path()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_completed_job_expires_after_grace() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a"), b"hello").unwrap();

        let registry = registry(Duration::from_millis(50));
        registry.start_job(dir.path()).await.unwrap();

        let mut expired = false;
        for _ in 0..500 {
            match registry.get_progress(dir.path()).await {
                Ok(_) => tokio::time::sleep(Duration::from_millis(10)).await,
                Err(err) => {
                    assert!(matches!(err, Error::NotFound { .. }));
                    expired = true;
                    break;
                }
            }
        }
        assert!(expired);
        assert!(registry.jobs.read().is_empty());

        // an expired root can be started again
        registry.start_job(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_global_progress_empty() {
        let registry = registry(Duration::from_secs(1));
        let global = registry.get_global_progress();
        assert_eq!(global, GlobalProgress::default());
    }

    #[tokio::test]
    async fn test_global_progress_skips_completed_jobs() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a");
        std::fs::write(&file, vec![1u8; 1024]).unwrap();

        let registry = registry(Duration::from_secs(30));
        registry.start_job(&file).await.unwrap();
        wait_complete(&registry, &file).await;

        let global = registry.get_global_progress();
        assert_eq!(global.active_jobs, 0);
        assert_eq!(global.total_size, 0);
        assert_eq!(registry.jobs.read().len(), 1);
    }

    #[test]
    fn test_prune_expired() {
        let registry = registry(Duration::ZERO);
        let job = Arc::new(Job::new(PathBuf::from("/nowhere"), 0));
        job.progress().finish(Instant::now(), Duration::ZERO);
        registry
            .jobs
            .write()
            .insert(PathBuf::from("/nowhere"), job);

        assert_eq!(registry.prune_expired(), 1);
        assert!(registry.jobs.read().is_empty());
    }
}
