//! The three operations exposed to transports: list, start, progress

use crate::config::ServiceConfig;
use crate::registry::JobRegistry;
use crate::sizer::DiskUsageCache;
use prewarm_core::{Error, FileInfo, JobSnapshot, ProgressReport, Result};
use prewarm_utils::{display_child_path, is_root_request, modified_seconds, request_relative};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Owns the job registry and the size cache for one mount
#[derive(Debug)]
pub struct PrecacheService {
    config: ServiceConfig,
    registry: JobRegistry,
    sizer: Arc<DiskUsageCache>,
}

impl PrecacheService {
    pub fn new(config: ServiceConfig) -> Self {
        let sizer = Arc::new(DiskUsageCache::new(config.sizer.clone()));
        let registry = JobRegistry::new(config.registry.clone(), Arc::clone(&sizer));
        Self {
            config,
            registry,
            sizer,
        }
    }

    /// Entries of `mount/request`, newest first
    pub async fn list_directory(&self, request: &str) -> Result<Vec<FileInfo>> {
        let relative = request_relative(request)?;
        let mount = self.config.mount.clone();
        let cache_dir = self.config.cache_dir.clone();
        let sizer = Arc::clone(&self.sizer);

        tokio::task::spawn_blocking(move || list_blocking(&mount, &cache_dir, &relative, &sizer))
            .await
            .map_err(|e| Error::worker(&self.config.mount, e.to_string()))?
    }

    /// Begin warming `mount/request` and acknowledge the new job
    pub async fn start_precache(&self, request: &str) -> Result<JobSnapshot> {
        let source = self.source_path(request)?;
        self.registry.start_job(&source).await
    }

    /// Global progress for the root sentinel, otherwise the job rooted at `request`
    pub async fn get_progress(&self, request: &str) -> Result<ProgressReport> {
        if is_root_request(request) {
            let mut global = self.registry.get_global_progress();
            global.cached_size = Arc::clone(&self.sizer)
                .allocated_size_fresh_async(self.config.cache_dir.clone())
                .await;
            return Ok(ProgressReport::Global(global));
        }

        let source = self.source_path(request)?;
        self.registry
            .get_progress(&source)
            .await
            .map(ProgressReport::Job)
    }

    fn source_path(&self, request: &str) -> Result<PathBuf> {
        prewarm_utils::resolve_request_path(&self.config.mount, request)
    }
}

fn list_blocking(
    mount: &Path,
    cache_dir: &Path,
    relative: &Path,
    sizer: &DiskUsageCache,
) -> Result<Vec<FileInfo>> {
    let dir = mount.join(relative);
    let entries =
        std::fs::read_dir(&dir).map_err(|e| Error::path_not_found_with_source(&dir, e))?;

    let mut listing = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "skipping entry without metadata");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = metadata.is_dir();
        listing.push(FileInfo {
            path: display_child_path(relative, &name),
            cached_size: sizer.allocated_size_fresh(&cache_dir.join(relative).join(&name)),
            size: (!is_dir).then(|| metadata.len()),
            modified_time: modified_seconds(&metadata),
            is_dir,
            name,
        });
    }

    listing.sort_by(|a, b| b.modified_time.total_cmp(&a.modified_time));
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Fixture {
        mount: TempDir,
        cache: TempDir,
        service: PrecacheService,
    }

    fn fixture() -> Fixture {
        let mount = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let mut config = ServiceConfig::new(mount.path(), cache.path());
        config.registry.completion_grace = Duration::from_secs(30);
        let service = PrecacheService::new(config);
        Fixture {
            mount,
            cache,
            service,
        }
    }

    fn set_mtime(path: &Path, secs_ago: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_directory_sorted_newest_first() {
        let fx = fixture();
        let shows = fx.mount.path().join("shows");
        fs::create_dir(&shows).unwrap();
        fs::write(shows.join("old.mkv"), vec![0u8; 100]).unwrap();
        fs::write(shows.join("new.mkv"), vec![0u8; 200]).unwrap();
        fs::create_dir(shows.join("extras")).unwrap();
        set_mtime(&shows.join("old.mkv"), 3600);
        set_mtime(&shows.join("new.mkv"), 60);

        let listing = fx.service.list_directory("/shows").await.unwrap();
        let names: Vec<_> = listing.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["extras", "new.mkv", "old.mkv"]);

        let new = &listing[1];
        assert_eq!(new.path, "/shows/new.mkv");
        assert_eq!(new.size, Some(200));
        assert!(!new.is_dir);
        assert_eq!(new.cached_size, 0);

        assert!(listing[0].is_dir);
        assert_eq!(listing[0].size, None);
    }

    #[tokio::test]
    async fn test_list_directory_reports_cached_size() {
        let fx = fixture();
        fs::write(fx.mount.path().join("a.bin"), vec![1u8; 8192]).unwrap();
        fs::write(fx.cache.path().join("a.bin"), vec![1u8; 8192]).unwrap();

        let listing = fx.service.list_directory("").await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].path, "/a.bin");
        assert!(listing[0].cached_size >= 8192);
    }

    #[tokio::test]
    async fn test_cached_sizes_follow_cache_growth() {
        let fx = fixture();
        fs::write(fx.mount.path().join("a.bin"), vec![1u8; 64 * 1024]).unwrap();

        let listing = fx.service.list_directory("").await.unwrap();
        assert_eq!(listing[0].cached_size, 0);
        let ProgressReport::Global(global) = fx.service.get_progress("/").await.unwrap() else {
            panic!("expected global progress");
        };
        assert_eq!(global.cached_size, 0);

        fs::write(fx.cache.path().join("a.bin"), vec![1u8; 64 * 1024]).unwrap();

        let listing = fx.service.list_directory("").await.unwrap();
        assert!(listing[0].cached_size >= 64 * 1024);
        let ProgressReport::Global(global) = fx.service.get_progress("/").await.unwrap() else {
            panic!("expected global progress");
        };
        assert!(global.cached_size >= 64 * 1024);
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let fx = fixture();
        let err = fx.service.list_directory("nope").await.unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn test_parent_components_rejected() {
        let fx = fixture();
        let err = fx.service.list_directory("../etc").await.unwrap_err();
        assert!(err.is_invalid_request());
        let err = fx.service.start_precache("a/../../b").await.unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_root_progress_is_global() {
        let fx = fixture();
        fs::write(fx.cache.path().join("chunk"), vec![1u8; 4096]).unwrap();

        match fx.service.get_progress("/").await.unwrap() {
            ProgressReport::Global(global) => {
                assert_eq!(global.active_jobs, 0);
                assert_eq!(global.overall_percent, 0.0);
                assert!(global.cached_size >= 4096);
            }
            other => panic!("expected global progress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_and_query_job() {
        let fx = fixture();
        fs::create_dir(fx.mount.path().join("movies")).unwrap();
        fs::write(fx.mount.path().join("movies/a.mkv"), vec![3u8; 4096]).unwrap();

        let ack = fx.service.start_precache("/movies").await.unwrap();
        assert!(ack.root.ends_with("movies"));

        match fx.service.get_progress("movies").await.unwrap() {
            ProgressReport::Job(snapshot) => assert_eq!(snapshot.root, ack.root),
            other => panic!("expected job progress, got {other:?}"),
        }

        let err = fx.service.start_precache("movies/").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_progress_for_unknown_path() {
        let fx = fixture();
        let err = fx.service.get_progress("/nothing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
