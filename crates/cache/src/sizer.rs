//! TTL-memoized allocated-size computation
//!
//! Sizes are reported in allocated bytes (`st_blocks * 512`), not logical
//! length, so sparse files count only the blocks they actually occupy.
//! Every visited leaf is memoized under its absolute path and expires on its
//! own; there is no sweep. The memo lock is never held across a stat call.
//!
//! [`DiskUsageCache::allocated_size`] memoizes the requested path itself and
//! suits totals that are fixed once, such as a job's size. Reports that must
//! follow a growing directory use [`DiskUsageCache::allocated_size_fresh`],
//! which always re-stats the requested path and only reuses entries below it.

use crate::config::SizerConfig;
use parking_lot::RwLock;
use prewarm_core::{Error, STAT_BLOCK_SIZE};
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy)]
struct SizeCacheEntry {
    allocated_bytes: u64,
    observed_at: Instant,
}

/// Memoizing disk usage calculator shared by the registry and the service
#[derive(Debug)]
pub struct DiskUsageCache {
    entries: RwLock<HashMap<PathBuf, SizeCacheEntry>>,
    ttl: Duration,
    /// Number of stat calls issued, for diagnostics
    stat_calls: AtomicU64,
}

impl Default for DiskUsageCache {
    fn default() -> Self {
        Self::new(SizerConfig::default())
    }
}

impl DiskUsageCache {
    pub fn new(config: SizerConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: config.ttl,
            stat_calls: AtomicU64::new(0),
        }
    }

    /// Allocated bytes of a file or directory subtree.
    ///
    /// A fresh memo entry is returned without touching the filesystem.
    /// Paths that cannot be stat'ed report 0.
    pub fn allocated_size(&self, path: &Path) -> u64 {
        let key = absolute_key(path);
        if let Some(size) = self.lookup(&key) {
            return size;
        }

        let size = self.compute(&key);
        self.store(key, size);
        size
    }

    /// Allocated bytes of `path`, bypassing the memo for `path` itself.
    ///
    /// Fresh entries beneath a directory are still reused and newly visited
    /// leaves are stored, but neither the lookup nor the result for `path`
    /// touches the memo.
    pub fn allocated_size_fresh(&self, path: &Path) -> u64 {
        self.compute(&absolute_key(path))
    }

    /// Run [`Self::allocated_size`] on the blocking pool
    pub async fn allocated_size_async(self: Arc<Self>, path: PathBuf) -> u64 {
        self.size_on_blocking_pool(path, Self::allocated_size).await
    }

    /// Run [`Self::allocated_size_fresh`] on the blocking pool
    pub async fn allocated_size_fresh_async(self: Arc<Self>, path: PathBuf) -> u64 {
        self.size_on_blocking_pool(path, Self::allocated_size_fresh)
            .await
    }

    /// Number of stat calls issued since creation
    pub fn stat_calls(&self) -> u64 {
        self.stat_calls.load(Ordering::Relaxed)
    }

    async fn size_on_blocking_pool(
        self: Arc<Self>,
        path: PathBuf,
        size_of: fn(&Self, &Path) -> u64,
    ) -> u64 {
        match tokio::task::spawn_blocking(move || size_of(&*self, &path)).await {
            Ok(size) => size,
            Err(e) => {
                debug!(error = %e, "size computation task failed");
                0
            }
        }
    }

    fn lookup(&self, key: &Path) -> Option<u64> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.observed_at.elapsed() < self.ttl)
            .map(|entry| entry.allocated_bytes)
    }

    fn store(&self, key: PathBuf, allocated_bytes: u64) {
        self.entries.write().insert(
            key,
            SizeCacheEntry {
                allocated_bytes,
                observed_at: Instant::now(),
            },
        );
    }

    fn stat(&self, path: &Path) -> std::io::Result<Metadata> {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);
        std::fs::metadata(path)
    }

    fn compute(&self, path: &Path) -> u64 {
        let metadata = match self.stat(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stat failed, reporting zero");
                return 0;
            }
        };

        if !metadata.is_dir() {
            return allocated_bytes(&metadata);
        }

        let mut total = 0u64;
        let mut walker = WalkDir::new(path).min_depth(1).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let err = Error::partial_enumeration(
                        e.path().unwrap_or(path),
                        e.to_string(),
                    );
                    debug!(error = %err, "skipping entry while sizing");
                    continue;
                }
            };

            if let Some(size) = self.lookup(entry.path()) {
                total += size;
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            let metadata = match self.stat(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    let err = Error::partial_enumeration(entry.path(), e.to_string());
                    debug!(error = %err, "entry contributes zero");
                    continue;
                }
            };

            if metadata.is_dir() {
                continue;
            }

            let size = allocated_bytes(&metadata);
            self.store(entry.into_path(), size);
            total += size;
        }

        total
    }
}

/// Memo key: the absolute form of `path`, without resolving symlinks
fn absolute_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn allocated_bytes(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.blocks() * STAT_BLOCK_SIZE
}

#[cfg(not(unix))]
fn allocated_bytes(metadata: &Metadata) -> u64 {
    metadata.len().div_ceil(STAT_BLOCK_SIZE) * STAT_BLOCK_SIZE
}
