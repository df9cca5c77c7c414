//! Directory traversal feeding files to the warmer

use super::job::Job;
use crate::warming::CacheWarmer;
use prewarm_core::Error;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files queued ahead of the warmer while the walk runs
const FILE_QUEUE_DEPTH: usize = 64;

/// Outcome counts of one directory job
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalSummary {
    pub files_warmed: usize,
    pub files_failed: usize,
    pub enumeration_failures: usize,
}

/// Warm every regular file beneath the job's root, one file at a time.
///
/// The walk runs on the blocking pool and streams paths in enumeration
/// order. Symlinks and special files are skipped. Failures are logged and
/// never stop the remaining files.
pub async fn warm_tree(warmer: &CacheWarmer, job: &Job) -> TraversalSummary {
    let (tx, mut rx) = mpsc::channel(FILE_QUEUE_DEPTH);
    let root = job.root().to_path_buf();
    let walker = tokio::task::spawn_blocking(move || enumerate_files(&root, &tx));

    let mut summary = TraversalSummary::default();
    while let Some(path) = rx.recv().await {
        match warmer.warm_file(&path, job.progress()).await {
            Ok(()) => {
                summary.files_warmed += 1;
                debug!(path = %path.display(), "file warmed");
            }
            Err(err) => {
                summary.files_failed += 1;
                warn!(path = %path.display(), error = %err, "failed to warm file");
            }
        }
    }

    summary.enumeration_failures = match walker.await {
        Ok(failures) => failures,
        Err(e) => {
            warn!(root = %job.root().display(), error = %e, "directory walk aborted");
            1
        }
    };
    summary
}

/// Send every regular file under `root` to `tx`; returns the number of
/// entries that could not be read.
fn enumerate_files(root: &Path, tx: &mpsc::Sender<PathBuf>) -> usize {
    let mut failures = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures += 1;
                let err = Error::partial_enumeration(e.path().unwrap_or(root), e.to_string());
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if tx.blocking_send(entry.into_path()).is_err() {
            // receiver gone, nobody left to warm
            break;
        }
    }
    failures
}
