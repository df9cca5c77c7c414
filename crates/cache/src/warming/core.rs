//! Core cache warming engine

use super::segment::{plan_segments, Segment};
use super::tracker::ProgressTracker;
use crate::config::WarmerConfig;
use futures::stream::{FuturesUnordered, StreamExt};
use prewarm_core::{Error, Result, PROGRESS_FLUSH_INTERVAL};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

/// Warms individual files by reading them through the cache layer
#[derive(Debug, Clone)]
pub struct CacheWarmer {
    config: WarmerConfig,
}

impl CacheWarmer {
    pub fn new(config: WarmerConfig) -> Self {
        Self { config }
    }

    /// Read every byte of `path` using concurrent segment workers.
    ///
    /// All workers run to completion even when one fails; the error of the
    /// first worker to fail is returned afterwards.
    pub async fn warm_file(&self, path: &Path, progress: &Arc<ProgressTracker>) -> Result<()> {
        let file_size = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::io(path, "stat", e))?
            .len();

        let segments = plan_segments(file_size, self.config.chunk_size, self.config.threads);
        debug!(
            path = %path.display(),
            file_size,
            workers = segments.len(),
            "warming file"
        );

        let mut workers: FuturesUnordered<_> = segments
            .into_iter()
            .map(|segment| {
                let index = segment.index;
                let handle = tokio::spawn(read_segment(
                    path.to_path_buf(),
                    segment,
                    self.config.chunk_size,
                    Arc::clone(progress),
                ));
                async move { (index, handle.await) }
            })
            .collect();

        // completion order, so the first failure is the earliest one
        let mut first_error = None;
        while let Some((index, outcome)) = workers.next().await {
            let outcome = outcome
                .map_err(|e| Error::worker(path, format!("segment {index}: {e}")))
                .and_then(|read| read);
            match outcome {
                Ok(bytes) => debug!(path = %path.display(), segment = index, bytes, "segment warmed"),
                Err(err) => {
                    debug!(path = %path.display(), segment = index, error = %err, "segment failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Read one segment sequentially through its own file handle.
///
/// Hitting end-of-file early is not an error; the file may have shrunk.
async fn read_segment(
    path: PathBuf,
    segment: Segment,
    chunk_size: usize,
    progress: Arc<ProgressTracker>,
) -> Result<u64> {
    let mut file = File::open(&path)
        .await
        .map_err(|e| Error::io(&path, "open", e))?;
    file.seek(SeekFrom::Start(segment.start))
        .await
        .map_err(|e| Error::io(&path, "seek", e))?;

    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut reporter = BatchedReporter::new(&progress);
    let mut position = segment.start;
    let mut total = 0u64;

    while position < segment.end {
        let want = (segment.end - position).min(buffer.len() as u64) as usize;
        let read = file
            .read(&mut buffer[..want])
            .await
            .map_err(|e| Error::io(&path, "read", e))?;
        if read == 0 {
            break;
        }

        position += read as u64;
        total += read as u64;
        reporter.record(read as u64, Instant::now());
    }

    Ok(total)
}

/// Accumulates bytes locally and flushes them to the shared tracker at most
/// once per flush interval. Whatever is pending is flushed on drop, so error
/// paths still report what was read.
struct BatchedReporter<'a> {
    progress: &'a ProgressTracker,
    pending: u64,
    last_flush: Instant,
}

impl<'a> BatchedReporter<'a> {
    fn new(progress: &'a ProgressTracker) -> Self {
        Self {
            progress,
            pending: 0,
            last_flush: Instant::now(),
        }
    }

    fn record(&mut self, bytes: u64, now: Instant) {
        self.pending += bytes;
        if now.saturating_duration_since(self.last_flush) >= PROGRESS_FLUSH_INTERVAL {
            self.flush(now);
        }
    }

    fn flush(&mut self, now: Instant) {
        if self.pending > 0 {
            self.progress.update(self.pending, now);
            self.pending = 0;
        }
        self.last_flush = now;
    }
}

impl Drop for BatchedReporter<'_> {
    fn drop(&mut self) {
        self.flush(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MIB: usize = 1024 * 1024;

    fn make_file(dir: &TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        let pattern: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        file.write_all(&pattern).unwrap();
        path
    }

    fn warmer(chunk_size: usize, threads: usize) -> CacheWarmer {
        CacheWarmer::new(WarmerConfig {
            chunk_size,
            threads,
        })
    }

    #[tokio::test]
    async fn test_single_worker_reads_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = make_file(&dir, "small.bin", 300 * 1024);
        let progress = Arc::new(ProgressTracker::new(0));

        warmer(MIB, 4).warm_file(&path, &progress).await.unwrap();
        assert_eq!(progress.counters().bytes_read, 300 * 1024);
    }

    #[tokio::test]
    async fn test_parallel_workers_cover_file_with_overlap() {
        let dir = TempDir::new().unwrap();
        let len = 4 * MIB + 123;
        let path = make_file(&dir, "big.bin", len);
        let progress = Arc::new(ProgressTracker::new(0));

        warmer(256 * 1024, 4).warm_file(&path, &progress).await.unwrap();

        let expected: u64 = plan_segments(len as u64, 256 * 1024, 4)
            .iter()
            .map(Segment::len)
            .sum();
        let read = progress.counters().bytes_read;
        assert_eq!(read, expected);
        assert!(read >= len as u64);
    }

    #[tokio::test]
    async fn test_empty_file_reports_nothing() {
        let dir = TempDir::new().unwrap();
        let path = make_file(&dir, "empty", 0);
        let progress = Arc::new(ProgressTracker::new(0));

        warmer(MIB, 2).warm_file(&path, &progress).await.unwrap();
        assert_eq!(progress.counters().bytes_read, 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let progress = Arc::new(ProgressTracker::new(0));

        let err = warmer(MIB, 2)
            .warm_file(&dir.path().join("gone"), &progress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { operation: "stat", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_workers_report_an_error_after_all_finish() {
        let dir = TempDir::new().unwrap();
        make_file(&dir, "entry", 16);
        let progress = Arc::new(ProgressTracker::new(0));
        let len = std::fs::metadata(dir.path()).unwrap().len();
        assert!(len > 0);

        // a directory opens fine but every segment read fails
        let err = warmer(1, 2)
            .warm_file(dir.path(), &progress)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Io { operation: "read", .. }),
            "unexpected error {err:?} for size {len}"
        );
        assert_eq!(progress.counters().bytes_read, 0);
    }

    #[tokio::test]
    async fn test_segment_past_eof_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = make_file(&dir, "shrunk", 1000);
        let progress = Arc::new(ProgressTracker::new(0));

        let segment = Segment {
            index: 0,
            start: 500,
            end: 10_000,
        };
        let read = read_segment(path, segment, 128, Arc::clone(&progress))
            .await
            .unwrap();
        assert_eq!(read, 500);
        assert_eq!(progress.counters().bytes_read, 500);
    }

    #[test]
    fn test_reporter_batches_until_interval() {
        let progress = ProgressTracker::new(0);
        let t0 = Instant::now();
        {
            let mut reporter = BatchedReporter::new(&progress);
            reporter.last_flush = t0;
            reporter.record(10, t0);
            reporter.record(10, t0 + PROGRESS_FLUSH_INTERVAL / 2);
            assert_eq!(progress.counters().bytes_read, 0);

            reporter.record(10, t0 + PROGRESS_FLUSH_INTERVAL);
            assert_eq!(progress.counters().bytes_read, 30);

            reporter.record(5, t0 + PROGRESS_FLUSH_INTERVAL + PROGRESS_FLUSH_INTERVAL / 2);
            assert_eq!(progress.counters().bytes_read, 30);
        }
        // remainder flushed on drop
        assert_eq!(progress.counters().bytes_read, 35);
    }
}
