//! Partitioning of one file into overlapping read ranges

use prewarm_core::{MAX_SEGMENT_OVERLAP, SEGMENT_OVERLAP_DIVISOR};

/// Byte range `[start, end)` read by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of workers actually used for a file.
///
/// Files smaller than one chunk per worker are read by a single worker.
pub fn effective_threads(file_size: u64, chunk_size: usize, threads: usize) -> usize {
    let threads = threads.max(1);
    let parallel_floor = (chunk_size as u64).saturating_mul(threads as u64);
    if file_size < parallel_floor {
        1
    } else {
        threads
    }
}

/// Overlap applied to every segment after the first: 5% of the segment, capped at 1 MiB
pub fn segment_overlap(segment_size: u64) -> u64 {
    (segment_size / SEGMENT_OVERLAP_DIVISOR).min(MAX_SEGMENT_OVERLAP)
}

/// Split `file_size` bytes into per-worker segments.
///
/// Segments are `file_size / threads` long, the last one absorbs the
/// remainder, and each segment after the first starts `overlap` bytes before
/// its nominal boundary so neighbouring readers never leave a gap in the
/// cache layer's readahead.
pub fn plan_segments(file_size: u64, chunk_size: usize, threads: usize) -> Vec<Segment> {
    let threads = effective_threads(file_size, chunk_size, threads);
    let segment_size = file_size / threads as u64;
    let overlap = segment_overlap(segment_size);

    (0..threads)
        .map(|index| {
            let nominal_start = index as u64 * segment_size;
            let start = if index == 0 {
                0
            } else {
                nominal_start.saturating_sub(overlap)
            };
            let end = if index == threads - 1 {
                file_size
            } else {
                (index as u64 + 1) * segment_size
            };
            Segment { index, start, end }
        })
        .collect()
}
