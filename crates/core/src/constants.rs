//! Constants used throughout the prewarm codebase
use std::time::Duration;

/// Size of one allocation unit reported by `st_blocks`
pub const STAT_BLOCK_SIZE: u64 = 512;

/// How long a memoized allocated-size entry stays valid
pub const SIZE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Trailing interval over which throughput is averaged
pub const THROUGHPUT_WINDOW: Duration = Duration::from_secs(5);

/// Minimum wall-clock time between progress flushes from one worker
pub const PROGRESS_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// How long a completed job stays visible to pollers
pub const COMPLETION_GRACE: Duration = Duration::from_secs(1);

/// Upper bound on how far a segment reaches back into its predecessor
pub const MAX_SEGMENT_OVERLAP: u64 = 1024 * 1024;

/// Segment overlap as a fraction of the segment size (1/20 = 5%)
pub const SEGMENT_OVERLAP_DIVISOR: u64 = 20;

pub const MIB: usize = 1024 * 1024;

// Defaults
pub const DEFAULT_CHUNK_SIZE: usize = MIB;
pub const DEFAULT_THREADS: usize = 2;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
