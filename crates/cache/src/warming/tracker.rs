//! Per-job progress counters and sliding-window throughput

use parking_lot::Mutex;
use prewarm_core::THROUGHPUT_WINDOW;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct SpeedSample {
    bytes: u64,
    at: Instant,
}

#[derive(Debug)]
struct ProgressState {
    total_size: u64,
    bytes_read: u64,
    current_speed: f64,
    cached_size: u64,
    complete: bool,
    expires_at: Option<Instant>,
    window: VecDeque<SpeedSample>,
}

/// Consistent copy of a tracker's counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressCounters {
    pub total_size: u64,
    pub bytes_read: u64,
    pub current_speed: f64,
    pub cached_size: u64,
    pub is_complete: bool,
}

/// Hot counters of one job, shared by every worker warming part of it.
///
/// `update` is the only way to move the byte counters and throughput, and
/// every read goes through `counters`, so both always observe a consistent
/// state.
#[derive(Debug)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    window: Duration,
}

impl ProgressTracker {
    pub fn new(total_size: u64) -> Self {
        Self::with_window(total_size, THROUGHPUT_WINDOW)
    }

    pub fn with_window(total_size: u64, window: Duration) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                total_size,
                bytes_read: 0,
                current_speed: 0.0,
                cached_size: 0,
                complete: false,
                expires_at: None,
                window: VecDeque::new(),
            }),
            window,
        }
    }

    /// Record `bytes` read by a worker at `now`.
    ///
    /// Samples older than the window are dropped and throughput is recomputed
    /// from what remains. When the retained samples span no time, the previous
    /// throughput is kept rather than reset to zero.
    pub fn update(&self, bytes: u64, now: Instant) {
        let mut state = self.state.lock();
        state.bytes_read += bytes;
        state.cached_size += bytes;

        state.window.push_back(SpeedSample { bytes, at: now });
        let window = self.window;
        // workers flush with their own clocks, so samples may arrive out of order
        state
            .window
            .retain(|sample| now.saturating_duration_since(sample.at) < window);

        let oldest = state.window.iter().map(|sample| sample.at).min();
        if let Some(oldest) = oldest {
            let span = now.saturating_duration_since(oldest).as_secs_f64();
            if span > 0.0 {
                let retained: u64 = state.window.iter().map(|sample| sample.bytes).sum();
                state.current_speed = retained as f64 / span;
            }
        }
    }

    /// Mark the job finished; it stays visible until `now + grace`
    pub fn finish(&self, now: Instant, grace: Duration) {
        let mut state = self.state.lock();
        state.complete = true;
        state.expires_at = Some(now + grace);
    }

    /// True once a finished job's grace period has elapsed
    pub fn is_expired(&self, now: Instant) -> bool {
        self.state
            .lock()
            .expires_at
            .is_some_and(|expires_at| now >= expires_at)
    }

    pub fn counters(&self) -> ProgressCounters {
        let state = self.state.lock();
        ProgressCounters {
            total_size: state.total_size,
            bytes_read: state.bytes_read,
            current_speed: state.current_speed,
            cached_size: state.cached_size,
            is_complete: state.complete,
        }
    }
}
