use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, negative for times before it
pub fn unix_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Modification time of `metadata` in Unix seconds, 0 when the platform has none
pub fn modified_seconds(metadata: &Metadata) -> f64 {
    metadata.modified().map(unix_seconds).unwrap_or(0.0)
}
