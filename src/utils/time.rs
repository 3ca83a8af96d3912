//! Time utilities

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Format an elapsed wall time as a human-readable string
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();

    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        let seconds = elapsed.as_secs();
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let remaining_seconds = seconds % 60;
        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, remaining_seconds)
        } else {
            format!("{}m {}s", minutes, remaining_seconds)
        }
    }
}

/// Wall time between two timestamps, zero if `end` precedes `start`
pub fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or_default()
}
