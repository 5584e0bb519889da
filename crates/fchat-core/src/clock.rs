#![forbid(unsafe_code)]

//! Wall-clock timestamps for message records.
//!
//! Records carry ISO-8601 UTC strings with millisecond precision
//! (`2024-05-01T12:00:00.000Z`). The [`Clock`] trait lets hosts and tests
//! control the source of "now": [`SystemClock`] reads the real wall clock
//! (wasm-safe through `web-time`), [`ManualClock`] is deterministic.

use std::cell::Cell;
use std::fmt;

use time::OffsetDateTime;
use time::macros::format_description;

const EPOCH_ISO: &str = "1970-01-01T00:00:00.000Z";

/// Source of "now" for record timestamps.
pub trait Clock: fmt::Debug {
    /// Current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Current time formatted as an ISO-8601 UTC string.
    fn now_iso8601(&self) -> String {
        format_iso8601(self.now_millis())
    }
}

/// Format Unix milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Out-of-range inputs format as the epoch.
#[must_use]
pub fn format_iso8601(millis: i64) -> String {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|dt| dt.format(format).ok())
        .unwrap_or_else(|| EPOCH_ISO.to_string())
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Deterministic clock: returns a fixed time that advances by `step_ms`
/// after every read.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<i64>,
    step_ms: i64,
}

impl ManualClock {
    /// Create a clock starting at `start_ms` that does not advance on read.
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step_ms: 0,
        }
    }

    /// Advance automatically by `step_ms` after every read.
    #[must_use]
    pub fn with_step(mut self, step_ms: i64) -> Self {
        self.step_ms = step_ms;
        self
    }

    /// Set the current time.
    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    /// Advance the current time by `dt_ms`.
    pub fn advance(&self, dt_ms: i64) {
        self.now.set(self.now.get().saturating_add(dt_ms));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step_ms));
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_with_millis() {
        assert_eq!(format_iso8601(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_iso8601(1_500), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn formats_known_date() {
        // 2024-01-02T03:04:05.006Z
        assert_eq!(format_iso8601(1_704_164_645_006), "2024-01-02T03:04:05.006Z");
    }

    #[test]
    fn manual_clock_steps_after_each_read() {
        let clock = ManualClock::new(1_000).with_step(10);
        assert_eq!(clock.now_millis(), 1_000);
        assert_eq!(clock.now_millis(), 1_010);
        clock.advance(100);
        assert_eq!(clock.now_millis(), 1_120);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
        assert!(SystemClock.now_iso8601().ends_with('Z'));
    }
}
