//! Clock abstraction and cache time buckets.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

/// Source of "now". Injected so cache and TTL behaviour can be tested
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Fixed-width time bucket used to key cached renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucket {
    width: Duration,
}

impl TimeBucket {
    /// Bucket widths below one minute are raised to one minute.
    pub fn new(width: Duration) -> Self {
        Self {
            width: width.max(Duration::minutes(1)),
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    /// Start of the bucket containing `t`.
    pub fn floor(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let width = self.width.num_seconds();
        let secs = t.timestamp();
        let start = secs - secs.rem_euclid(width);
        Utc.timestamp_opt(start, 0).single().unwrap_or(t)
    }

    /// Bucket start formatted as `YYYYMMDDTHHMM`.
    pub fn label(&self, t: DateTime<Utc>) -> String {
        self.floor(t).format("%Y%m%dT%H%M").to_string()
    }
}

impl Default for TimeBucket {
    fn default() -> Self {
        Self::minutes(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_floor_to_half_hour() {
        let bucket = TimeBucket::minutes(30);
        assert_eq!(bucket.floor(at(10, 0, 0)), at(10, 0, 0));
        assert_eq!(bucket.floor(at(10, 29, 59)), at(10, 0, 0));
        assert_eq!(bucket.floor(at(10, 30, 0)), at(10, 30, 0));
        assert_eq!(bucket.floor(at(10, 47, 12)), at(10, 30, 0));
    }

    #[test]
    fn test_label_format() {
        let bucket = TimeBucket::minutes(30);
        assert_eq!(bucket.label(at(9, 44, 0)), "20250314T0930");
    }

    #[test]
    fn test_same_bucket_same_label() {
        let bucket = TimeBucket::default();
        assert_eq!(bucket.label(at(14, 31, 0)), bucket.label(at(14, 59, 59)));
        assert_ne!(bucket.label(at(14, 29, 0)), bucket.label(at(14, 31, 0)));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(at(1, 0, 0));
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), at(2, 30, 0));
        clock.set(at(5, 0, 0));
        assert_eq!(clock.now(), at(5, 0, 0));
    }
}
