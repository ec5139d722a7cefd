//! When to run the cache sweep.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Decides, at the start of a request, whether the cache sweep runs.
pub trait SweepPolicy: Send + Sync {
    fn should_sweep(&self, now: DateTime<Utc>) -> bool;
}

/// Sweep on a random fraction `p` of requests.
#[derive(Debug, Clone, Copy)]
pub struct Probabilistic {
    p: f64,
}

impl Probabilistic {
    /// `p` is clamped to `0.0..=1.0`; NaN counts as zero.
    pub fn new(p: f64) -> Self {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        Self { p }
    }

    pub fn probability(&self) -> f64 {
        self.p
    }
}

impl SweepPolicy for Probabilistic {
    fn should_sweep(&self, _now: DateTime<Utc>) -> bool {
        rand::thread_rng().gen_bool(self.p)
    }
}

/// Sweep when at least `every` has passed since the last sweep.
#[derive(Debug)]
pub struct Interval {
    every: Duration,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Interval {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last: Mutex::new(None),
        }
    }
}

impl SweepPolicy for Interval {
    fn should_sweep(&self, now: DateTime<Utc>) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(at) if now - at < self.every => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl SweepPolicy for Always {
    fn should_sweep(&self, _now: DateTime<Utc>) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl SweepPolicy for Never {
    fn should_sweep(&self, _now: DateTime<Utc>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_probability_extremes() {
        let now = Utc::now();
        assert!((0..100).all(|_| Probabilistic::new(1.0).should_sweep(now)));
        assert!((0..100).all(|_| !Probabilistic::new(0.0).should_sweep(now)));
        assert_eq!(Probabilistic::new(7.0).probability(), 1.0);
        assert_eq!(Probabilistic::new(f64::NAN).probability(), 0.0);
    }

    #[test]
    fn test_interval() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let policy = Interval::new(Duration::minutes(10));
        assert!(policy.should_sweep(t0));
        assert!(!policy.should_sweep(t0 + Duration::minutes(9)));
        assert!(policy.should_sweep(t0 + Duration::minutes(10)));
        assert!(!policy.should_sweep(t0 + Duration::minutes(15)));
    }

    #[test]
    fn test_fixed_policies() {
        assert!(Always.should_sweep(Utc::now()));
        assert!(!Never.should_sweep(Utc::now()));
    }
}
