//! Server-wide command cooldowns.
//!
//! A [`Cooldown`] admits at most one run per window. The check and the
//! timestamp update are a single compare-and-swap, so two racing callers can
//! never both get through.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

const NEVER: i64 = i64::MIN;

#[derive(Debug)]
pub struct Cooldown {
    name: &'static str,
    window_ms: i64,
    last_run_ms: AtomicI64,
}

impl Cooldown {
    pub fn new(name: &'static str, window: Duration) -> Self {
        Self {
            name,
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            last_run_ms: AtomicI64::new(NEVER),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms.unsigned_abs())
    }

    /// Try to start a run at `now`.
    ///
    /// On success the window restarts at `now`. On failure returns how long
    /// until the next run is admitted.
    pub fn attempt(&self, now: DateTime<Utc>) -> Result<(), Duration> {
        let now_ms = now.timestamp_millis();
        let mut last = self.last_run_ms.load(Ordering::Acquire);
        loop {
            if last != NEVER {
                let elapsed = now_ms.saturating_sub(last);
                if elapsed < self.window_ms {
                    let remaining = self.window_ms - elapsed.max(0);
                    return Err(Duration::from_millis(remaining.unsigned_abs()));
                }
            }
            match self.last_run_ms.compare_exchange(
                last,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => last = actual,
            }
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        match self.last_run_ms.load(Ordering::Acquire) {
            NEVER => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Restore a persisted last-run timestamp (milliseconds since the epoch).
    pub fn restore(&self, last_run_ms: i64) {
        self.last_run_ms.store(last_run_ms, Ordering::Release);
    }
}

/// The cooldowns the engine enforces.
#[derive(Debug)]
pub struct Cooldowns {
    pub restart: Cooldown,
    pub clean: Cooldown,
}

impl Cooldowns {
    pub fn new(restart: Duration, clean: Duration) -> Self {
        Self {
            restart: Cooldown::new("restart", restart),
            clean: Cooldown::new("clean", clean),
        }
    }
}

/// Compact human-readable duration, e.g. "9m 58s".
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs() + u64::from(d.subsec_millis() > 0);
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m {s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn first_attempt_always_succeeds() {
        let c = Cooldown::new("t", Duration::from_secs(10));
        assert!(c.last_run().is_none());
        assert!(c.attempt(Utc::now()).is_ok());
        assert!(c.last_run().is_some());
    }

    #[test]
    fn window_is_exclusive_at_the_boundary() {
        let c = Cooldown::new("t", Duration::from_secs(10));
        let t0 = Utc::now();
        c.attempt(t0).unwrap();

        let remaining = c.attempt(t0 + TimeDelta::seconds(4)).unwrap_err();
        assert_eq!(remaining, Duration::from_secs(6));
        assert!(c.attempt(t0 + TimeDelta::seconds(10)).is_ok());
    }

    #[test]
    fn restore_applies_persisted_timestamp() {
        let c = Cooldown::new("t", Duration::from_secs(600));
        let t0 = Utc::now();
        c.restore((t0 - TimeDelta::seconds(60)).timestamp_millis());
        assert_eq!(c.attempt(t0).unwrap_err(), Duration::from_secs(540));
    }

    #[test]
    fn racing_attempts_admit_one() {
        let c = std::sync::Arc::new(Cooldown::new("t", Duration::from_secs(60)));
        let now = Utc::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || c.attempt(now).is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn format_duration_rounds_up() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_millis(4_100)), "5s");
        assert_eq!(format_duration(Duration::from_secs(600)), "10m");
        assert_eq!(format_duration(Duration::from_secs(598)), "9m 58s");
    }
}
