//! Wall-clock and sleep capability
//!
//! Everything that reads the time or waits goes through [`Clock`], so the
//! scheduler and the export loop can run against virtual time in tests.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::sync::Mutex;
use std::time::Duration;

/// Source of local time and of sleeps
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Current local date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// The real clock: local time and `tokio::time::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock whose time only moves when told to or when slept on
///
/// `sleep` returns immediately and advances the clock by the requested
/// duration. Every sleep is recorded.
///
/// ```
/// use dashport::core::clock::{Clock, ManualClock};
/// use chrono::NaiveDate;
/// use std::time::Duration;
///
/// let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(13, 0, 0).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now(), start + chrono::Duration::seconds(60));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::days(36_500));
    }

    /// Jump to a point in time
    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Durations passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sum of all sleeps
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}
