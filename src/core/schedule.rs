//! Launch scheduler
//!
//! Decides whether a run may start now and, if not, sleeps until it may. A run
//! is eligible on a workday that has no completed run yet, once the local time
//! has reached the trigger time.

use crate::core::calendar::WorkCalendar;
use crate::core::clock::Clock;
use crate::config::ScheduleConfig;
use crate::core::state::ExecutionLedger;
use crate::domain::{DashportError, Result};
use chrono::{NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one schedule evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// A run may start now
    Ready,
    /// Not yet
    Wait {
        /// Next eligible start
        until: NaiveDateTime,
        /// Time left until `until`
        remaining: Duration,
    },
}

/// Workday + trigger-time gate
pub struct LaunchScheduler {
    calendar: WorkCalendar,
    trigger: NaiveTime,
    sleep_slice: Duration,
    clock: Arc<dyn Clock>,
}

impl LaunchScheduler {
    /// Create a scheduler
    ///
    /// # Arguments
    ///
    /// * `calendar` - Workday calendar
    /// * `trigger` - Daily trigger time (local)
    /// * `sleep_slice` - Longest single sleep before re-evaluating
    /// * `clock` - Time source
    pub fn new(
        calendar: WorkCalendar,
        trigger: NaiveTime,
        sleep_slice: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            trigger,
            sleep_slice: sleep_slice.max(Duration::from_secs(1)),
            clock,
        }
    }

    /// Build a scheduler from the `[schedule]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the trigger time is malformed
    pub fn from_config(config: &ScheduleConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let trigger = config.trigger().map_err(DashportError::Configuration)?;
        Ok(Self::new(
            WorkCalendar::new(config.holidays.iter().copied()),
            trigger,
            config.sleep_slice(),
            clock,
        ))
    }

    /// Calendar used by the scheduler
    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// Daily trigger time
    pub fn trigger(&self) -> NaiveTime {
        self.trigger
    }

    /// Evaluate the gate at `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use dashport::core::calendar::WorkCalendar;
    /// use dashport::core::clock::SystemClock;
    /// use dashport::core::schedule::{LaunchScheduler, Readiness};
    /// use chrono::{NaiveDate, NaiveTime};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let scheduler = LaunchScheduler::new(
    ///     WorkCalendar::default(),
    ///     NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ///     Duration::from_secs(60),
    ///     Arc::new(SystemClock),
    /// );
    /// // Thursday 2025-01-02 at 15:00, nothing run yet
    /// let now = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(15, 0, 0).unwrap();
    /// assert_eq!(scheduler.evaluate(now, false), Readiness::Ready);
    /// ```
    pub fn evaluate(&self, now: NaiveDateTime, has_run_today: bool) -> Readiness {
        let today = now.date();
        let eligible_today = self.calendar.is_workday(today) && !has_run_today;

        let until = if eligible_today {
            if now.time() >= self.trigger {
                return Readiness::Ready;
            }
            today.and_time(self.trigger)
        } else {
            self.calendar.next_workday(today).and_time(self.trigger)
        };

        Readiness::Wait {
            until,
            remaining: (until - now).to_std().unwrap_or(Duration::ZERO),
        }
    }

    /// Next eligible start as seen from now
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read
    pub fn next_run(&self, ledger: &ExecutionLedger) -> Result<Option<NaiveDateTime>> {
        let now = self.clock.now();
        Ok(match self.evaluate(now, ledger.has_run_today()?) {
            Readiness::Ready => None,
            Readiness::Wait { until, .. } => Some(until),
        })
    }

    /// Sleep until a run is eligible
    ///
    /// Sleeps in slices of at most `sleep_slice` and re-reads both the clock
    /// and the ledger after every slice, so a suspended machine or a run
    /// recorded by someone else is noticed.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read
    pub async fn wait_until_ready(&self, ledger: &ExecutionLedger) -> Result<()> {
        let mut announced: Option<NaiveDateTime> = None;

        loop {
            let now = self.clock.now();
            match self.evaluate(now, ledger.has_run_today()?) {
                Readiness::Ready => {
                    tracing::info!(now = %now.format("%Y-%m-%d %H:%M:%S"), "Schedule reached, starting run");
                    return Ok(());
                }
                Readiness::Wait { until, remaining } => {
                    if announced != Some(until) {
                        tracing::info!(
                            next_run = %until.format("%Y-%m-%d %H:%M"),
                            wait_minutes = remaining.as_secs() / 60,
                            "Waiting for next eligible run"
                        );
                        announced = Some(until);
                    }
                    let slice = remaining.min(self.sleep_slice);
                    // A zero remaining time can only be a rounding artifact
                    self.clock.sleep(slice.max(Duration::from_millis(1))).await;
                }
            }
        }
    }
}
