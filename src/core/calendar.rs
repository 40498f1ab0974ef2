//! Workday calendar
//!
//! A day is a workday unless it falls on a weekend or is listed as a holiday.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Weekends plus a fixed holiday set
#[derive(Debug, Clone, Default)]
pub struct WorkCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WorkCalendar {
    /// Create a calendar from a holiday set
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Whether `date` is a listed holiday
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Whether `date` is a workday
    ///
    /// # Examples
    ///
    /// ```
    /// use dashport::core::calendar::WorkCalendar;
    /// use chrono::NaiveDate;
    ///
    /// let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    /// let calendar = WorkCalendar::new([new_year]);
    /// assert!(!calendar.is_workday(new_year));
    /// ```
    pub fn is_workday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Closest workday strictly before `date`
    ///
    /// Terminates because the holiday set is finite.
    pub fn previous_workday(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date - Duration::days(1);
        while !self.is_workday(day) {
            day -= Duration::days(1);
        }
        day
    }

    /// Closest workday strictly after `date`
    pub fn next_workday(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date + Duration::days(1);
        while !self.is_workday(day) {
            day += Duration::days(1);
        }
        day
    }
}
