//! Filter time window of a run

use crate::core::calendar::WorkCalendar;
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Format the dashboard's date pickers accept
pub const WINDOW_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Start and end of the data window exported by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    /// Previous workday at the trigger time
    pub start: NaiveDateTime,
    /// Today at the trigger time, or now (to the minute) before the trigger
    pub end: NaiveDateTime,
}

impl RunWindow {
    /// Compute the window for a run starting at `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use dashport::core::calendar::WorkCalendar;
    /// use dashport::core::export::window::RunWindow;
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let now = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap().and_hms_opt(15, 20, 11).unwrap();
    /// let trigger = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
    /// let window = RunWindow::compute(now, trigger, &WorkCalendar::default());
    /// assert_eq!(window.start_text(), "2025/01/03 14:00:00");
    /// assert_eq!(window.end_text(), "2025/01/06 14:00:00");
    /// ```
    pub fn compute(now: NaiveDateTime, trigger: NaiveTime, calendar: &WorkCalendar) -> Self {
        let today = now.date();
        let start = calendar.previous_workday(today).and_time(trigger);

        let now_minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let trigger_today = today.and_time(trigger);
        let end = if now_minute > trigger_today {
            trigger_today
        } else {
            now_minute
        };

        Self { start, end }
    }

    /// Whether start <= end
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Start in picker format
    pub fn start_text(&self) -> String {
        self.start.format(WINDOW_FORMAT).to_string()
    }

    /// End in picker format
    pub fn end_text(&self) -> String {
        self.end.format(WINDOW_FORMAT).to_string()
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_text(), self.end_text())
    }
}

/// Parse a picker value back into a timestamp
pub fn parse_window_text(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), WINDOW_FORMAT).ok()
}
