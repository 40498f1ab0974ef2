//! Export records as listed on the dashboard's download page

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the download page
///
/// # Examples
///
/// ```
/// use dashport::domain::record::ExportRecord;
/// use chrono::NaiveDate;
///
/// let record = ExportRecord::new("Health-1_20250102", "2025-01-02 14:31:07", "导出成功");
/// assert_eq!(record.base_title(), "Health-1");
/// assert_eq!(record.date(), NaiveDate::from_ymd_opt(2025, 1, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Export title, usually `<topic name>_<suffix>`
    pub title: String,

    /// Creation time text, `YYYY-MM-DD HH:MM:SS`
    pub time: String,

    /// Raw status text
    pub status: String,
}

impl ExportRecord {
    /// Create a record, trimming surrounding whitespace
    pub fn new(
        title: impl Into<String>,
        time: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_string(),
            time: time.into().trim().to_string(),
            status: status.into().trim().to_string(),
        }
    }

    /// Calendar date of the record, from the first ten characters of `time`
    pub fn date(&self) -> Option<NaiveDate> {
        let head = self.time.get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// Creation time, if `time` is `YYYY-MM-DD HH:MM:SS`
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%d %H:%M:%S").ok()
    }

    /// Whether the record was created on `date` or later
    pub fn is_since(&self, date: NaiveDate) -> bool {
        self.date().is_some_and(|d| d >= date)
    }

    /// Title up to the first underscore
    pub fn base_title(&self) -> &str {
        self.title.split('_').next().unwrap_or("")
    }

    /// Exact match used by the status poll
    pub fn matches_topic(&self, topic_name: &str) -> bool {
        self.base_title() == topic_name
    }

    /// Prefix match used when selecting rows for the batch download
    pub fn belongs_to(&self, topic_name: &str) -> bool {
        self.title.starts_with(topic_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_date() {
        let record = ExportRecord::new("A_1", " 2025-01-02 09:00:00 ", "ok");
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2025, 1, 2));
        assert!(record.is_since(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()));
        assert!(!record.is_since(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()));
    }

    #[test]
    fn test_record_date_malformed() {
        assert_eq!(ExportRecord::new("A", "yesterday", "ok").date(), None);
        assert_eq!(ExportRecord::new("A", "", "ok").date(), None);
        assert!(!ExportRecord::new("A", "", "ok").is_since(NaiveDate::MIN));
    }

    #[test]
    fn test_record_since_and_created_at() {
        let record = ExportRecord::new("A_1", "2025-01-03 00:00:40", "ok");
        let jan_2 = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(record.is_since(jan_2));
        assert!(!record.is_since(NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()));
        assert_eq!(
            record.created_at(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap().and_hms_opt(0, 0, 40)
        );
        assert_eq!(ExportRecord::new("A", "2025-01-03", "ok").created_at(), None);
    }

    #[test]
    fn test_topic_matching() {
        let record = ExportRecord::new("Health-1_20250102_1", "2025-01-02 09:00:00", "ok");
        assert!(record.matches_topic("Health-1"));
        assert!(!record.matches_topic("Health"));
        assert!(record.belongs_to("Health"));
        assert!(record.belongs_to("Health-1"));
    }

    #[test]
    fn test_title_without_underscore() {
        let record = ExportRecord::new("Health-main", "2025-01-02 09:00:00", "ok");
        assert_eq!(record.base_title(), "Health-main");
        assert!(record.matches_topic("Health-main"));
    }
}
