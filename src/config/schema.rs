//! Configuration schema types
//!
//! This module defines the configuration structure for Dashport. Every section
//! has serde defaults so a configuration file only needs to name what differs.

use crate::adapters::actuator::Selector;
use crate::config::SecretString;
use crate::domain::topic::{Topic, TopicTable};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Main Dashport configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Dashboard endpoints and browser session settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Daily trigger time and holidays
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Retry budgets and wait times
    #[serde(default)]
    pub export: ExportConfig,

    /// Status keywords shown by the dashboard
    #[serde(default)]
    pub status_text: StatusTextConfig,

    /// Topics to export
    #[serde(default)]
    pub topics: Vec<TopicConfig>,

    /// UI selectors
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Download folder and archive naming
    #[serde(default)]
    pub downloads: DownloadsConfig,

    /// Execution ledger location
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.dashboard.validate()?;
        self.schedule.validate()?;
        self.export.validate()?;
        self.status_text.validate()?;
        self.topic_table()?;
        self.selectors.validate()?;
        self.downloads.validate()?;
        self.ledger.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Build the topic table from the `[[topics]]` entries
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty or has duplicates
    pub fn topic_table(&self) -> Result<TopicTable, String> {
        TopicTable::new(
            self.topics
                .iter()
                .map(|t| Topic::new(t.id, t.name.clone(), t.folder.clone()))
                .collect(),
        )
        .map_err(|e| format!("topics: {e}"))
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A session cookie injected before the first navigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,

    /// Cookie value
    /// Stored securely in memory and automatically zeroized on drop
    pub value: SecretString,

    /// Cookie domain (e.g. ".example.com")
    #[serde(default)]
    pub domain: Option<String>,

    /// Cookie path
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

/// Dashboard and browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the dashboard
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the download-records page
    #[serde(default = "default_downloads_path")]
    pub downloads_path: String,

    /// Path of the topic-selection page
    #[serde(default = "default_topics_path")]
    pub topics_path: String,

    /// WebDriver endpoint (chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Browser executable; `DASHPORT_BROWSER_BINARY` takes precedence
    #[serde(default)]
    pub browser_binary: Option<String>,

    /// Run the browser without a window
    #[serde(default)]
    pub headless: bool,

    /// Extra browser command-line switches
    #[serde(default = "default_browser_args")]
    pub browser_args: Vec<String>,

    /// Window width in pixels
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Window height in pixels
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Default timeout for element lookups and navigation, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Session cookies
    #[serde(default)]
    pub cookies: Vec<CookieConfig>,
}

impl DashboardConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let base = url::Url::parse(&self.base_url)
            .map_err(|e| format!("dashboard.base_url '{}' is invalid: {e}", self.base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err("dashboard.base_url must start with http:// or https://".to_string());
        }

        url::Url::parse(&self.webdriver_url).map_err(|e| {
            format!(
                "dashboard.webdriver_url '{}' is invalid: {e}",
                self.webdriver_url
            )
        })?;

        for (name, path) in [
            ("downloads_path", &self.downloads_path),
            ("topics_path", &self.topics_path),
        ] {
            if !path.starts_with('/') {
                return Err(format!("dashboard.{name} must start with '/', got '{path}'"));
            }
        }

        if self.window_width == 0 || self.window_height == 0 {
            return Err("dashboard window size must be > 0".to_string());
        }

        if self.default_timeout_ms == 0 {
            return Err("dashboard.default_timeout_ms must be > 0".to_string());
        }

        for cookie in &self.cookies {
            if cookie.name.trim().is_empty() {
                return Err("dashboard.cookies entries need a name".to_string());
            }
            if cookie.value.expose_secret().is_blank() {
                return Err(format!("dashboard cookie '{}' has an empty value", cookie.name));
            }
        }

        Ok(())
    }

    /// Absolute URL of the download-records page
    pub fn downloads_url(&self) -> String {
        join_url(&self.base_url, &self.downloads_path)
    }

    /// Absolute URL of the topic-selection page
    pub fn topics_url(&self) -> String {
        join_url(&self.base_url, &self.topics_path)
    }

    /// Browser binary, preferring the `DASHPORT_BROWSER_BINARY` environment variable
    pub fn resolved_browser_binary(&self) -> Option<String> {
        std::env::var("DASHPORT_BROWSER_BINARY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.browser_binary.clone())
    }

    /// Default element/navigation timeout
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            downloads_path: default_downloads_path(),
            topics_path: default_topics_path(),
            webdriver_url: default_webdriver_url(),
            browser_binary: None,
            headless: false,
            browser_args: default_browser_args(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            default_timeout_ms: default_timeout_ms(),
            cookies: Vec::new(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Daily trigger time, `HH:MM` local time
    #[serde(default = "default_trigger_time")]
    pub trigger_time: String,

    /// Non-working days (`YYYY-MM-DD`)
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,

    /// Longest single sleep while waiting for the trigger, in seconds
    #[serde(default = "default_sleep_slice_seconds")]
    pub sleep_slice_seconds: u64,
}

impl ScheduleConfig {
    fn validate(&self) -> Result<(), String> {
        self.trigger()?;

        if self.sleep_slice_seconds == 0 || self.sleep_slice_seconds > 3600 {
            return Err(format!(
                "schedule.sleep_slice_seconds must be between 1 and 3600, got {}",
                self.sleep_slice_seconds
            ));
        }

        if let Some((first, days)) = longest_holiday_run(&self.holiday_set()) {
            if days > MAX_DAYS_WITHOUT_WORKDAY {
                return Err(format!(
                    "schedule.holidays leave {days} consecutive days without a workday starting {first} (max {MAX_DAYS_WITHOUT_WORKDAY})"
                ));
            }
        }

        Ok(())
    }

    /// Parsed trigger time
    ///
    /// # Errors
    ///
    /// Returns an error if `trigger_time` is not `HH:MM`
    pub fn trigger(&self) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(self.trigger_time.trim(), "%H:%M").map_err(|e| {
            format!(
                "schedule.trigger_time '{}' must be HH:MM: {e}",
                self.trigger_time
            )
        })
    }

    /// Holidays as an ordered set
    pub fn holiday_set(&self) -> BTreeSet<NaiveDate> {
        self.holidays.iter().copied().collect()
    }

    /// Longest single sleep while waiting
    pub fn sleep_slice(&self) -> Duration {
        Duration::from_secs(self.sleep_slice_seconds)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            trigger_time: default_trigger_time(),
            holidays: Vec::new(),
            sleep_slice_seconds: default_sleep_slice_seconds(),
        }
    }
}

/// Longest stretch of consecutive non-workdays allowed by validation
pub const MAX_DAYS_WITHOUT_WORKDAY: i64 = 31;

/// Longest run of consecutive non-workdays around the holidays
///
/// Returns the first day of the run and its length.
fn longest_holiday_run(holidays: &BTreeSet<NaiveDate>) -> Option<(NaiveDate, i64)> {
    use chrono::{Datelike, Weekday};

    let off = |d: NaiveDate| {
        matches!(d.weekday(), Weekday::Sat | Weekday::Sun) || holidays.contains(&d)
    };

    let first = *holidays.first()?;
    let last = *holidays.last()?;
    let end = last + ChronoDuration::days(2);

    let mut best: Option<(NaiveDate, i64)> = None;
    let mut current: Option<(NaiveDate, i64)> = None;
    let mut day = first - ChronoDuration::days(2);
    while day <= end {
        if off(day) {
            current = Some(match current {
                Some((start, length)) => (start, length + 1),
                None => (day, 1),
            });
        } else if let Some(run) = current.take() {
            if best.map(|(_, l)| run.1 > l).unwrap_or(true) {
                best = Some(run);
            }
        }
        day += ChronoDuration::days(1);
    }
    if let Some(run) = current {
        if best.map(|(_, l)| run.1 > l).unwrap_or(true) {
            best = Some(run);
        }
    }
    best
}

/// Export retry budgets and wait times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Attempts of the per-topic export sequence
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Attempts to launch the browser session
    #[serde(default = "default_max_retries")]
    pub launch_retries: u32,

    /// Ceiling on watching one topic's export, in minutes
    #[serde(default = "default_export_timeout_minutes")]
    pub export_timeout_minutes: u64,

    /// Progress below which polling slows down
    #[serde(default = "default_slow_progress_threshold")]
    pub slow_progress_threshold: u8,

    /// Label of the extra source picked from the nested menu
    #[serde(default = "default_extra_source")]
    pub extra_source: String,

    /// Wait times, in milliseconds
    #[serde(default)]
    pub waits: WaitConfig,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "export.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }

        if self.launch_retries == 0 || self.launch_retries > 10 {
            return Err(format!(
                "export.launch_retries must be between 1 and 10, got {}",
                self.launch_retries
            ));
        }

        if self.export_timeout_minutes == 0 {
            return Err("export.export_timeout_minutes must be > 0".to_string());
        }

        if self.slow_progress_threshold > 100 {
            return Err(format!(
                "export.slow_progress_threshold must be <= 100, got {}",
                self.slow_progress_threshold
            ));
        }

        if self.extra_source.trim().is_empty() {
            return Err("export.extra_source cannot be empty".to_string());
        }

        self.waits.validate()
    }

    /// Ceiling on watching one topic's export
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_minutes * 60)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            launch_retries: default_max_retries(),
            export_timeout_minutes: default_export_timeout_minutes(),
            slow_progress_threshold: default_slow_progress_threshold(),
            extra_source: default_extra_source(),
            waits: WaitConfig::default(),
        }
    }
}

/// Fixed waits, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    /// After navigation
    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,

    /// After clicks that animate
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,

    /// After expanding or collapsing a folder
    #[serde(default = "default_folder_expand_ms")]
    pub folder_expand_ms: u64,

    /// For a dropdown menu to appear
    #[serde(default = "default_dropdown_show_ms")]
    pub dropdown_show_ms: u64,

    /// After filling an input or toggling a checkbox
    #[serde(default = "default_input_settle_ms")]
    pub input_settle_ms: u64,

    /// Between polls while exports are below the progress threshold
    #[serde(default = "default_export_check_ms")]
    pub export_check_ms: u64,

    /// Between polls once exports passed the progress threshold
    #[serde(default = "default_fast_poll_ms")]
    pub fast_poll_ms: u64,

    /// Before retrying a failed attempt
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    /// For the batch download to land on disk
    #[serde(default = "default_file_download_ms")]
    pub file_download_ms: u64,

    /// Before retrying a failed session launch
    #[serde(default = "default_launch_retry_wait_ms")]
    pub launch_retry_wait_ms: u64,
}

impl WaitConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("export_check_ms", self.export_check_ms),
            ("fast_poll_ms", self.fast_poll_ms),
        ] {
            if value == 0 {
                return Err(format!("export.waits.{name} must be > 0"));
            }
        }
        Ok(())
    }

    /// After navigation
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    /// After clicks that animate
    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    /// After expanding or collapsing a folder
    pub fn folder_expand(&self) -> Duration {
        Duration::from_millis(self.folder_expand_ms)
    }

    /// For a dropdown menu to appear
    pub fn dropdown_show(&self) -> Duration {
        Duration::from_millis(self.dropdown_show_ms)
    }

    /// After filling an input or toggling a checkbox
    pub fn input_settle(&self) -> Duration {
        Duration::from_millis(self.input_settle_ms)
    }

    /// Slow poll interval
    pub fn export_check(&self) -> Duration {
        Duration::from_millis(self.export_check_ms)
    }

    /// Fast poll interval
    pub fn fast_poll(&self) -> Duration {
        Duration::from_millis(self.fast_poll_ms)
    }

    /// Retry backoff
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    /// Download settle time
    pub fn file_download(&self) -> Duration {
        Duration::from_millis(self.file_download_ms)
    }

    /// Session launch backoff
    pub fn launch_retry_wait(&self) -> Duration {
        Duration::from_millis(self.launch_retry_wait_ms)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            page_load_ms: default_page_load_ms(),
            animation_ms: default_animation_ms(),
            folder_expand_ms: default_folder_expand_ms(),
            dropdown_show_ms: default_dropdown_show_ms(),
            input_settle_ms: default_input_settle_ms(),
            export_check_ms: default_export_check_ms(),
            fast_poll_ms: default_fast_poll_ms(),
            retry_wait_ms: default_retry_wait_ms(),
            file_download_ms: default_file_download_ms(),
            launch_retry_wait_ms: default_launch_retry_wait_ms(),
        }
    }
}

/// Keywords used to classify the dashboard's status text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTextConfig {
    /// Substrings meaning the export succeeded
    #[serde(default = "default_success_keywords")]
    pub success: Vec<String>,

    /// Substrings meaning the export is running
    #[serde(default = "default_exporting_keywords")]
    pub exporting: Vec<String>,

    /// Substrings meaning the export failed
    #[serde(default = "default_failed_keywords")]
    pub failed: Vec<String>,
}

impl StatusTextConfig {
    fn validate(&self) -> Result<(), String> {
        if self.success.iter().all(|k| k.trim().is_empty()) {
            return Err("status_text.success needs at least one keyword".to_string());
        }
        Ok(())
    }
}

impl Default for StatusTextConfig {
    fn default() -> Self {
        Self {
            success: default_success_keywords(),
            exporting: default_exporting_keywords(),
            failed: default_failed_keywords(),
        }
    }
}

/// One `[[topics]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Topic id
    pub id: u32,

    /// Display name
    pub name: String,

    /// Folder that contains the topic in the topic tree
    pub folder: String,
}

/// UI selectors
///
/// Each value is CSS, optionally followed by `:has-text("...")` and
/// `>> child-css`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// A row of the download-records table
    pub record_row: String,
    /// Title cell, relative to a row
    pub record_title: String,
    /// Creation time cell, relative to a row
    pub record_time: String,
    /// Status cell, relative to a row
    pub record_status: String,
    /// Selection checkbox, relative to a row
    pub record_checkbox: String,
    /// Batch download button
    pub batch_download_button: String,

    /// Expanded folder in the topic tree
    pub folder_expanded: String,
    /// Any folder in the topic tree
    pub folder: String,
    /// A topic entry inside an expanded folder
    pub topic_item: String,
    /// Title of the currently selected topic
    pub current_topic: String,
    /// Confirm button of the topic picker
    pub topic_confirm: String,

    /// Opens the custom time range
    pub custom_range_button: String,
    /// Start time input
    pub start_time_input: String,
    /// End time input
    pub end_time_input: String,

    /// "All sources" checkbox
    pub source_all: String,
    /// Source checkboxes to untick
    pub excluded_sources: Vec<String>,
    /// Element to click inside a checkbox label to toggle it
    pub checkbox_toggle: String,
    /// Checkbox input inside a source label
    pub checkbox_input: String,
    /// Source label whose hover menu holds the extra source
    pub extra_source_menu: String,
    /// Open dropdown menu holding extra sources
    pub dropdown_menu: String,
    /// Entries of the extra-source dropdown
    pub dropdown_item: String,

    /// Filter submit button
    pub filter_button: String,
    /// Element present once filtered data has loaded
    pub data_loaded: String,
    /// Export button
    pub export_button: String,
    /// Confirm button of the export dialog
    pub export_confirm: String,
}

impl SelectorConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in self.named() {
            Selector::parse(value).map_err(|e| format!("selectors.{name}: {e}"))?;
        }
        Ok(())
    }

    fn named(&self) -> Vec<(String, &str)> {
        let mut named = vec![
            ("record_row".to_string(), self.record_row.as_str()),
            ("record_title".to_string(), self.record_title.as_str()),
            ("record_time".to_string(), self.record_time.as_str()),
            ("record_status".to_string(), self.record_status.as_str()),
            ("record_checkbox".to_string(), self.record_checkbox.as_str()),
            (
                "batch_download_button".to_string(),
                self.batch_download_button.as_str(),
            ),
            ("folder_expanded".to_string(), self.folder_expanded.as_str()),
            ("folder".to_string(), self.folder.as_str()),
            ("topic_item".to_string(), self.topic_item.as_str()),
            ("current_topic".to_string(), self.current_topic.as_str()),
            ("topic_confirm".to_string(), self.topic_confirm.as_str()),
            (
                "custom_range_button".to_string(),
                self.custom_range_button.as_str(),
            ),
            ("start_time_input".to_string(), self.start_time_input.as_str()),
            ("end_time_input".to_string(), self.end_time_input.as_str()),
            ("source_all".to_string(), self.source_all.as_str()),
            ("checkbox_toggle".to_string(), self.checkbox_toggle.as_str()),
            ("checkbox_input".to_string(), self.checkbox_input.as_str()),
            (
                "extra_source_menu".to_string(),
                self.extra_source_menu.as_str(),
            ),
            ("dropdown_menu".to_string(), self.dropdown_menu.as_str()),
            ("dropdown_item".to_string(), self.dropdown_item.as_str()),
            ("filter_button".to_string(), self.filter_button.as_str()),
            ("data_loaded".to_string(), self.data_loaded.as_str()),
            ("export_button".to_string(), self.export_button.as_str()),
            ("export_confirm".to_string(), self.export_confirm.as_str()),
        ];
        for (i, source) in self.excluded_sources.iter().enumerate() {
            named.push((format!("excluded_sources[{i}]"), source.as_str()));
        }
        named
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            record_row: ".sourcelist".to_string(),
            record_title: "div:nth-child(2)".to_string(),
            record_time: "div:nth-child(4)".to_string(),
            record_status: "div:nth-child(5)".to_string(),
            record_checkbox: r#"div[data-v-108915d0].checkbox input[type="checkbox"]"#.to_string(),
            batch_download_button: "button[data-v-108915d0].btn.btn-sussess".to_string(),
            folder_expanded: "div.plan-list-folder.cp.curr".to_string(),
            folder: "div.plan-list-folder.cp".to_string(),
            topic_item: "div.plan-list-file".to_string(),
            current_topic: "div[data-v-13cae079].ovhidden".to_string(),
            topic_confirm: "button[data-v-f1ed8238].btn.btn-sussess".to_string(),
            custom_range_button: r#"button.el-button:has-text("自定义")"#.to_string(),
            start_time_input: r#"div.el-date-editor:has(input[placeholder="开始时间"]) input"#
                .to_string(),
            end_time_input: r#"div.el-date-editor:has(input[placeholder="结束时间"]) input"#
                .to_string(),
            source_all: r#"label.el-checkbox:has-text("全部")"#.to_string(),
            excluded_sources: vec![
                r#"label:has-text("微博")"#.to_string(),
                r#"label:has-text("视频")"#.to_string(),
            ],
            checkbox_toggle: ".el-checkbox__inner".to_string(),
            checkbox_input: r#"input[type="checkbox"]"#.to_string(),
            extra_source_menu: r#"label:has-text("APP")"#.to_string(),
            dropdown_menu: "ul.el-dropdown-menu.el-popper".to_string(),
            dropdown_item: "li.el-dropdown-menu__item .dropdown-item".to_string(),
            filter_button: r#"button.el-button:has-text("筛选")"#.to_string(),
            data_loaded: "div.number.mr5".to_string(),
            export_button: "div.d-flex.item-cebter > button.btn.btn-default-border.ml10"
                .to_string(),
            export_confirm: r#"button:has-text("确 定")"#.to_string(),
        }
    }
}

/// Download folder and archive naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Folder the browser downloads into
    #[serde(default = "default_download_folder")]
    pub folder: String,

    /// Prefix of the renamed archive
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Extension of the renamed archive, including the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Only archives created this recently are renamed, in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Reveal the folder in the file manager after the download
    #[serde(default = "default_true")]
    pub open_folder: bool,
}

impl DownloadsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.folder.trim().is_empty() {
            return Err("downloads.folder cannot be empty".to_string());
        }
        if !self.file_extension.starts_with('.') {
            return Err(format!(
                "downloads.file_extension must start with '.', got '{}'",
                self.file_extension
            ));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err("downloads.file_prefix cannot contain path separators".to_string());
        }
        if self.window_minutes == 0 {
            return Err("downloads.window_minutes must be > 0".to_string());
        }
        Ok(())
    }

    /// Rename window
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_minutes * 60)
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            folder: default_download_folder(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            window_minutes: default_window_minutes(),
            open_folder: true,
        }
    }
}

/// Execution ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the JSON ledger file
    #[serde(default = "default_ledger_path")]
    pub path: String,

    /// Days shown by the recent-history report
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl LedgerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("ledger.path cannot be empty".to_string());
        }
        if self.history_days == 0 || self.history_days > 366 {
            return Err(format!(
                "ledger.history_days must be between 1 and 366, got {}",
                self.history_days
            ));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            history_days: default_history_days(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }

    /// Console-only logging
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            local_path: String::new(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://yuqing.nybkz.com".to_string()
}

fn default_downloads_path() -> String {
    "/nindex/userCenter/myDownload".to_string()
}

fn default_topics_path() -> String {
    "/nindex/publicSentiment/informationSet".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_browser_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--disable-extensions",
        "--disable-popup-blocking",
        "--no-first-run",
        "--no-default-browser-check",
        "--password-store=basic",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_window_width() -> u32 {
    1600
}

fn default_window_height() -> u32 {
    900
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_trigger_time() -> String {
    "14:00".to_string()
}

fn default_sleep_slice_seconds() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_export_timeout_minutes() -> u64 {
    30
}

fn default_slow_progress_threshold() -> u8 {
    50
}

fn default_extra_source() -> String {
    "小红书".to_string()
}

fn default_page_load_ms() -> u64 {
    5000
}

fn default_animation_ms() -> u64 {
    1000
}

fn default_folder_expand_ms() -> u64 {
    500
}

fn default_dropdown_show_ms() -> u64 {
    2000
}

fn default_input_settle_ms() -> u64 {
    300
}

fn default_export_check_ms() -> u64 {
    60_000
}

fn default_fast_poll_ms() -> u64 {
    30_000
}

fn default_retry_wait_ms() -> u64 {
    30_000
}

fn default_file_download_ms() -> u64 {
    10_000
}

fn default_launch_retry_wait_ms() -> u64 {
    10_000
}

fn default_success_keywords() -> Vec<String> {
    vec!["成功".to_string()]
}

fn default_exporting_keywords() -> Vec<String> {
    vec!["正在导出".to_string(), "导出中".to_string()]
}

fn default_failed_keywords() -> Vec<String> {
    vec!["失败".to_string()]
}

fn default_download_folder() -> String {
    "downloads".to_string()
}

fn default_file_prefix() -> String {
    "智舆情数据每日导出".to_string()
}

fn default_file_extension() -> String {
    ".zip".to_string()
}

fn default_window_minutes() -> u64 {
    5
}

fn default_ledger_path() -> String {
    "execution_record.json".to_string()
}

fn default_history_days() -> u32 {
    7
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
