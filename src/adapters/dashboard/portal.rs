//! Dashboard portal on top of a UI actuator
//!
//! Implements the per-topic export sequence, the record table poll and the
//! batch download against the dashboard's pages. Every sub-step with an
//! observable post-condition is checked right after it runs; a violated
//! post-condition fails the sequence with the step that broke.

use super::scripts;
use super::traits::{DownloadTrigger, ExportPortal, PortalFactory};
use crate::adapters::actuator::{
    BrowserCookie, Selector, SessionOptions, UiActuator, WaitState, WebDriverActuator,
};
use crate::config::{DashportConfig, SelectorConfig, WaitConfig};
use crate::core::clock::Clock;
use crate::core::export::window::{parse_window_text, RunWindow};
use crate::domain::{ActuatorError, DashportError, ExportRecord, ExportStep, Result, Topic};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Longest wait for the first record row to appear
const RECORDS_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest wait for the batch button before falling back to a script click
const BATCH_BUTTON_TIMEOUT: Duration = Duration::from_secs(5);

/// Parsed UI selectors
#[derive(Debug, Clone)]
pub struct PortalSelectors {
    record_row: Selector,
    record_title: Selector,
    record_time: Selector,
    record_status: Selector,
    record_checkbox: Selector,
    batch_download_button: Selector,
    folder_expanded: Selector,
    folder: Selector,
    topic_item: Selector,
    current_topic: Selector,
    topic_confirm: Selector,
    custom_range_button: Selector,
    start_time_input: Selector,
    end_time_input: Selector,
    source_all: Selector,
    excluded_sources: Vec<Selector>,
    checkbox_toggle: String,
    checkbox_input: String,
    extra_source_menu: Selector,
    dropdown_menu: Selector,
    dropdown_item: Selector,
    filter_button: Selector,
    data_loaded: Selector,
    export_button: Selector,
    export_confirm: Selector,
}

impl PortalSelectors {
    /// Parse the `[selectors]` section
    ///
    /// # Errors
    ///
    /// Returns an actuator error for the first unparsable selector
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        let parse = |s: &str| Selector::parse(s).map_err(DashportError::from);
        Ok(Self {
            record_row: parse(&config.record_row)?,
            record_title: parse(&config.record_title)?,
            record_time: parse(&config.record_time)?,
            record_status: parse(&config.record_status)?,
            record_checkbox: parse(&config.record_checkbox)?,
            batch_download_button: parse(&config.batch_download_button)?,
            folder_expanded: parse(&config.folder_expanded)?,
            folder: parse(&config.folder)?,
            topic_item: parse(&config.topic_item)?,
            current_topic: parse(&config.current_topic)?,
            topic_confirm: parse(&config.topic_confirm)?,
            custom_range_button: parse(&config.custom_range_button)?,
            start_time_input: parse(&config.start_time_input)?,
            end_time_input: parse(&config.end_time_input)?,
            source_all: parse(&config.source_all)?,
            excluded_sources: config
                .excluded_sources
                .iter()
                .map(|s| parse(s))
                .collect::<Result<Vec<_>>>()?,
            checkbox_toggle: parse(&config.checkbox_toggle)?.css().to_string(),
            checkbox_input: parse(&config.checkbox_input)?.css().to_string(),
            extra_source_menu: parse(&config.extra_source_menu)?,
            dropdown_menu: parse(&config.dropdown_menu)?,
            dropdown_item: parse(&config.dropdown_item)?,
            filter_button: parse(&config.filter_button)?,
            data_loaded: parse(&config.data_loaded)?,
            export_button: parse(&config.export_button)?,
            export_confirm: parse(&config.export_confirm)?,
        })
    }
}

/// Page addresses, waits and labels used by the portal
#[derive(Debug, Clone)]
pub struct PortalSettings {
    /// Download-records page
    pub downloads_url: String,
    /// Topic-selection page
    pub topics_url: String,
    /// Fixed waits
    pub waits: WaitConfig,
    /// Label of the extra source picked from the nested menu
    pub extra_source: String,
    /// Default wait for elements and page loads
    pub timeout: Duration,
}

impl PortalSettings {
    /// Settings from the loaded configuration
    pub fn from_config(config: &DashportConfig) -> Self {
        Self {
            downloads_url: config.dashboard.downloads_url(),
            topics_url: config.dashboard.topics_url(),
            waits: config.export.waits.clone(),
            extra_source: config.export.extra_source.clone(),
            timeout: config.dashboard.default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    status: String,
}

fn at(step: ExportStep) -> impl Fn(ActuatorError) -> DashportError {
    move |e| DashportError::step(step, e.to_string())
}

/// Dashboard session driven through a [`UiActuator`]
pub struct DashboardPortal<A: UiActuator> {
    actuator: A,
    selectors: PortalSelectors,
    settings: PortalSettings,
    clock: Arc<dyn Clock>,
}

impl<A: UiActuator> DashboardPortal<A> {
    /// Wrap an actuator already logged in to the dashboard
    pub fn new(
        actuator: A,
        selectors: PortalSelectors,
        settings: PortalSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            actuator,
            selectors,
            settings,
            clock,
        }
    }

    /// Underlying actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    async fn eval_bool(&self, script: &str, args: Vec<Value>) -> std::result::Result<bool, ActuatorError> {
        Ok(self.actuator.evaluate(script, args).await?.as_bool().unwrap_or(false))
    }

    async fn wait_and_click(&self, selector: &Selector) -> std::result::Result<(), ActuatorError> {
        self.actuator
            .wait_for(selector, WaitState::Visible, self.settings.timeout)
            .await?;
        self.actuator.click(selector).await
    }

    async fn open_topic_page(&self) -> Result<()> {
        let step = ExportStep::OpenTopicPage;
        self.actuator
            .navigate(&self.settings.topics_url)
            .await
            .map_err(at(step))?;
        self.actuator
            .wait_for_load(self.settings.timeout)
            .await
            .map_err(at(step))?;
        Ok(())
    }

    async fn select_topic(&self, topic: &Topic) -> Result<()> {
        let step = ExportStep::SelectTopic;
        let s = &self.selectors;

        let current = self
            .eval_bool(
                scripts::IS_CURRENT_TOPIC,
                vec![json!(s.current_topic.css()), json!(topic.name)],
            )
            .await
            .map_err(at(step))?;
        if current {
            tracing::debug!(topic = %topic.name, "Topic already selected");
            return Ok(());
        }

        let expanded = self
            .eval_bool(
                scripts::IS_FOLDER_EXPANDED,
                vec![json!(s.folder_expanded.css()), json!(topic.folder)],
            )
            .await
            .map_err(at(step))?;

        if !expanded {
            match self
                .actuator
                .evaluate(
                    scripts::COLLAPSE_OTHER_FOLDERS,
                    vec![json!(s.folder_expanded.css()), json!(topic.folder)],
                )
                .await
            {
                Ok(collapsed) => {
                    tracing::debug!(collapsed = %collapsed, "Collapsed other folders");
                    self.clock.sleep(self.settings.waits.folder_expand()).await;
                }
                Err(e) => tracing::warn!(error = %e, "Failed to collapse other folders"),
            }
        }

        // A folder that has not rendered yet gets one more chance
        let mut picked = self.pick_topic(topic, expanded).await?;
        if !picked {
            tracing::debug!(topic = %topic.name, folder = %topic.folder, "Topic not visible, retrying folder");
            self.clock.sleep(self.settings.waits.animation()).await;
            picked = self.pick_topic(topic, expanded).await?;
        }
        if !picked {
            return Err(DashportError::step(
                step,
                format!("topic '{}' not shown in folder '{}'", topic.name, topic.folder),
            ));
        }

        let confirmed = self
            .eval_bool(scripts::CLICK_FIRST, vec![json!(s.topic_confirm.css())])
            .await
            .map_err(at(step))?;
        if !confirmed {
            return Err(DashportError::step(step, "topic confirm button not found"));
        }
        self.clock.sleep(self.settings.waits.input_settle()).await;
        Ok(())
    }

    /// Expand the topic's folder if needed and click the topic
    async fn pick_topic(&self, topic: &Topic, folder_expanded: bool) -> Result<bool> {
        let step = ExportStep::SelectTopic;
        let s = &self.selectors;

        if !folder_expanded {
            let opened = self
                .eval_bool(
                    scripts::CLICK_WITH_TEXT,
                    vec![json!(s.folder.css()), json!(topic.folder)],
                )
                .await
                .map_err(at(step))?;
            if !opened {
                tracing::debug!(folder = %topic.folder, "Folder not found");
                return Ok(false);
            }
            self.clock.sleep(self.settings.waits.folder_expand()).await;
        }

        let item = s.topic_item.with_text(topic.name.clone());
        match self
            .actuator
            .wait_for(&item, WaitState::Visible, self.settings.waits.dropdown_show())
            .await
        {
            Ok(()) => {}
            Err(ActuatorError::Timeout { .. }) | Err(ActuatorError::ElementNotFound(_)) => {
                return Ok(false)
            }
            Err(e) => return Err(at(step)(e)),
        }

        self.actuator.click(&item).await.map_err(at(step))?;
        self.clock.sleep(self.settings.waits.animation()).await;
        Ok(true)
    }

    async fn apply_filter(&self, window: &RunWindow) -> Result<()> {
        let s = &self.selectors;
        let waits = &self.settings.waits;

        if let Err(e) = self.actuator.evaluate(scripts::SCROLL_TOP, Vec::new()).await {
            tracing::debug!(error = %e, "Scroll to top failed");
        }
        self.clock.sleep(waits.folder_expand()).await;

        self.wait_and_click(&s.custom_range_button)
            .await
            .map_err(at(ExportStep::OpenCustomRange))?;

        let start = self
            .fill_verified(&s.start_time_input, &window.start_text(), ExportStep::SetStartTime)
            .await?;
        let end = self
            .fill_verified(&s.end_time_input, &window.end_text(), ExportStep::SetEndTime)
            .await?;

        if !window.is_ordered() {
            return Err(DashportError::step(
                ExportStep::VerifyTimeRange,
                format!("window {window} ends before it starts"),
            ));
        }
        match (parse_window_text(&start), parse_window_text(&end)) {
            (Some(start), Some(end)) if end < start => {
                return Err(DashportError::step(
                    ExportStep::VerifyTimeRange,
                    format!("end {end} is before start {start}"),
                ));
            }
            (Some(_), Some(_)) => {}
            _ => tracing::warn!(start = %start, end = %end, "Time inputs not in picker format, order unchecked"),
        }

        self.set_checkbox(&s.source_all, true, ExportStep::SelectAllSources)
            .await?;
        for source in &s.excluded_sources {
            self.set_checkbox(source, false, ExportStep::ExcludeSource)
                .await?;
        }

        self.add_extra_source().await;

        self.wait_and_click(&s.filter_button)
            .await
            .map_err(at(ExportStep::ApplyFilter))?;
        self.actuator
            .wait_for(&s.data_loaded, WaitState::Visible, self.settings.timeout)
            .await
            .map_err(at(ExportStep::ApplyFilter))?;
        self.clock.sleep(waits.page_load()).await;
        Ok(())
    }

    /// Fill an input and read it back; returns the value read
    async fn fill_verified(&self, input: &Selector, value: &str, step: ExportStep) -> Result<String> {
        self.actuator.fill(input, value).await.map_err(at(step))?;
        self.clock.sleep(self.settings.waits.input_settle()).await;

        let actual = self.actuator.input_value(input).await.map_err(at(step))?;
        if actual.trim().is_empty() {
            return Err(DashportError::step(step, format!("input stayed empty after typing '{value}'")));
        }
        if let (Some(got), Some(wanted)) = (parse_window_text(&actual), parse_window_text(value)) {
            if got != wanted {
                return Err(DashportError::step(
                    step,
                    format!("input reads '{}' after typing '{value}'", actual.trim()),
                ));
            }
        }
        tracing::debug!(step = %step, value = %actual, "Input verified");
        Ok(actual)
    }

    /// Bring a labelled checkbox into the wanted state and verify it
    async fn set_checkbox(&self, label: &Selector, checked: bool, step: ExportStep) -> Result<()> {
        let input = label.with_child(self.selectors.checkbox_input.clone());
        let toggle = label.with_child(self.selectors.checkbox_toggle.clone());

        let before = self.actuator.is_checked(&input).await.map_err(at(step))?;
        if before != checked {
            self.actuator.click(&toggle).await.map_err(at(step))?;
            self.clock.sleep(self.settings.waits.input_settle()).await;
        }

        let after = self.actuator.is_checked(&input).await.map_err(at(step))?;
        if after != checked {
            return Err(DashportError::step(
                step,
                format!("{label} is {} after toggling", if after { "checked" } else { "unchecked" }),
            ));
        }
        Ok(())
    }

    /// Pick the extra source from the hover menu
    ///
    /// The menu is flaky; a miss is logged and the export goes on without it.
    async fn add_extra_source(&self) {
        let s = &self.selectors;
        let step = ExportStep::AddExtraSource;

        if let Err(e) = self.actuator.hover(&s.extra_source_menu).await {
            tracing::warn!(step = %step, error = %e, "Hover on source menu failed");
            return;
        }
        if let Err(e) = self
            .actuator
            .wait_for(&s.dropdown_menu, WaitState::Visible, self.settings.waits.dropdown_show())
            .await
        {
            tracing::debug!(step = %step, error = %e, "Source menu not visible yet");
        }

        match self
            .eval_bool(
                scripts::CLICK_MENU_ITEM,
                vec![
                    json!(s.dropdown_menu.css()),
                    json!(s.dropdown_item.css()),
                    json!(self.settings.extra_source),
                ],
            )
            .await
        {
            Ok(true) => tracing::debug!(source = %self.settings.extra_source, "Extra source added"),
            Ok(false) => tracing::warn!(step = %step, source = %self.settings.extra_source, "Extra source not found in menu"),
            Err(e) => tracing::warn!(step = %step, error = %e, "Extra source menu failed"),
        }
        self.clock.sleep(self.settings.waits.input_settle()).await;
    }

    async fn trigger_export(&self) -> Result<()> {
        let step = ExportStep::TriggerExport;
        let s = &self.selectors;

        self.actuator
            .hover(&s.export_button)
            .await
            .map_err(at(step))?;
        self.wait_and_click(&s.export_button).await.map_err(at(step))?;
        self.wait_and_click(&s.export_confirm).await.map_err(at(step))?;
        Ok(())
    }
}

#[async_trait]
impl<A: UiActuator> ExportPortal for DashboardPortal<A> {
    async fn list_records(&self) -> Result<Vec<ExportRecord>> {
        let s = &self.selectors;

        self.actuator.navigate(&self.settings.downloads_url).await?;
        self.actuator.wait_for_load(self.settings.timeout).await?;

        match self
            .actuator
            .wait_for(&s.record_row, WaitState::Attached, RECORDS_TIMEOUT)
            .await
        {
            Ok(()) => {}
            Err(ActuatorError::Timeout { .. }) => {
                tracing::warn!("No export records listed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let value = self
            .actuator
            .evaluate(
                scripts::LIST_RECORDS,
                vec![
                    json!(s.record_row.css()),
                    json!(s.record_title.css()),
                    json!(s.record_time.css()),
                    json!(s.record_status.css()),
                ],
            )
            .await?;
        let raw: Vec<RawRecord> = serde_json::from_value(value)?;

        let records: Vec<ExportRecord> = raw
            .into_iter()
            .map(|r| ExportRecord::new(r.title, r.time, r.status))
            .collect();
        tracing::debug!(count = records.len(), "Export records read");
        Ok(records)
    }

    async fn export_topic(&self, topic: &Topic, window: &RunWindow) -> Result<()> {
        tracing::info!(topic = %topic.name, window = %window, "Running export sequence");

        self.open_topic_page().await?;
        self.select_topic(topic).await?;
        self.apply_filter(window).await?;
        self.trigger_export().await?;

        tracing::info!(topic = %topic.name, "Export submitted");
        Ok(())
    }

    async fn select_rows(&self, indices: &[usize]) -> Result<usize> {
        let s = &self.selectors;
        let value = self
            .actuator
            .evaluate(
                scripts::SELECT_ROWS,
                vec![
                    json!(s.record_row.css()),
                    json!(s.record_checkbox.css()),
                    json!(indices),
                ],
            )
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn download_selected(&self) -> Result<DownloadTrigger> {
        let button = &self.selectors.batch_download_button;

        let primary = async {
            self.actuator
                .wait_for(button, WaitState::Visible, BATCH_BUTTON_TIMEOUT)
                .await?;
            self.actuator.click(button).await
        };
        match primary.await {
            Ok(()) => return Ok(DownloadTrigger::Primary),
            Err(e) => tracing::warn!(error = %e, "Batch button click failed, trying script click"),
        }

        match self
            .eval_bool(scripts::CLICK_FIRST, vec![json!(button.css())])
            .await
        {
            Ok(true) => Ok(DownloadTrigger::Fallback),
            Ok(false) => Err(DashportError::Finalize(format!(
                "batch download button '{button}' not found"
            ))),
            Err(e) => Err(DashportError::Finalize(format!(
                "batch download script failed: {e}"
            ))),
        }
    }

    async fn reload(&self) -> Result<()> {
        self.actuator.reload().await?;
        self.actuator.wait_for_load(self.settings.timeout).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.actuator.close().await?;
        Ok(())
    }
}

/// Launches WebDriver-backed portal sessions
pub struct DashboardPortalFactory {
    config: Arc<DashportConfig>,
    selectors: PortalSelectors,
    download_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl DashboardPortalFactory {
    /// Create a factory from the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a selector cannot be parsed
    pub fn new(config: Arc<DashportConfig>, clock: Arc<dyn Clock>) -> Result<Self> {
        let selectors = PortalSelectors::from_config(&config.selectors)?;
        let download_dir = PathBuf::from(&config.downloads.folder);
        Ok(Self {
            config,
            selectors,
            download_dir,
            clock,
        })
    }

    async fn prepare(&self, actuator: &WebDriverActuator) -> std::result::Result<(), ActuatorError> {
        let dashboard = &self.config.dashboard;

        // Cookies can only be set on a page of their domain
        actuator.navigate(&dashboard.base_url).await?;
        let cookies: Vec<BrowserCookie> = dashboard.cookies.iter().map(BrowserCookie::from).collect();
        actuator.set_cookies(&cookies).await?;

        actuator.navigate(&dashboard.downloads_url()).await?;
        actuator.wait_for_load(dashboard.default_timeout()).await
    }
}

#[async_trait]
impl PortalFactory for DashboardPortalFactory {
    type Portal = DashboardPortal<WebDriverActuator>;

    async fn launch(&self) -> Result<Self::Portal> {
        std::fs::create_dir_all(&self.download_dir).map_err(|e| {
            DashportError::Session(format!(
                "Failed to create download folder {}: {e}",
                self.download_dir.display()
            ))
        })?;

        let options = SessionOptions::from_config(&self.config.dashboard, &self.download_dir);
        let actuator = WebDriverActuator::launch(&options)
            .await
            .map_err(|e| DashportError::Session(format!("Failed to start browser: {e}")))?;

        if let Err(e) = self.prepare(&actuator).await {
            if let Err(close_err) = actuator.close().await {
                tracing::warn!(error = %close_err, "Failed to close half-started session");
            }
            return Err(DashportError::Session(format!(
                "Failed to open the downloads page: {e}"
            )));
        }

        Ok(DashboardPortal::new(
            actuator,
            self.selectors.clone(),
            PortalSettings::from_config(&self.config),
            self.clock.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::actuator::ActuatorResult;
    use crate::core::calendar::WorkCalendar;
    use crate::core::clock::ManualClock;
    use crate::domain::TopicId;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Page double keeping checkbox and input state
    #[derive(Default)]
    struct FakePage {
        calls: Mutex<Vec<String>>,
        checked: Mutex<HashMap<String, bool>>,
        inputs: Mutex<HashMap<String, String>>,
        missing: HashSet<String>,
        current_topic: String,
        records: Value,
        stuck_checkboxes: bool,
        inputs_ignore_typing: bool,
        /// Text every input shows regardless of what was typed
        input_override: Option<String>,
        script_click_finds: bool,
    }

    impl FakePage {
        fn new() -> Self {
            Self {
                script_click_finds: true,
                records: json!([]),
                ..Default::default()
            }
        }

        fn label_key(selector: &Selector) -> String {
            format!("{}|{}", selector.css(), selector.text().unwrap_or_default())
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn is_on(&self, label: &str) -> bool {
            self.checked.lock().unwrap().get(label).copied().unwrap_or(false)
        }
    }

    #[async_trait]
    impl UiActuator for FakePage {
        async fn navigate(&self, url: &str) -> ActuatorResult<()> {
            self.record(format!("navigate {url}"));
            Ok(())
        }

        async fn reload(&self) -> ActuatorResult<()> {
            self.record("reload".to_string());
            Ok(())
        }

        async fn wait_for_load(&self, _timeout: Duration) -> ActuatorResult<()> {
            Ok(())
        }

        async fn wait_for(&self, selector: &Selector, _state: WaitState, timeout: Duration) -> ActuatorResult<()> {
            if self.missing.contains(selector.css()) {
                return Err(ActuatorError::Timeout {
                    what: selector.to_string(),
                    after_ms: timeout.as_millis() as u64,
                });
            }
            Ok(())
        }

        async fn click(&self, selector: &Selector) -> ActuatorResult<()> {
            self.record(format!("click {selector}"));
            if selector.child() == Some(".el-checkbox__inner") && !self.stuck_checkboxes {
                let mut checked = self.checked.lock().unwrap();
                let entry = checked.entry(Self::label_key(selector)).or_insert(false);
                *entry = !*entry;
            }
            Ok(())
        }

        async fn fill(&self, selector: &Selector, value: &str) -> ActuatorResult<()> {
            self.record(format!("fill {value}"));
            if !self.inputs_ignore_typing {
                let shown = self.input_override.as_deref().unwrap_or(value);
                self.inputs
                    .lock()
                    .unwrap()
                    .insert(selector.to_string(), shown.to_string());
            }
            Ok(())
        }

        async fn input_value(&self, selector: &Selector) -> ActuatorResult<String> {
            Ok(self
                .inputs
                .lock()
                .unwrap()
                .get(&selector.to_string())
                .cloned()
                .unwrap_or_default())
        }

        async fn read_text(&self, _selector: &Selector) -> ActuatorResult<String> {
            Ok(String::new())
        }

        async fn is_checked(&self, selector: &Selector) -> ActuatorResult<bool> {
            Ok(self.is_on(&Self::label_key(selector)))
        }

        async fn hover(&self, selector: &Selector) -> ActuatorResult<()> {
            self.record(format!("hover {selector}"));
            Ok(())
        }

        async fn evaluate(&self, script: &str, args: Vec<Value>) -> ActuatorResult<Value> {
            Ok(match script {
                s if s == scripts::LIST_RECORDS => self.records.clone(),
                s if s == scripts::IS_CURRENT_TOPIC => json!(args[1] == json!(self.current_topic)),
                s if s == scripts::IS_FOLDER_EXPANDED => json!(false),
                s if s == scripts::COLLAPSE_OTHER_FOLDERS => json!(1),
                s if s == scripts::CLICK_WITH_TEXT => {
                    self.record(format!("script click {}", args[1]));
                    json!(true)
                }
                s if s == scripts::CLICK_FIRST => {
                    self.record(format!("script click {}", args[0]));
                    json!(self.script_click_finds)
                }
                s if s == scripts::CLICK_MENU_ITEM => json!(true),
                s if s == scripts::SELECT_ROWS => json!(args[2].as_array().map(Vec::len).unwrap_or(0)),
                _ => Value::Null,
            })
        }

        async fn set_cookies(&self, _cookies: &[BrowserCookie]) -> ActuatorResult<()> {
            Ok(())
        }

        async fn close(&self) -> ActuatorResult<()> {
            self.record("close".to_string());
            Ok(())
        }
    }

    fn portal(page: FakePage) -> DashboardPortal<FakePage> {
        let config = DashportConfig::default();
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(15, 0, 0).unwrap(),
        ));
        DashboardPortal::new(
            page,
            PortalSelectors::from_config(&config.selectors).unwrap(),
            PortalSettings::from_config(&config),
            clock,
        )
    }

    fn topic() -> Topic {
        Topic::new(3, "健康主词", "非创建者勿动1")
    }

    fn window() -> RunWindow {
        RunWindow::compute(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(15, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            &WorkCalendar::default(),
        )
    }

    #[tokio::test]
    async fn test_export_sequence_happy_path() {
        let portal = portal(FakePage::new());
        portal.export_topic(&topic(), &window()).await.unwrap();

        let page = portal.actuator();
        let calls = page.calls();
        assert!(calls.iter().any(|c| c == "fill 2025/01/01 14:00:00"));
        assert!(calls.iter().any(|c| c == "fill 2025/01/02 14:00:00"));
        assert!(calls.last().unwrap().contains("确 定"));

        assert!(page.is_on("label.el-checkbox|全部"));
        assert!(!page.is_on("label|微博"));
        assert!(!page.is_on("label|视频"));
    }

    #[tokio::test]
    async fn test_current_topic_skips_folder() {
        let mut page = FakePage::new();
        page.current_topic = topic().name;
        let portal = portal(page);
        portal.export_topic(&topic(), &window()).await.unwrap();

        let calls = portal.actuator().calls();
        assert!(!calls.iter().any(|c| c.contains("非创建者勿动1")));
    }

    #[tokio::test]
    async fn test_empty_input_fails_step() {
        let mut page = FakePage::new();
        page.inputs_ignore_typing = true;
        let err = portal(page).export_topic(&topic(), &window()).await.unwrap_err();
        assert!(matches!(
            err,
            DashportError::Step {
                step: ExportStep::SetStartTime,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_input_showing_other_time_fails_step() {
        let mut page = FakePage::new();
        page.input_override = Some("2025/01/01 00:00:00".to_string());
        let err = portal(page).export_topic(&topic(), &window()).await.unwrap_err();
        assert!(matches!(
            err,
            DashportError::Step {
                step: ExportStep::SetStartTime,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_stuck_checkbox_fails_step() {
        let mut page = FakePage::new();
        page.stuck_checkboxes = true;
        let err = portal(page).export_topic(&topic(), &window()).await.unwrap_err();
        assert!(matches!(
            err,
            DashportError::Step {
                step: ExportStep::SelectAllSources,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_topic_fails_selection() {
        let mut page = FakePage::new();
        page.missing.insert("div.plan-list-file".to_string());
        let err = portal(page).export_topic(&topic(), &window()).await.unwrap_err();
        assert!(matches!(
            err,
            DashportError::Step {
                step: ExportStep::SelectTopic,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_list_records() {
        let mut page = FakePage::new();
        page.records = json!([
            {"title": "健康主词_20250102", "time": "2025-01-02 14:03:11", "status": "导出成功"},
            {"title": "其他", "time": "2025-01-01 09:00:00"}
        ]);
        let records = portal(page).list_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].matches_topic("健康主词"));
        assert_eq!(records[1].status, "");
    }

    #[tokio::test]
    async fn test_list_records_empty_table() {
        let mut page = FakePage::new();
        page.missing.insert(".sourcelist".to_string());
        assert!(portal(page).list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_primary_then_fallback() {
        let portal_ok = portal(FakePage::new());
        assert_eq!(
            portal_ok.download_selected().await.unwrap(),
            DownloadTrigger::Primary
        );

        let mut page = FakePage::new();
        page.missing.insert("button[data-v-108915d0].btn.btn-sussess".to_string());
        assert_eq!(
            portal(page).download_selected().await.unwrap(),
            DownloadTrigger::Fallback
        );

        let mut page = FakePage::new();
        page.missing.insert("button[data-v-108915d0].btn.btn-sussess".to_string());
        page.script_click_finds = false;
        assert!(matches!(
            portal(page).download_selected().await,
            Err(DashportError::Finalize(_))
        ));
    }

    #[tokio::test]
    async fn test_select_rows_counts() {
        let portal = portal(FakePage::new());
        assert_eq!(portal.select_rows(&[0, 2, 5]).await.unwrap(), 3);
        assert_eq!(TopicId::new(3), topic().id);
    }
}
