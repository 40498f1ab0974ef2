//! End-to-end tests of one export run against an in-memory dashboard
//!
//! The fake portal keeps a record table: a started export shows up as an
//! in-progress row and turns into a success row after a configurable number
//! of polls. Time is virtual, so runs that wait half an hour finish at once.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dashport::adapters::dashboard::{DownloadTrigger, ExportPortal, PortalFactory};
use dashport::adapters::files::{DownloadProcessor, SilentNotifier};
use dashport::config::{DashportConfig, TopicConfig};
use dashport::core::clock::{Clock, ManualClock};
use dashport::core::export::{
    BatchFinalizer, ExportCoordinator, RunWindow, StatusClassifier,
};
use dashport::core::state::ExecutionLedger;
use dashport::domain::{
    DashportError, ExportRecord, ExportStep, FailureReason, Result, Topic,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

const NEVER: u32 = u32::MAX;

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap()
}

/// Shared state of the fake dashboard
#[derive(Default)]
struct Dashboard {
    /// Rows with the number of polls left before they succeed
    rows: Vec<(ExportRecord, u32)>,
    /// Polls an export needs before it reports success
    polls_to_finish: u32,
    /// Topics whose export sequence always fails
    failing: HashSet<String>,
    /// Polls that fail before the table becomes readable
    unreadable_polls: u32,
    /// Whether the batch button is missing
    no_download_button: bool,
    /// Topics whose exports the dashboard reports as failed
    remote_failing: HashSet<String>,
    /// Reads of the table that answer before it stops responding
    hang_after_lists: Option<u32>,
    /// Requests shutdown when an export is started
    shutdown_on_export: Option<watch::Sender<bool>>,

    export_calls: HashMap<String, u32>,
    list_calls: u32,
    reloads: u32,
    selected: Vec<usize>,
    downloads: u32,
    closed: u32,
    launches: u32,
    launch_failures: u32,
}

struct FakePortal {
    dashboard: Arc<Mutex<Dashboard>>,
    clock: Arc<ManualClock>,
}

#[async_trait]
impl ExportPortal for FakePortal {
    async fn list_records(&self) -> Result<Vec<ExportRecord>> {
        let hang = {
            let mut d = self.dashboard.lock().unwrap();
            d.list_calls += 1;
            d.hang_after_lists.is_some_and(|n| d.list_calls > n)
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut d = self.dashboard.lock().unwrap();
        if d.unreadable_polls > 0 {
            d.unreadable_polls -= 1;
            return Err(DashportError::step(
                ExportStep::OpenTopicPage,
                "record table not rendered",
            ));
        }

        for (row, remaining) in d.rows.iter_mut() {
            if *remaining == 0 {
                row.status = "导出成功".to_string();
            } else if *remaining != NEVER {
                *remaining -= 1;
            }
        }
        Ok(d.rows.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn export_topic(&self, topic: &Topic, window: &RunWindow) -> Result<()> {
        assert!(window.is_ordered());
        let mut d = self.dashboard.lock().unwrap();
        *d.export_calls.entry(topic.name.clone()).or_default() += 1;

        if d.failing.contains(&topic.name) {
            return Err(DashportError::step(
                ExportStep::SelectTopic,
                format!("{} not found in tree", topic.name),
            ));
        }

        if let Some(tx) = &d.shutdown_on_export {
            let _ = tx.send(true);
        }

        let now = self.clock.now();
        let title = format!("{}_{}", topic.name, now.format("%Y%m%d%H%M%S"));
        let time = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let row = if d.remote_failing.contains(&topic.name) {
            (ExportRecord::new(title, time, "导出失败"), NEVER)
        } else {
            let polls = d.polls_to_finish;
            (ExportRecord::new(title, time, "正在导出 10%"), polls)
        };
        d.rows.push(row);
        Ok(())
    }

    async fn select_rows(&self, indices: &[usize]) -> Result<usize> {
        let mut d = self.dashboard.lock().unwrap();
        d.selected = indices.to_vec();
        Ok(indices.len())
    }

    async fn download_selected(&self) -> Result<DownloadTrigger> {
        let mut d = self.dashboard.lock().unwrap();
        if d.no_download_button {
            return Err(DashportError::Finalize(
                "Batch download button not found".to_string(),
            ));
        }
        d.downloads += 1;
        Ok(DownloadTrigger::Primary)
    }

    async fn reload(&self) -> Result<()> {
        self.dashboard.lock().unwrap().reloads += 1;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.dashboard.lock().unwrap().closed += 1;
        Ok(())
    }
}

struct FakeFactory {
    dashboard: Arc<Mutex<Dashboard>>,
    clock: Arc<ManualClock>,
}

#[async_trait]
impl PortalFactory for FakeFactory {
    type Portal = FakePortal;

    async fn launch(&self) -> Result<FakePortal> {
        let mut d = self.dashboard.lock().unwrap();
        d.launches += 1;
        if d.launch_failures > 0 {
            d.launch_failures -= 1;
            return Err(DashportError::Session(
                "chromedriver not reachable".to_string(),
            ));
        }
        Ok(FakePortal {
            dashboard: self.dashboard.clone(),
            clock: self.clock.clone(),
        })
    }
}

/// Records calls instead of touching the download folder
#[derive(Default)]
struct RecordingProcessor {
    calls: AtomicUsize,
}

impl DownloadProcessor for RecordingProcessor {
    fn process(&self, folder: &Path) -> Result<Option<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(folder.join("智舆情数据每日导出20250102.zip")))
    }
}

struct Harness {
    _dir: TempDir,
    clock: Arc<ManualClock>,
    dashboard: Arc<Mutex<Dashboard>>,
    ledger: Arc<ExecutionLedger>,
    processor: Arc<RecordingProcessor>,
    coordinator: ExportCoordinator<FakeFactory>,
}

fn harness(topic_count: u32, setup: impl FnOnce(&mut Dashboard)) -> Harness {
    harness_at(start_time(), topic_count, setup)
}

fn harness_at(
    start: NaiveDateTime,
    topic_count: u32,
    setup: impl FnOnce(&mut Dashboard),
) -> Harness {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(start));

    let mut config = DashportConfig::default();
    config.topics = (1..=topic_count)
        .map(|id| TopicConfig {
            id,
            name: format!("Health-{id}"),
            folder: "Products".to_string(),
        })
        .collect();
    config.downloads.folder = dir.path().display().to_string();
    let config = Arc::new(config);

    let mut dashboard = Dashboard {
        polls_to_finish: 1,
        ..Default::default()
    };
    setup(&mut dashboard);
    let dashboard = Arc::new(Mutex::new(dashboard));

    let ledger = Arc::new(ExecutionLedger::new(
        dir.path().join("execution_record.json"),
        clock.clone(),
    ));
    let processor = Arc::new(RecordingProcessor::default());
    let finalizer = BatchFinalizer::new(
        config.topic_table().unwrap(),
        StatusClassifier::new(&config.status_text).unwrap(),
        dir.path().to_path_buf(),
        config.export.waits.file_download(),
        processor.clone(),
        Arc::new(SilentNotifier),
        clock.clone(),
    );
    let factory = FakeFactory {
        dashboard: dashboard.clone(),
        clock: clock.clone(),
    };
    let coordinator =
        ExportCoordinator::new(config, factory, ledger.clone(), finalizer, clock.clone())
            .unwrap();

    Harness {
        _dir: dir,
        clock,
        dashboard,
        ledger,
        processor,
        coordinator,
    }
}

fn today_row(title: &str, status: &str) -> (ExportRecord, u32) {
    (ExportRecord::new(title, "2025-01-02 09:15:00", status), NEVER)
}

#[tokio::test]
async fn test_full_run_exports_every_topic_and_marks_ledger() {
    let h = harness(3, |_| {});

    let summary = h.coordinator.execute_run().await.unwrap();

    assert_eq!(summary.exported, vec!["Health-1", "Health-2", "Health-3"]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.rows_selected, 3);
    assert!(summary.archive.is_some());
    assert!(summary.ledger_marked);
    assert!(summary.is_successful());
    assert!(h.ledger.has_run_today().unwrap());

    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.export_calls.values().sum::<u32>(), 3);
    assert_eq!(d.selected, vec![0, 1, 2]);
    assert_eq!(d.downloads, 1);
    assert_eq!(d.closed, 1);
    assert_eq!(h.processor.calls.load(Ordering::SeqCst), 1);

    // Each export was awaited with the slow poll while below 50%
    let slow_polls = h
        .clock
        .sleeps()
        .into_iter()
        .filter(|s| *s == Duration::from_secs(60))
        .count();
    assert_eq!(slow_polls, 3);
    // The batch download was given time to land
    assert!(h.clock.sleeps().contains(&Duration::from_secs(10)));
}

#[tokio::test]
async fn test_failing_topic_uses_exactly_three_attempts() {
    let h = harness(3, |d| {
        d.failing.insert("Health-2".to_string());
    });

    let summary = h.coordinator.execute_run().await.unwrap();

    assert_eq!(summary.exported, vec!["Health-1", "Health-3"]);
    assert_eq!(summary.failed.len(), 1);
    let (name, reason) = &summary.failed[0];
    assert_eq!(name, "Health-2");
    match reason {
        FailureReason::RetriesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(*attempts, 3);
            assert!(last_error.contains("not found in tree"));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(summary.errors.len(), 3);

    // A failed topic does not fail the run
    assert!(summary.ledger_marked);
    assert!(!summary.is_successful());

    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.export_calls["Health-2"], 3);
    assert_eq!(d.export_calls["Health-3"], 1);
    // Reload after the first two failures, not after the last
    assert_eq!(d.reloads, 2);
    assert_eq!(d.selected, vec![0, 1]);
}

#[tokio::test]
async fn test_export_never_finishing_times_out() {
    let h = harness(1, |d| d.polls_to_finish = NEVER);

    let summary = h.coordinator.execute_run().await.unwrap();

    assert!(summary.exported.is_empty());
    match &summary.failed[0].1 {
        FailureReason::Timeout { waited } => {
            assert!(*waited >= Duration::from_secs(30 * 60));
            assert!(*waited < Duration::from_secs(32 * 60));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(h.dashboard.lock().unwrap().export_calls["Health-1"], 1);
    assert!(h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_topics_already_exported_today_are_not_exported_again() {
    let h = harness(3, |d| {
        d.rows.push(today_row("Health-1_20250102091500", "导出成功"));
        d.rows.push(today_row("Health-2_20250102091500", "导出成功"));
        // Yesterday's row does not count
        d.rows.push((
            ExportRecord::new("Health-3_20250101", "2025-01-01 14:10:00", "导出成功"),
            NEVER,
        ));
    });

    let summary = h.coordinator.execute_run().await.unwrap();

    assert_eq!(summary.exported.len(), 3);
    let d = h.dashboard.lock().unwrap();
    assert!(!d.export_calls.contains_key("Health-1"));
    assert!(!d.export_calls.contains_key("Health-2"));
    assert_eq!(d.export_calls["Health-3"], 1);
    // Yesterday's row is left out of the batch
    assert_eq!(d.selected, vec![0, 1, 3]);
}

#[tokio::test]
async fn test_earlier_remote_failure_is_exported_again() {
    let h = harness(2, |d| {
        d.rows.push(today_row("Health-1_20250102091500", "导出失败"));
    });

    let summary = h.coordinator.execute_run().await.unwrap();

    assert!(summary.is_successful());
    assert_eq!(summary.exported, vec!["Health-1", "Health-2"]);
    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.export_calls["Health-1"], 1);
    assert_eq!(d.selected, vec![1, 2]);
}

#[tokio::test]
async fn test_remote_failures_use_the_attempt_budget() {
    let h = harness(2, |d| {
        d.remote_failing.insert("Health-1".to_string());
    });

    let summary = h.coordinator.execute_run().await.unwrap();

    assert_eq!(summary.exported, vec!["Health-2"]);
    assert_eq!(
        summary.failed,
        vec![(
            "Health-1".to_string(),
            FailureReason::Remote {
                status: "导出失败".to_string()
            }
        )]
    );
    assert_eq!(h.dashboard.lock().unwrap().export_calls["Health-1"], 3);
    assert!(h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_launch_is_retried() {
    let h = harness(1, |d| d.launch_failures = 2);

    let summary = h.coordinator.execute_run().await.unwrap();

    assert!(summary.is_successful());
    assert_eq!(h.dashboard.lock().unwrap().launches, 3);
    let launch_waits = h
        .clock
        .sleeps()
        .into_iter()
        .take(2)
        .collect::<Vec<_>>();
    assert_eq!(launch_waits, vec![Duration::from_secs(10); 2]);
}

#[tokio::test]
async fn test_launch_failure_is_a_session_error() {
    let h = harness(1, |d| d.launch_failures = 10);

    let err = h.coordinator.execute_run().await.unwrap_err();

    assert!(matches!(err, DashportError::Session(_)));
    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.launches, 3);
    assert_eq!(d.closed, 0);
    assert!(!h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_unreadable_table_recovers_within_budget() {
    let h = harness(1, |d| d.unreadable_polls = 2);

    let summary = h.coordinator.execute_run().await.unwrap();

    assert!(summary.is_successful());
    assert_eq!(h.dashboard.lock().unwrap().reloads, 2);
}

#[tokio::test]
async fn test_unreadable_table_aborts_run_and_closes_session() {
    let h = harness(1, |d| d.unreadable_polls = 100);

    let err = h.coordinator.execute_run().await.unwrap_err();

    assert!(matches!(err, DashportError::Session(_)));
    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.list_calls, 3);
    assert_eq!(d.closed, 1);
    assert!(!h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_missing_download_button_leaves_day_unrecorded() {
    let h = harness(2, |d| d.no_download_button = true);

    let err = h.coordinator.execute_run().await.unwrap_err();

    assert!(matches!(err, DashportError::Finalize(_)));
    assert_eq!(h.dashboard.lock().unwrap().closed, 1);
    assert_eq!(h.processor.calls.load(Ordering::SeqCst), 0);
    assert!(!h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_shutdown_while_waiting_closes_session() {
    let (tx, rx) = watch::channel(false);
    let h = harness(2, |d| {
        d.polls_to_finish = NEVER;
        d.shutdown_on_export = Some(tx);
    });
    let coordinator = h.coordinator.with_shutdown(rx);

    let err = coordinator.execute_run().await.unwrap_err();

    assert!(matches!(err, DashportError::Interrupted));
    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.launches, 1);
    assert_eq!(d.closed, d.launches);
    assert_eq!(d.downloads, 0);
    assert!(!h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_shutdown_during_stuck_poll_closes_session() {
    let (tx, rx) = watch::channel(false);
    let h = harness(1, |d| d.hang_after_lists = Some(1));
    let coordinator = h.coordinator.with_shutdown(rx);

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        tx
    });

    let err = coordinator.execute_run().await.unwrap_err();
    let _tx = stopper.await.unwrap();

    assert!(matches!(err, DashportError::Interrupted));
    let d = h.dashboard.lock().unwrap();
    assert_eq!(d.list_calls, 2);
    assert_eq!(d.closed, 1);
    assert!(!h.ledger.has_run_today().unwrap());
}

#[tokio::test]
async fn test_run_crossing_midnight_is_recorded_on_start_day() {
    let start = NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(23, 59, 30)
        .unwrap();
    let h = harness_at(start, 1, |_| {});

    let summary = h.coordinator.execute_run().await.unwrap();

    assert_eq!(summary.exported, vec!["Health-1"]);
    assert!(h.clock.now().date() > start.date());
    assert!(h
        .ledger
        .has_run_on(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
        .unwrap());
    assert!(!h
        .ledger
        .has_run_on(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap())
        .unwrap());
}
