//! Export coordinator - main orchestrator for one export run
//!
//! This module drives a run from session launch to the ledger mark: it polls
//! the record table, feeds the state machine, starts topic exports one at a
//! time, waits while the dashboard works, and hands over to the batch
//! finalizer once nothing is left to do.

use crate::adapters::dashboard::{ExportPortal, PortalFactory};
use crate::config::DashportConfig;
use crate::core::calendar::WorkCalendar;
use crate::core::clock::Clock;
use crate::core::export::classify::StatusClassifier;
use crate::core::export::finalizer::BatchFinalizer;
use crate::core::export::machine::{AttemptOutcome, Dispatch, TopicExportMachine};
use crate::core::export::summary::{RunError, RunErrorType, RunSummary};
use crate::core::export::window::RunWindow;
use crate::core::state::ExecutionLedger;
use crate::domain::{DashportError, ExportRecord, Result, Topic, TopicTable};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator<F: PortalFactory> {
    config: Arc<DashportConfig>,
    factory: F,
    ledger: Arc<ExecutionLedger>,
    finalizer: BatchFinalizer,
    calendar: WorkCalendar,
    trigger: NaiveTime,
    topics: TopicTable,
    classifier: StatusClassifier,
    clock: Arc<dyn Clock>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<F: PortalFactory> ExportCoordinator<F> {
    /// Create a new export coordinator
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the topic table, trigger time or
    /// status keywords are invalid
    pub fn new(
        config: Arc<DashportConfig>,
        factory: F,
        ledger: Arc<ExecutionLedger>,
        finalizer: BatchFinalizer,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let topics = config.topic_table().map_err(DashportError::Configuration)?;
        let trigger = config
            .schedule
            .trigger()
            .map_err(DashportError::Configuration)?;
        let calendar = WorkCalendar::new(config.schedule.holidays.iter().copied());
        let classifier = StatusClassifier::new(&config.status_text)?;

        Ok(Self {
            config,
            factory,
            ledger,
            finalizer,
            calendar,
            trigger,
            topics,
            classifier,
            clock,
            shutdown: None,
        })
    }

    /// Stop runs when `shutdown` turns true
    ///
    /// An interrupted run closes its session and returns
    /// [`DashportError::Interrupted`] without touching the ledger.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Execute one run
    ///
    /// Launches a session, exports every topic it can, finalizes the batch
    /// and records the day in the ledger. The session is closed on every
    /// exit path, a shutdown signal included. The ledger entry is keyed on
    /// the day the run started.
    ///
    /// # Errors
    ///
    /// Returns an error when the session cannot be launched within its retry
    /// budget, the record table stays unreadable, the batch download cannot
    /// be triggered, the ledger cannot be written, or a shutdown signal
    /// arrives. Topics that fail do not fail the run.
    pub async fn execute_run(&self) -> Result<RunSummary> {
        let started = self.clock.now();
        let mut summary = RunSummary::new(self.topics.len());
        summary.started_at = Some(started);

        let window = RunWindow::compute(started, self.trigger, &self.calendar);
        tracing::info!(
            started = %started.format("%Y-%m-%d %H:%M:%S"),
            window = %window,
            topics = self.topics.len(),
            "Starting export run"
        );

        let portal = self.launch_portal().await?;

        // On shutdown the drive future is dropped; the session is still closed below
        let result = tokio::select! {
            biased;
            _ = self.shutdown_signal() => Err(DashportError::Interrupted),
            result = self.drive(&portal, &window, started.date(), &mut summary) => result,
        };

        if let Err(e) = portal.close().await {
            tracing::warn!(error = %e, "Failed to close browser session");
            summary.add_error(RunError::new(RunErrorType::Session, e.to_string()));
        }

        let elapsed = (self.clock.now() - started)
            .to_std()
            .unwrap_or(Duration::ZERO);

        match result {
            Err(DashportError::Interrupted) => {
                tracing::warn!("Export run interrupted, session closed, day not recorded");
                Err(DashportError::Interrupted)
            }
            Ok(()) => {
                let summary = summary.with_duration(elapsed);
                summary.log_summary();
                Ok(summary)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Export run aborted");
                Err(e)
            }
        }
    }

    /// Launch a session, retrying up to the launch budget
    async fn launch_portal(&self) -> Result<F::Portal> {
        let max_attempts = self.config.export.launch_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.factory.launch().await {
                Ok(portal) => {
                    tracing::info!(attempt, "Browser session ready");
                    return Ok(portal);
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(DashportError::Session(format!(
                        "Browser session failed after {max_attempts} attempts: {e}"
                    )));
                }
                Err(e) => {
                    crate::log_retry_attempt!(attempt, max_attempts, e);
                    self.pause(self.config.export.waits.launch_retry_wait())
                        .await?;
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once a shutdown is requested; never without a receiver
    async fn shutdown_signal(&self) {
        match self.shutdown.clone() {
            Some(mut rx) => {
                if rx.wait_for(|stop| *stop).await.is_err() {
                    // Sender dropped without a request
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Sleep on the clock unless a shutdown was requested
    async fn pause(&self, duration: Duration) -> Result<()> {
        if self.shutdown_requested() {
            return Err(DashportError::Interrupted);
        }
        self.clock.sleep(duration).await;
        Ok(())
    }

    async fn drive(
        &self,
        portal: &F::Portal,
        window: &RunWindow,
        run_date: NaiveDate,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let export = &self.config.export;
        let mut machine =
            TopicExportMachine::new(self.topics.clone(), export.max_retries, export.export_timeout());

        loop {
            let records = self.poll(portal).await?;
            let counts =
                machine.apply_poll(&records, &self.classifier, run_date, self.clock.now());
            tracing::info!(
                pending = counts.pending,
                exporting = counts.exporting,
                exported = counts.exported,
                failed = counts.failed,
                "Export status"
            );

            match machine.next_dispatch(self.clock.now()) {
                Dispatch::AwaitExports {
                    exporting,
                    lowest_progress,
                } => {
                    let wait = if lowest_progress < export.slow_progress_threshold {
                        export.waits.export_check()
                    } else {
                        export.waits.fast_poll()
                    };
                    tracing::info!(
                        exporting = exporting.len(),
                        progress = lowest_progress,
                        wait_secs = wait.as_secs(),
                        "Exports running, waiting before next poll"
                    );
                    self.pause(wait).await?;
                }
                Dispatch::StartExport(id) => {
                    let topic = self.topics.get(id).ok_or_else(|| {
                        DashportError::Other(format!("Topic {id} missing from table"))
                    })?;
                    self.attempt_export(portal, &mut machine, topic, window, summary)
                        .await?;
                }
                Dispatch::Finalize => break,
            }
        }

        summary.exported = machine.exported_names();
        summary.failed = machine.failures();
        tracing::info!(
            exported = summary.exported.len(),
            failed = summary.failed.len(),
            "All topics settled"
        );

        let outcome = self.finalizer.finalize(portal, run_date).await?;
        summary.rows_selected = outcome.rows_selected;
        summary.archive = outcome.archive;
        summary.errors.extend(outcome.errors);

        self.ledger.mark_complete_on(run_date)?;
        summary.ledger_marked = true;
        tracing::info!(ledger = %self.ledger.path().display(), "Run recorded");
        Ok(())
    }

    /// Read the record table, retrying transient failures
    async fn poll(&self, portal: &F::Portal) -> Result<Vec<ExportRecord>> {
        let max_attempts = self.config.export.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match portal.list_records().await {
                Ok(records) => return Ok(records),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => {
                    return Err(DashportError::Session(format!(
                        "Export records unreadable after {attempt} attempts: {e}"
                    )));
                }
                Err(e) => {
                    crate::log_retry_attempt!(attempt, max_attempts, e);
                    self.pause(self.config.export.waits.retry_wait()).await?;
                    if let Err(e) = portal.reload().await {
                        tracing::warn!(error = %e, "Reload before poll retry failed");
                    }
                }
            }
        }
    }

    /// Run one attempt of a topic's export sequence and record the outcome
    async fn attempt_export(
        &self,
        portal: &F::Portal,
        machine: &mut TopicExportMachine,
        topic: &Topic,
        window: &RunWindow,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let waits = &self.config.export.waits;
        let max_attempts = self.config.export.max_retries.max(1);
        let attempt = machine.attempts(topic.id) + 1;
        tracing::info!(topic = %topic.name, attempt, max_attempts, "Exporting topic");

        let begun = self.clock.now();
        match portal.export_topic(topic, window).await {
            Ok(()) => {
                machine.record_started(topic.id, begun);
                self.pause(waits.animation()).await?;
            }
            Err(e) => {
                summary.add_error(
                    RunError::new(RunErrorType::Export, e.to_string())
                        .with_context(format!("topic={} attempt={attempt}", topic.name)),
                );
                match machine.record_attempt_failure(topic.id, &e.to_string()) {
                    AttemptOutcome::Retry { attempt } => {
                        crate::log_retry_attempt!(attempt, max_attempts, e);
                        if let Err(reload_err) = portal.reload().await {
                            tracing::warn!(error = %reload_err, "Reload after failed attempt failed");
                        }
                        self.pause(waits.retry_wait()).await?;
                    }
                    AttemptOutcome::Exhausted => {
                        tracing::error!(
                            topic = %topic.name,
                            attempts = max_attempts,
                            error = %e,
                            "Topic failed, giving up for this run"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
