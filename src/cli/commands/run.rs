//! Run command implementation
//!
//! `run` is the long-lived mode: wait for the schedule gate, perform one
//! export run, then wait again for the next workday. Only one instance may run
//! against a ledger at a time.

use super::status::print_history;
use super::{exit_code_for, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK};
use crate::adapters::dashboard::DashboardPortalFactory;
use crate::adapters::files::{
    prepare_folder, DownloadOrganizer, FolderNotifier, OpenFolderNotifier, SilentNotifier,
};
use crate::config::{load_config, DashportConfig};
use crate::core::clock::{Clock, SystemClock};
use crate::core::export::{BatchFinalizer, ExportCoordinator, RunSummary, StatusClassifier};
use crate::core::schedule::LaunchScheduler;
use crate::core::state::{ExecutionLedger, InstanceLock};
use crate::domain::{DashportError, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Exit after one run
    #[arg(long)]
    pub once: bool,

    /// Start the first run immediately, ignoring the trigger time and ledger
    #[arg(long)]
    pub now: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            config_path = %config_path,
            once = self.once,
            now = self.now,
            "Starting run command"
        );

        let config = match load_config(config_path) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Configuration could not be loaded");
                eprintln!("Configuration error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let lock_path = InstanceLock::path_for(Path::new(&config.ledger.path));
        let _lock = match InstanceLock::acquire(&lock_path) {
            Ok(lock) => lock,
            Err(e) => {
                tracing::error!(error = %e, "Instance lock unavailable");
                eprintln!("❌ {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        match self.run_loop(config, clock, shutdown_signal).await {
            Ok(()) => Ok(EXIT_OK),
            Err(DashportError::Interrupted) => {
                tracing::warn!("Shutdown requested, run command stopped");
                println!("⚠️  Interrupted; today's run is recorded only if it completed.");
                Ok(EXIT_INTERRUPTED)
            }
            Err(e) => {
                crate::log_error_with_context!(&e, "Run command stopped");
                eprintln!("❌ {e}");
                Ok(exit_code_for(&e))
            }
        }
    }

    async fn run_loop(
        &self,
        config: Arc<DashportConfig>,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let ledger = Arc::new(ExecutionLedger::new(&config.ledger.path, clock.clone()));
        let scheduler = LaunchScheduler::from_config(&config.schedule, clock.clone())?;
        print_history(&ledger, scheduler.calendar(), config.ledger.history_days)?;

        // A run in progress handles the signal itself so it can close its session
        let coordinator =
            build_coordinator(config, clock, ledger.clone())?.with_shutdown(shutdown.clone());

        let mut skip_gate = self.now;
        loop {
            if skip_gate {
                tracing::info!("Schedule gate skipped for this run");
                skip_gate = false;
            } else {
                let mut stop = shutdown.clone();
                tokio::select! {
                    biased;
                    Ok(_) = stop.wait_for(|stop| *stop) => return Err(DashportError::Interrupted),
                    ready = scheduler.wait_until_ready(&ledger) => ready?,
                }
            }

            println!("🚀 Starting export run...");
            let summary = coordinator.execute_run().await?;
            print_summary(&summary);

            if self.once {
                return Ok(());
            }
        }
    }
}

/// Wire the production coordinator: WebDriver portal, archive organizer and
/// folder notifier
///
/// # Errors
///
/// Returns an error if the configuration cannot produce a topic table,
/// classifier or selectors, or the download folder cannot be created
pub fn build_coordinator(
    config: Arc<DashportConfig>,
    clock: Arc<dyn Clock>,
    ledger: Arc<ExecutionLedger>,
) -> Result<ExportCoordinator<DashboardPortalFactory>> {
    let folder = prepare_folder(Path::new(&config.downloads.folder))?;
    let notifier: Arc<dyn FolderNotifier> = if config.downloads.open_folder {
        Arc::new(OpenFolderNotifier)
    } else {
        Arc::new(SilentNotifier)
    };

    let finalizer = BatchFinalizer::new(
        config.topic_table().map_err(DashportError::Configuration)?,
        StatusClassifier::new(&config.status_text)?,
        folder,
        config.export.waits.file_download(),
        Arc::new(DownloadOrganizer::from_config(&config.downloads)),
        notifier,
        clock.clone(),
    );
    let factory = DashboardPortalFactory::new(config.clone(), clock.clone())?;

    ExportCoordinator::new(config, factory, ledger, finalizer, clock)
}

/// Print a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("📊 Run Summary:");
    if let Some(started) = summary.started_at {
        println!("  Started: {}", started.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!(
        "  Exported: {}/{}",
        summary.exported.len(),
        summary.total_topics
    );
    for (topic, reason) in &summary.failed {
        println!("  ❌ {topic}: {reason}");
    }
    println!("  Rows downloaded: {}", summary.rows_selected);
    match &summary.archive {
        Some(path) => println!("  Archive: {}", path.display()),
        None => println!("  Archive: not found"),
    }
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        println!();
    }

    if summary.is_successful() {
        println!("✅ Run completed successfully!");
    } else {
        println!("⚠️  Run completed with failures");
    }
}
