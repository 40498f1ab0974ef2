//! Core business logic for Dashport.
//!
//! This module contains the scheduling and orchestration logic of a run.
//!
//! # Modules
//!
//! - [`calendar`] - Workday and holiday arithmetic
//! - [`clock`] - Injectable time source
//! - [`schedule`] - Workday + trigger-time gate
//! - [`state`] - Execution ledger and single-instance lock
//! - [`export`] - Topic state machine, coordinator and batch finalizer
//!
//! # Run Workflow
//!
//! 1. **Wait**: Sleep until a workday's trigger time with no completed run
//! 2. **Launch**: Start a browser session and open the records page
//! 3. **Poll**: Read today's records and update every topic's status
//! 4. **Dispatch**: Wait while exports run, otherwise export the next pending topic
//! 5. **Finalize**: Download today's successful rows as one archive and rename it
//! 6. **Record**: Mark the day in the ledger
//!
//! # Example
//!
//! ```rust,no_run
//! use dashport::adapters::dashboard::DashboardPortalFactory;
//! use dashport::adapters::files::{DownloadOrganizer, OpenFolderNotifier};
//! use dashport::config::load_config;
//! use dashport::core::clock::{Clock, SystemClock};
//! use dashport::core::export::{BatchFinalizer, ExportCoordinator, StatusClassifier};
//! use dashport::core::state::ExecutionLedger;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(load_config("dashport.toml")?);
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!
//! let ledger = Arc::new(ExecutionLedger::new(&config.ledger.path, clock.clone()));
//! let finalizer = BatchFinalizer::new(
//!     config.topic_table()?,
//!     StatusClassifier::new(&config.status_text)?,
//!     PathBuf::from(&config.downloads.folder),
//!     config.export.waits.file_download(),
//!     Arc::new(DownloadOrganizer::from_config(&config.downloads)),
//!     Arc::new(OpenFolderNotifier),
//!     clock.clone(),
//! );
//! let factory = DashboardPortalFactory::new(config.clone(), clock.clone())?;
//! let coordinator = ExportCoordinator::new(config, factory, ledger, finalizer, clock)?;
//!
//! let summary = coordinator.execute_run().await?;
//! println!("Exported: {}", summary.exported.len());
//! println!("Failed: {}", summary.failed.len());
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod clock;
pub mod export;
pub mod schedule;
pub mod state;
