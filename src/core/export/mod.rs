//! Export orchestration
//!
//! This module provides the core export logic for Dashport, including:
//! - Classification of the dashboard's status text
//! - The per-topic export state machine
//! - Run coordination, batch finalization and reporting

pub mod classify;
pub mod coordinator;
pub mod finalizer;
pub mod machine;
pub mod summary;
pub mod window;

pub use classify::{RecordStatus, StatusClassifier};
pub use coordinator::ExportCoordinator;
pub use finalizer::{select_batch_rows, BatchFinalizer, FinalizeOutcome};
pub use machine::{AttemptOutcome, Dispatch, StatusCounts, TopicExportMachine};
pub use summary::{RunError, RunErrorType, RunSummary};
pub use window::RunWindow;
