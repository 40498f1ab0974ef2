//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting the outcome of
//! one export run.

use crate::domain::FailureReason;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Local time the run started
    pub started_at: Option<NaiveDateTime>,

    /// Total number of configured topics
    pub total_topics: usize,

    /// Topics whose export completed
    pub exported: Vec<String>,

    /// Topics given up on, with the reason
    pub failed: Vec<(String, FailureReason)>,

    /// Rows selected for the batch download
    pub rows_selected: usize,

    /// Archive path after renaming, when one was found
    pub archive: Option<PathBuf>,

    /// Whether the day was recorded in the ledger
    pub ledger_marked: bool,

    /// Duration of the run
    pub duration: Duration,

    /// Non-fatal errors encountered during the run
    pub errors: Vec<RunError>,
}

impl RunSummary {
    /// Create a new empty summary
    pub fn new(total_topics: usize) -> Self {
        Self {
            started_at: None,
            total_topics,
            exported: Vec::new(),
            failed: Vec::new(),
            rows_selected: 0,
            archive: None,
            ledger_marked: false,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    /// Every topic exported and the day recorded
    pub fn is_successful(&self) -> bool {
        self.failed.is_empty() && self.ledger_marked && self.exported.len() == self.total_topics
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_topics = self.total_topics,
            exported = self.exported.len(),
            failed = self.failed.len(),
            rows_selected = self.rows_selected,
            archive = ?self.archive,
            ledger_marked = self.ledger_marked,
            duration_secs = self.duration.as_secs(),
            "Export run completed"
        );

        for (topic, reason) in &self.failed {
            tracing::warn!(topic = %topic, reason = %reason, "Topic not exported");
        }

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export run completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Run error"
                );
            }
        }
    }
}

/// Stage a non-fatal error came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorType {
    /// Browser session launch or close
    Session,
    /// Reading the record table
    Poll,
    /// One topic's export sequence
    Export,
    /// Organizing the downloaded archive
    Archive,
    /// Revealing the downloads folder
    Notify,
}

/// Non-fatal run error with context
#[derive(Debug, Clone)]
pub struct RunError {
    /// Type of error
    pub error_type: RunErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., topic name)
    pub context: Option<String>,
}

impl RunError {
    /// Create a new run error
    pub fn new(error_type: RunErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
