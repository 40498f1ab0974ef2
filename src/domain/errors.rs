//! Domain error types
//!
//! This module defines the error hierarchy for Dashport.
//! All errors are domain-specific and don't expose third-party types.

use std::fmt;
use thiserror::Error;

/// Main Dashport error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DashportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Browser actuator errors (transport, protocol, missing elements)
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// A verified step of the per-topic export sequence failed
    #[error("Step '{step}' failed: {message}")]
    Step {
        /// Step that failed
        step: ExportStep,
        /// What went wrong
        message: String,
    },

    /// Execution ledger errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Browser session launch errors
    #[error("Session error: {0}")]
    Session(String),

    /// Batch finalize errors
    #[error("Finalize error: {0}")]
    Finalize(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A shutdown signal stopped the run before it completed
    #[error("Run interrupted by shutdown signal")]
    Interrupted,

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl DashportError {
    /// Build a step failure
    pub fn step(step: ExportStep, message: impl Into<String>) -> Self {
        DashportError::Step {
            step,
            message: message.into(),
        }
    }

    /// Whether the error is a transient UI failure worth retrying
    ///
    /// Ledger, configuration and finalize failures are fatal for a run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashportError::Actuator(_) | DashportError::Step { .. } | DashportError::Session(_)
        )
    }
}

/// Errors raised by a UI actuator
///
/// These errors don't expose the HTTP client types of the concrete driver.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The driver endpoint could not be reached
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The driver answered with an error payload
    #[error("Protocol error '{error}': {message}")]
    Protocol {
        /// Driver error code (e.g. "no such element")
        error: String,
        /// Driver error message
        message: String,
    },

    /// No element matched the selector
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A wait did not complete in time
    #[error("Timed out after {after_ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        after_ms: u64,
    },

    /// An in-page script failed or returned an unexpected value
    #[error("Script error: {0}")]
    Script(String),

    /// A selector string could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Named steps of the per-topic export sequence, used for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStep {
    /// Open the topic-selection page
    OpenTopicPage,
    /// Expand the folder holding the topic and pick the topic
    SelectTopic,
    /// Open the custom time range controls
    OpenCustomRange,
    /// Fill the start time input
    SetStartTime,
    /// Fill the end time input
    SetEndTime,
    /// Check that start <= end
    VerifyTimeRange,
    /// Tick the "all sources" checkbox
    SelectAllSources,
    /// Untick an excluded source checkbox
    ExcludeSource,
    /// Add the extra source from the nested menu
    AddExtraSource,
    /// Submit the filter and wait for data
    ApplyFilter,
    /// Press export and confirm
    TriggerExport,
}

impl fmt::Display for ExportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportStep::OpenTopicPage => "open_topic_page",
            ExportStep::SelectTopic => "select_topic",
            ExportStep::OpenCustomRange => "open_custom_range",
            ExportStep::SetStartTime => "set_start_time",
            ExportStep::SetEndTime => "set_end_time",
            ExportStep::VerifyTimeRange => "verify_time_range",
            ExportStep::SelectAllSources => "select_all_sources",
            ExportStep::ExcludeSource => "exclude_source",
            ExportStep::AddExtraSource => "add_extra_source",
            ExportStep::ApplyFilter => "apply_filter",
            ExportStep::TriggerExport => "trigger_export",
        };
        f.write_str(name)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DashportError {
    fn from(err: std::io::Error) -> Self {
        DashportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DashportError {
    fn from(err: serde_json::Error) -> Self {
        DashportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DashportError {
    fn from(err: toml::de::Error) -> Self {
        DashportError::Configuration(format!("TOML parse error: {err}"))
    }
}
