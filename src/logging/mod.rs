//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! JSON rolling-file layer.
//!
//! # Example
//!
//! ```no_run
//! use dashport::logging::init_logging;
//! use dashport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(topic = "Health-1", "Export started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use dashport::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "element not found");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log a topic status change observed by a poll
///
/// # Example
///
/// ```no_run
/// use dashport::log_topic_status;
/// use dashport::domain::TopicStatus;
///
/// log_topic_status!("Health-1", &TopicStatus::Exported);
/// ```
#[macro_export]
macro_rules! log_topic_status {
    ($topic:expr, $status:expr) => {
        tracing::info!(
            topic = %$topic,
            status = $status.label(),
            detail = %$status,
            "Topic status"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use dashport::log_error_with_context;
/// use dashport::domain::DashportError;
///
/// let error = DashportError::Ledger("disk full".to_string());
/// log_error_with_context!(&error, "Failed to mark run complete");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
