//! Status text classification
//!
//! The dashboard reports export state as free text in the record table. This
//! module maps that text onto a small closed set of outcomes.

use crate::config::StatusTextConfig;
use crate::domain::{DashportError, Result};
use regex::Regex;

/// Classified status of one export record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Export finished
    Succeeded,
    /// Export queued or running; unrecognized text also lands here
    InProgress {
        /// Percentage parsed from the text, 0 when absent
        progress: u8,
        /// Raw text
        raw: String,
    },
    /// Export failed on the dashboard
    Failed {
        /// Raw text
        raw: String,
    },
}

impl RecordStatus {
    /// Precedence when several rows describe the same topic
    pub fn rank(&self) -> u8 {
        match self {
            RecordStatus::Succeeded => 2,
            RecordStatus::InProgress { .. } => 1,
            RecordStatus::Failed { .. } => 0,
        }
    }

    /// Whether the dashboard reported a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, RecordStatus::Failed { .. })
    }
}

/// Keyword-based classifier
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    success: Vec<String>,
    exporting: Vec<String>,
    failed: Vec<String>,
    progress: Regex,
}

impl StatusClassifier {
    /// Build a classifier from configured keywords
    ///
    /// # Errors
    ///
    /// Returns an error if the progress pattern fails to compile
    pub fn new(config: &StatusTextConfig) -> Result<Self> {
        let keep = |words: &[String]| {
            words
                .iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
        };
        let progress = Regex::new(r"(\d+)\s*%")
            .map_err(|e| DashportError::Other(format!("progress pattern: {e}")))?;
        Ok(Self {
            success: keep(&config.success),
            exporting: keep(&config.exporting),
            failed: keep(&config.failed),
            progress,
        })
    }

    /// Classify raw status text
    ///
    /// Success keywords win over failure keywords, which win over everything
    /// else.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashport::config::StatusTextConfig;
    /// use dashport::core::export::classify::{RecordStatus, StatusClassifier};
    ///
    /// let classifier = StatusClassifier::new(&StatusTextConfig::default()).unwrap();
    /// assert_eq!(classifier.classify("导出成功"), RecordStatus::Succeeded);
    /// assert!(matches!(
    ///     classifier.classify("正在导出 45%"),
    ///     RecordStatus::InProgress { progress: 45, .. }
    /// ));
    /// ```
    pub fn classify(&self, raw: &str) -> RecordStatus {
        let text = raw.trim();

        if self.success.iter().any(|k| text.contains(k.as_str())) {
            return RecordStatus::Succeeded;
        }
        if self.failed.iter().any(|k| text.contains(k.as_str())) {
            return RecordStatus::Failed {
                raw: text.to_string(),
            };
        }
        if !self.exporting.iter().any(|k| text.contains(k.as_str())) {
            tracing::debug!(status = %text, "Unrecognized status text, treating as in progress");
        }
        RecordStatus::InProgress {
            progress: self.parse_progress(text),
            raw: text.to_string(),
        }
    }

    /// Whether raw text contains a success keyword
    pub fn is_success(&self, raw: &str) -> bool {
        self.success.iter().any(|k| raw.contains(k.as_str()))
    }

    /// First `NN%` in the text, clamped to 100
    pub fn parse_progress(&self, text: &str) -> u8 {
        self.progress
            .captures(text)
            .and_then(|cap| cap[1].parse::<u32>().ok())
            .map(|p| p.min(100) as u8)
            .unwrap_or(0)
    }
}
