//! Batch finalizer
//!
//! Runs once no topic is pending or exporting: ticks today's successful rows,
//! presses the batch download, lets the download land, then renames the
//! archive and reveals the folder. Only the download trigger is fatal.

use crate::adapters::dashboard::{DownloadTrigger, ExportPortal};
use crate::adapters::files::{DownloadProcessor, FolderNotifier};
use crate::core::clock::Clock;
use crate::core::export::classify::StatusClassifier;
use crate::core::export::summary::{RunError, RunErrorType};
use crate::domain::{DashportError, ExportRecord, Result, TopicTable};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Result of a finalize pass
#[derive(Debug)]
pub struct FinalizeOutcome {
    /// Rows ticked for the batch download
    pub rows_selected: usize,
    /// Path that pressed the batch button
    pub trigger: DownloadTrigger,
    /// Renamed archive, if one was found
    pub archive: Option<PathBuf>,
    /// Post-processing failures
    pub errors: Vec<RunError>,
}

/// Indices of the run's successful rows that belong to a configured topic
///
/// Rows count from `run_date` on, so a run that crosses midnight keeps its
/// own rows. A row belongs to a topic when its title starts with the topic
/// name.
pub fn select_batch_rows(
    records: &[ExportRecord],
    topics: &TopicTable,
    classifier: &StatusClassifier,
    run_date: NaiveDate,
) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_since(run_date) && classifier.is_success(&r.status))
        .filter(|(_, r)| topics.iter().any(|t| r.belongs_to(&t.name)))
        .map(|(i, _)| i)
        .collect()
}

/// Final batch download and post-processing
pub struct BatchFinalizer {
    topics: TopicTable,
    classifier: StatusClassifier,
    folder: PathBuf,
    settle: Duration,
    processor: Arc<dyn DownloadProcessor>,
    notifier: Arc<dyn FolderNotifier>,
    clock: Arc<dyn Clock>,
}

impl BatchFinalizer {
    /// Create a finalizer
    ///
    /// # Arguments
    ///
    /// * `folder` - Download folder handed to the processor and notifier
    /// * `settle` - Wait between the download click and post-processing
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topics: TopicTable,
        classifier: StatusClassifier,
        folder: PathBuf,
        settle: Duration,
        processor: Arc<dyn DownloadProcessor>,
        notifier: Arc<dyn FolderNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            topics,
            classifier,
            folder,
            settle,
            processor,
            notifier,
            clock,
        }
    }

    /// Run the finalize pass
    ///
    /// # Errors
    ///
    /// Returns a finalize error if the records cannot be read or ticked, or
    /// if the batch download cannot be triggered by any path
    pub async fn finalize<P: ExportPortal + ?Sized>(
        &self,
        portal: &P,
        run_date: NaiveDate,
    ) -> Result<FinalizeOutcome> {
        tracing::info!("Starting batch download");

        let records = portal
            .list_records()
            .await
            .map_err(|e| DashportError::Finalize(format!("Failed to read records: {e}")))?;

        let indices = select_batch_rows(&records, &self.topics, &self.classifier, run_date);
        for &i in &indices {
            let row = &records[i];
            tracing::debug!(title = %row.title, time = %row.time, status = %row.status, "Row selected");
        }
        if indices.is_empty() {
            tracing::warn!(run_date = %run_date, "No successful rows from this run to download");
        }

        let rows_selected = portal
            .select_rows(&indices)
            .await
            .map_err(|e| DashportError::Finalize(format!("Failed to select rows: {e}")))?;
        if rows_selected != indices.len() {
            tracing::warn!(
                expected = indices.len(),
                selected = rows_selected,
                "Not every row could be selected"
            );
        }

        let trigger = portal.download_selected().await?;
        tracing::info!(trigger = ?trigger, rows = rows_selected, "Batch download triggered");

        self.clock.sleep(self.settle).await;

        let mut errors = Vec::new();
        let archive = match self.processor.process(&self.folder) {
            Ok(archive) => archive,
            Err(e) => {
                tracing::warn!(error = %e, "Archive post-processing failed");
                errors.push(
                    RunError::new(RunErrorType::Archive, e.to_string())
                        .with_context(self.folder.display().to_string()),
                );
                None
            }
        };

        if let Err(e) = self.notifier.reveal(&self.folder) {
            tracing::warn!(error = %e, "Failed to reveal downloads folder");
            errors.push(RunError::new(RunErrorType::Notify, e.to_string()));
        }

        Ok(FinalizeOutcome {
            rows_selected,
            trigger,
            archive,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusTextConfig;
    use crate::domain::Topic;

    fn topics() -> TopicTable {
        TopicTable::new(vec![
            Topic::new(1, "健康主词", "非创建者勿动1"),
            Topic::new(2, "健康产品", "产品"),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_batch_rows() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let classifier = StatusClassifier::new(&StatusTextConfig::default()).unwrap();
        let records = vec![
            ExportRecord::new("健康主词_20250102", "2025-01-02 14:10:00", "导出成功"),
            ExportRecord::new("健康产品_20250102", "2025-01-02 14:20:00", "正在导出 40%"),
            ExportRecord::new("健康产品_20250101", "2025-01-01 14:20:00", "导出成功"),
            ExportRecord::new("其他主题_20250102", "2025-01-02 14:30:00", "导出成功"),
            ExportRecord::new("健康产品扩展_20250102", "2025-01-02 14:40:00", "导出成功"),
            // Finished after midnight, still part of the run
            ExportRecord::new("健康产品_20250103", "2025-01-03 00:02:00", "导出成功"),
        ];

        assert_eq!(
            select_batch_rows(&records, &topics(), &classifier, today),
            vec![0, 4, 5]
        );
    }
}
