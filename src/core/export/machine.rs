//! Per-topic export state machine
//!
//! Holds one [`TopicStatus`] for every configured topic and decides what the
//! run loop does next. The machine performs no I/O: the coordinator feeds it
//! poll results and attempt outcomes and acts on the returned [`Dispatch`].
//!
//! Transitions:
//!
//! ```text
//! Pending --started/observed--> Exporting --observed success--> Exported
//!    ^                              |
//!    +------ remote failure --------+
//!    |                              |
//!    +--attempts exhausted--> Failed <--timeout
//! ```
//!
//! A failure row reported for an export this run started uses one attempt of
//! the topic's budget, like a failed export sequence. Failure rows older than
//! the topic's latest start are ignored. Exported and Failed are terminal for
//! the rest of the run.

use crate::core::export::classify::{RecordStatus, StatusClassifier};
use crate::domain::{ExportRecord, FailureReason, Topic, TopicId, TopicStatus, TopicTable};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use std::time::Duration;

/// What the run loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// At least one export is running; wait and poll again
    AwaitExports {
        /// Topics currently exporting
        exporting: Vec<TopicId>,
        /// Lowest reported progress among them
        lowest_progress: u8,
    },
    /// Nothing is running; start this topic
    StartExport(TopicId),
    /// Every topic is Exported or Failed
    Finalize,
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Budget left; the topic stays Pending
    Retry {
        /// Attempts used so far
        attempt: u32,
    },
    /// Budget spent; the topic is now Failed
    Exhausted,
}

/// Count of topics per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Not yet started
    pub pending: usize,
    /// Running
    pub exporting: usize,
    /// Finished
    pub exported: usize,
    /// Given up
    pub failed: usize,
}

impl StatusCounts {
    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.pending + self.exporting + self.exported + self.failed
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    status: TopicStatus,
    attempts: u32,
    watch_since: Option<NaiveDateTime>,
    /// Start of the latest export sequence whose outcome is still open
    started_at: Option<NaiveDateTime>,
}

impl Entry {
    /// Whether a failure row belongs to the export being watched
    ///
    /// Without a start of our own, only an export observed running can fail.
    fn owns_failure(&self, record: &ExportRecord) -> bool {
        match (self.started_at, record.created_at()) {
            // Listed times have whole seconds
            (Some(started), Some(created)) => {
                created >= started.with_nanosecond(0).unwrap_or(started)
            }
            (Some(_), None) => false,
            (None, _) => self.status.is_exporting(),
        }
    }
}

/// Status of every topic within one run
#[derive(Debug, Clone)]
pub struct TopicExportMachine {
    topics: TopicTable,
    entries: BTreeMap<TopicId, Entry>,
    max_attempts: u32,
    export_timeout: Duration,
}

impl TopicExportMachine {
    /// Start a run with every topic Pending
    ///
    /// # Arguments
    ///
    /// * `topics` - Fixed topic set
    /// * `max_attempts` - Attempts of the export sequence per topic (at least 1)
    /// * `export_timeout` - Ceiling on watching one topic's export
    pub fn new(topics: TopicTable, max_attempts: u32, export_timeout: Duration) -> Self {
        let entries = topics.iter().map(|t| (t.id, Entry::default())).collect();
        Self {
            topics,
            entries,
            max_attempts: max_attempts.max(1),
            export_timeout,
        }
    }

    /// Status of one topic
    pub fn status(&self, id: TopicId) -> Option<&TopicStatus> {
        self.entries.get(&id).map(|e| &e.status)
    }

    /// Attempts used by one topic
    pub fn attempts(&self, id: TopicId) -> u32 {
        self.entries.get(&id).map(|e| e.attempts).unwrap_or(0)
    }

    /// Every topic with its status, in id order
    pub fn statuses(&self) -> Vec<(&Topic, &TopicStatus)> {
        self.topics
            .iter()
            .filter_map(|t| self.entries.get(&t.id).map(|e| (t, &e.status)))
            .collect()
    }

    /// Count topics per status
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in self.entries.values() {
            match entry.status {
                TopicStatus::Pending => counts.pending += 1,
                TopicStatus::Exporting { .. } => counts.exporting += 1,
                TopicStatus::Exported => counts.exported += 1,
                TopicStatus::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// Update statuses from one read of the record table
    ///
    /// Only rows created on `run_date` or later count. A row matches a topic
    /// when its title up to the first `_` equals the topic name. When several
    /// rows match, success beats in-progress beats failure. A failure row
    /// counts only for an export this run started, and only once. Topics
    /// without a matching row keep their status; terminal topics never change.
    pub fn apply_poll(
        &mut self,
        records: &[ExportRecord],
        classifier: &StatusClassifier,
        run_date: NaiveDate,
        now: NaiveDateTime,
    ) -> StatusCounts {
        let max_attempts = self.max_attempts;
        let recent: Vec<&ExportRecord> = records.iter().filter(|r| r.is_since(run_date)).collect();

        for topic in self.topics.iter() {
            let Some(entry) = self.entries.get_mut(&topic.id) else {
                continue;
            };
            if entry.status.is_terminal() {
                continue;
            }

            let observed = recent
                .iter()
                .filter(|r| r.matches_topic(&topic.name))
                .map(|r| (classifier.classify(&r.status), *r))
                .filter(|(status, r)| !status.is_failure() || entry.owns_failure(r))
                .map(|(status, _)| status)
                .max_by_key(RecordStatus::rank);

            let Some(observed) = observed else {
                continue;
            };

            let next = match observed {
                RecordStatus::Succeeded => TopicStatus::Exported,
                RecordStatus::InProgress { progress, raw } => {
                    entry.watch_since.get_or_insert(now);
                    TopicStatus::Exporting { progress, raw }
                }
                RecordStatus::Failed { raw } => {
                    entry.started_at = None;
                    entry.watch_since = None;
                    if entry.attempts >= max_attempts {
                        TopicStatus::Failed(FailureReason::Remote { status: raw })
                    } else {
                        tracing::warn!(
                            topic = %topic.name,
                            attempt = entry.attempts,
                            max_attempts,
                            status = %raw,
                            "Dashboard reported export failure, topic will be exported again"
                        );
                        TopicStatus::Pending
                    }
                }
            };

            if next != entry.status {
                crate::log_topic_status!(topic.name, &next);
                entry.status = next;
            }
        }

        self.counts()
    }

    /// Decide the next step
    ///
    /// First fails every export watched for longer than the timeout, then:
    /// any topic exporting means wait; otherwise the first pending topic is
    /// started; otherwise the run finalizes.
    pub fn next_dispatch(&mut self, now: NaiveDateTime) -> Dispatch {
        self.expire_overdue(now);

        let exporting: Vec<(TopicId, u8)> = self
            .entries
            .iter()
            .filter_map(|(id, e)| match e.status {
                TopicStatus::Exporting { progress, .. } => Some((*id, progress)),
                _ => None,
            })
            .collect();

        if !exporting.is_empty() {
            let lowest_progress = exporting.iter().map(|(_, p)| *p).min().unwrap_or(0);
            return Dispatch::AwaitExports {
                exporting: exporting.into_iter().map(|(id, _)| id).collect(),
                lowest_progress,
            };
        }

        match self.entries.iter().find(|(_, e)| e.status.is_pending()) {
            Some((id, _)) => Dispatch::StartExport(*id),
            None => Dispatch::Finalize,
        }
    }

    /// The export sequence for `id` completed; the dashboard is now exporting it
    ///
    /// `now` is when the sequence began, so rows the dashboard stamped while
    /// it ran belong to this attempt.
    pub fn record_started(&mut self, id: TopicId, now: NaiveDateTime) {
        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.status.is_terminal() {
                return;
            }
            entry.attempts += 1;
            entry.watch_since = Some(now);
            entry.started_at = Some(now);
            entry.status = TopicStatus::Exporting {
                progress: 0,
                raw: "submitted".to_string(),
            };
        }
    }

    /// The export sequence for `id` failed
    ///
    /// Marks the topic Failed once the attempt budget is spent.
    pub fn record_attempt_failure(&mut self, id: TopicId, error: &str) -> AttemptOutcome {
        let max_attempts = self.max_attempts;
        let Some(entry) = self.entries.get_mut(&id) else {
            return AttemptOutcome::Exhausted;
        };
        if entry.status.is_terminal() {
            return AttemptOutcome::Exhausted;
        }

        entry.attempts += 1;
        if entry.attempts >= max_attempts {
            entry.status = TopicStatus::Failed(FailureReason::RetriesExhausted {
                attempts: entry.attempts,
                last_error: error.to_string(),
            });
            AttemptOutcome::Exhausted
        } else {
            entry.status = TopicStatus::Pending;
            AttemptOutcome::Retry {
                attempt: entry.attempts,
            }
        }
    }

    /// Names of exported topics
    pub fn exported_names(&self) -> Vec<String> {
        self.statuses()
            .into_iter()
            .filter(|(_, s)| matches!(s, TopicStatus::Exported))
            .map(|(t, _)| t.name.clone())
            .collect()
    }

    /// Failed topics with their reasons
    pub fn failures(&self) -> Vec<(String, FailureReason)> {
        self.statuses()
            .into_iter()
            .filter_map(|(t, s)| match s {
                TopicStatus::Failed(reason) => Some((t.name.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }

    fn expire_overdue(&mut self, now: NaiveDateTime) {
        let timeout = self.export_timeout;
        for topic in self.topics.iter() {
            let Some(entry) = self.entries.get_mut(&topic.id) else {
                continue;
            };
            if !entry.status.is_exporting() {
                continue;
            }
            let Some(since) = entry.watch_since else {
                continue;
            };
            let waited = (now - since).to_std().unwrap_or(Duration::ZERO);
            if waited >= timeout {
                tracing::warn!(
                    topic = %topic.name,
                    waited_secs = waited.as_secs(),
                    "Export not finished within timeout"
                );
                entry.status = TopicStatus::Failed(FailureReason::Timeout { waited });
            }
        }
    }
}
