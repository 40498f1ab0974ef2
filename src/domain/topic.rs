//! Topic identity and per-run export status
//!
//! A topic is one named export target on the dashboard. The set of topics is
//! fixed by configuration; only their status changes during a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Topic identifier newtype wrapper
///
/// # Examples
///
/// ```
/// use dashport::domain::topic::TopicId;
/// use std::str::FromStr;
///
/// let id = TopicId::from_str("3").unwrap();
/// assert_eq!(id.get(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(u32);

impl TopicId {
    /// Creates a new TopicId
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric id
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TopicId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|e| format!("Invalid topic id '{s}': {e}"))
    }
}

/// One export target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Stable identifier
    pub id: TopicId,

    /// Display name, as shown in the topic tree and in export record titles
    pub name: String,

    /// Folder of the topic tree that contains this topic
    pub folder: String,
}

impl Topic {
    /// Create a topic
    pub fn new(id: u32, name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            id: TopicId::new(id),
            name: name.into(),
            folder: folder.into(),
        }
    }
}

/// The fixed, ordered set of topics handled by a run
#[derive(Debug, Clone, Default)]
pub struct TopicTable {
    topics: Vec<Topic>,
}

impl TopicTable {
    /// Build a table, ordering topics by id
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty, or ids or names repeat, or a
    /// name is blank.
    pub fn new(mut topics: Vec<Topic>) -> Result<Self, String> {
        if topics.is_empty() {
            return Err("topic table cannot be empty".to_string());
        }
        topics.sort_by_key(|t| t.id);

        for pair in topics.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(format!("duplicate topic id {}", pair[0].id));
            }
        }
        for (i, topic) in topics.iter().enumerate() {
            if topic.name.trim().is_empty() {
                return Err(format!("topic {} has an empty name", topic.id));
            }
            if topic.folder.trim().is_empty() {
                return Err(format!("topic {} has an empty folder", topic.id));
            }
            if topics[..i].iter().any(|other| other.name == topic.name) {
                return Err(format!("duplicate topic name '{}'", topic.name));
            }
        }

        Ok(Self { topics })
    }

    /// Look up a topic by id
    pub fn get(&self, id: TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Iterate topics in id order
    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    /// All topic ids in order
    pub fn ids(&self) -> Vec<TopicId> {
        self.topics.iter().map(|t| t.id).collect()
    }

    /// All topic names in id order
    pub fn names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of topics
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Why a topic ended the run without being exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every attempt of the export sequence failed
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: String,
    },
    /// The export was not observed as finished within the ceiling
    Timeout {
        /// How long the topic was watched
        waited: Duration,
    },
    /// The dashboard reported the export as failed
    Remote {
        /// Raw status text
        status: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempt(s): {last_error}"),
            FailureReason::Timeout { waited } => {
                write!(f, "not exported after {}s", waited.as_secs())
            }
            FailureReason::Remote { status } => write!(f, "dashboard reported '{status}'"),
        }
    }
}

/// Export status of one topic within one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicStatus {
    /// No export observed or started yet
    #[default]
    Pending,
    /// Export started or running on the dashboard
    Exporting {
        /// Reported progress, 0-100
        progress: u8,
        /// Raw status text as shown by the dashboard
        raw: String,
    },
    /// Export finished successfully
    Exported,
    /// Export gave up
    Failed(FailureReason),
}

impl TopicStatus {
    /// Exported and Failed are final within a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, TopicStatus::Exported | TopicStatus::Failed(_))
    }

    /// Whether an export is in flight
    pub fn is_exporting(&self) -> bool {
        matches!(self, TopicStatus::Exporting { .. })
    }

    /// Whether the topic still needs to be started
    pub fn is_pending(&self) -> bool {
        matches!(self, TopicStatus::Pending)
    }

    /// Short label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            TopicStatus::Pending => "pending",
            TopicStatus::Exporting { .. } => "exporting",
            TopicStatus::Exported => "exported",
            TopicStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicStatus::Exporting { progress, raw } => write!(f, "exporting {progress}% ({raw})"),
            TopicStatus::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_topics() -> Vec<Topic> {
        vec![
            Topic::new(2, "Health-2", "Products"),
            Topic::new(1, "Health-1", "Products"),
            Topic::new(9, "Health-main", "Shared"),
        ]
    }

    #[test]
    fn test_topic_id_from_str() {
        assert_eq!(TopicId::from_str(" 7 ").unwrap(), TopicId::new(7));
        assert!(TopicId::from_str("seven").is_err());
    }

    #[test]
    fn test_table_sorted_by_id() {
        let table = TopicTable::new(sample_topics()).unwrap();
        assert_eq!(
            table.ids(),
            vec![TopicId::new(1), TopicId::new(2), TopicId::new(9)]
        );
        assert_eq!(table.names(), vec!["Health-1", "Health-2", "Health-main"]);
        assert_eq!(table.get(TopicId::new(9)).unwrap().folder, "Shared");
        assert!(table.get(TopicId::new(4)).is_none());
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let mut topics = sample_topics();
        topics.push(Topic::new(1, "Other", "Products"));
        assert!(TopicTable::new(topics).unwrap_err().contains("duplicate topic id"));

        let mut topics = sample_topics();
        topics.push(Topic::new(4, "Health-1", "Products"));
        assert!(TopicTable::new(topics)
            .unwrap_err()
            .contains("duplicate topic name"));
    }

    #[test]
    fn test_table_rejects_empty() {
        assert!(TopicTable::new(vec![]).is_err());
        assert!(TopicTable::new(vec![Topic::new(1, " ", "Products")]).is_err());
    }

    #[test]
    fn test_status_predicates() {
        assert!(TopicStatus::Pending.is_pending());
        assert!(TopicStatus::Exported.is_terminal());
        assert!(TopicStatus::Failed(FailureReason::Remote {
            status: "failed".to_string()
        })
        .is_terminal());
        let exporting = TopicStatus::Exporting {
            progress: 40,
            raw: "exporting 40%".to_string(),
        };
        assert!(exporting.is_exporting());
        assert!(!exporting.is_terminal());
        assert_eq!(exporting.to_string(), "exporting 40% (exporting 40%)");
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::RetriesExhausted {
            attempts: 3,
            last_error: "boom".to_string(),
        };
        assert_eq!(reason.to_string(), "gave up after 3 attempt(s): boom");

        let reason = FailureReason::Timeout {
            waited: Duration::from_secs(1800),
        };
        assert_eq!(reason.to_string(), "not exported after 1800s");
    }
}
