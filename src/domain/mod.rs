//! Domain models and types for Dashport.
//!
//! The domain layer provides:
//! - **Topics** ([`Topic`], [`TopicId`], [`TopicTable`]) and their per-run
//!   [`TopicStatus`]
//! - **Export records** ([`ExportRecord`]) read from the download page
//! - **Error types** ([`DashportError`], [`ActuatorError`], [`ExportStep`])
//! - **Result type alias** ([`Result`])
//!
//! ```rust
//! use dashport::domain::{ExportRecord, Topic, TopicTable};
//!
//! # fn example() -> Result<(), String> {
//! let table = TopicTable::new(vec![Topic::new(1, "Health-1", "Products")])?;
//! let record = ExportRecord::new("Health-1_20250102", "2025-01-02 14:31:07", "导出成功");
//! assert!(table.iter().any(|t| record.matches_topic(&t.name)));
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod record;
pub mod result;
pub mod topic;

pub use errors::{ActuatorError, DashportError, ExportStep};
pub use record::ExportRecord;
pub use result::Result;
pub use topic::{FailureReason, Topic, TopicId, TopicStatus, TopicTable};
