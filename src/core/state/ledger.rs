//! Execution ledger
//!
//! A small JSON file mapping local dates (`YYYYMMDD`) to whether a full run
//! completed on that day. It is the only state that survives between runs.

use crate::core::clock::Clock;
use crate::domain::{DashportError, Result};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Date key format of the ledger file
pub const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// Ledger file contents
type Entries = BTreeMap<String, bool>;

/// Per-day completion record
pub struct ExecutionLedger {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ExecutionLedger {
    /// Create a ledger backed by `path`
    ///
    /// The file is not touched until the first read or write.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a run completed today
    ///
    /// Creates an empty ledger file if none exists.
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Ledger` if the file cannot be created, read or
    /// parsed.
    pub fn has_run_today(&self) -> Result<bool> {
        self.has_run_on(self.clock.today())
    }

    /// Whether a run completed on `date`
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Ledger` on I/O or parse failure
    pub fn has_run_on(&self, date: NaiveDate) -> Result<bool> {
        let entries = self.load()?;
        Ok(entries.get(&date_key(date)).copied().unwrap_or(false))
    }

    /// Record today's run as complete
    ///
    /// Repeated calls on the same day leave the file untouched.
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Ledger` on I/O or parse failure
    pub fn mark_run_complete(&self) -> Result<()> {
        self.mark_complete_on(self.clock.today())
    }

    /// Record the run belonging to `date` as complete
    ///
    /// A run that started before midnight and finished after it belongs to
    /// the day it started.
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Ledger` on I/O or parse failure
    pub fn mark_complete_on(&self, date: NaiveDate) -> Result<()> {
        let key = date_key(date);
        let mut entries = self.load()?;
        if entries.get(&key).copied().unwrap_or(false) {
            tracing::debug!(date = %key, "Run already recorded");
            return Ok(());
        }

        entries.insert(key.clone(), true);
        self.store(&entries)?;
        tracing::info!(date = %key, path = %self.path.display(), "Run recorded in ledger");
        Ok(())
    }

    /// The last `days` dates ending today, oldest first
    ///
    /// Dates without an entry report `false`.
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Ledger` on I/O or parse failure
    pub fn recent_history(&self, days: u32) -> Result<Vec<(NaiveDate, bool)>> {
        let entries = self.load()?;
        let today = self.clock.today();
        Ok((0..i64::from(days))
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let done = entries.get(&date_key(date)).copied().unwrap_or(false);
                (date, done)
            })
            .collect())
    }

    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            self.store(&Entries::new())?;
            tracing::info!(path = %self.path.display(), "Created empty execution ledger");
            return Ok(Entries::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            DashportError::Ledger(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            DashportError::Ledger(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Write via a sibling temp file and rename
    fn store(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DashportError::Ledger(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            DashportError::Ledger(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            DashportError::Ledger(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Ledger key for a date
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}
