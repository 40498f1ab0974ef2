//! Downloaded archive organizer
//!
//! Browsers save the batch download under a UUID-like name. After a run the
//! freshest such archive is given a dated, human-readable name.

use super::DownloadProcessor;
use crate::config::DownloadsConfig;
use crate::domain::{DashportError, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Leading bytes of a zip local file header
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const UUID_LEN: usize = 36;

/// Renames the newest downloaded archive
#[derive(Debug, Clone)]
pub struct DownloadOrganizer {
    prefix: String,
    extension: String,
    window: Duration,
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    created: SystemTime,
}

impl DownloadOrganizer {
    /// Create an organizer
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>, window: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            window,
        }
    }

    /// Organizer configured from the `[downloads]` section
    pub fn from_config(config: &DownloadsConfig) -> Self {
        Self::new(config.file_prefix.clone(), config.file_extension.clone(), config.window())
    }

    /// Rename the newest archive created within the window before `now`
    ///
    /// Returns the new path, or `None` when no archive qualifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed or the rename fails
    pub fn organize_at(&self, folder: &Path, now: SystemTime) -> Result<Option<PathBuf>> {
        let entries = fs::read_dir(folder).map_err(|e| {
            DashportError::Io(format!("Failed to list {}: {e}", folder.display()))
        })?;

        let mut newest: Option<Candidate> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            match inspect(&path) {
                Ok(Some(candidate)) => {
                    if newest.as_ref().map_or(true, |n| candidate.created > n.created) {
                        newest = Some(candidate);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(file = %path.display(), error = %e, "Skipping unreadable file"),
            }
        }

        let Some(newest) = newest else {
            tracing::info!(folder = %folder.display(), "No downloaded archive found");
            return Ok(None);
        };

        let age = now.duration_since(newest.created).unwrap_or(Duration::ZERO);
        if age > self.window {
            tracing::info!(
                file = %newest.path.display(),
                age_secs = age.as_secs(),
                "Newest archive is older than the rename window"
            );
            return Ok(None);
        }

        let date = DateTime::<Local>::from(newest.created).date_naive();
        let target = self.free_target(folder, date);
        fs::rename(&newest.path, &target).map_err(|e| {
            DashportError::Io(format!(
                "Failed to rename {} to {}: {e}",
                newest.path.display(),
                target.display()
            ))
        })?;

        tracing::info!(from = %newest.path.display(), to = %target.display(), "Archive renamed");
        Ok(Some(target))
    }

    /// `<prefix><YYYYMMDD><ext>`, or the first free `_<n>` variant
    pub fn free_target(&self, folder: &Path, date: NaiveDate) -> PathBuf {
        let stamp = date.format("%Y%m%d");
        let mut target = folder.join(format!("{}{stamp}{}", self.prefix, self.extension));
        let mut counter = 1;
        while target.exists() {
            target = folder.join(format!("{}{stamp}_{counter}{}", self.prefix, self.extension));
            counter += 1;
        }
        target
    }
}

impl DownloadProcessor for DownloadOrganizer {
    fn process(&self, folder: &Path) -> Result<Option<PathBuf>> {
        self.organize_at(folder, SystemTime::now())
    }
}

/// Whether a file name starts with a hyphenated UUID
pub fn has_uuid_prefix(name: &str) -> bool {
    name.get(..UUID_LEN)
        .map(|prefix| prefix.contains('-') && Uuid::parse_str(prefix).is_ok())
        .unwrap_or(false)
}

/// A browser download that holds a finished zip archive
fn inspect(path: &Path) -> std::io::Result<Option<Candidate>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() || metadata.len() == 0 {
        return Ok(None);
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if !has_uuid_prefix(name) {
        return Ok(None);
    }

    let mut header = [0u8; 4];
    let mut file = fs::File::open(path)?;
    if file.read_exact(&mut header).is_err() || header != ZIP_MAGIC {
        tracing::debug!(file = %name, "Not a zip archive");
        return Ok(None);
    }

    let created = metadata.created().or_else(|_| metadata.modified())?;
    Ok(Some(Candidate {
        path: path.to_path_buf(),
        created,
    }))
}
