//! Single-instance lock
//!
//! `run` holds an exclusive lock file next to the ledger so two processes
//! never drive the dashboard or write the ledger at the same time.

use crate::domain::{DashportError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Lock held for the lifetime of the value; the file is removed on drop
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Lock path used for a ledger file (`<ledger>.lock`)
    pub fn path_for(ledger: &Path) -> PathBuf {
        let mut name = ledger.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the lock
    ///
    /// # Errors
    ///
    /// Returns `DashportError::Other` if another instance holds the lock, or
    /// `DashportError::Io` if the file cannot be created.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                return Err(DashportError::Other(format!(
                    "Another instance holds {} (pid {}); remove the file if that process is gone",
                    path.display(),
                    holder.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        write!(file, "{}", std::process::id())?;

        tracing::debug!(path = %path.display(), "Instance lock acquired");
        Ok(Self { path })
    }

    /// Lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release instance lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_ledger() {
        assert_eq!(
            InstanceLock::path_for(Path::new("state/ledger.json")),
            PathBuf::from("state/ledger.json.lock")
        );
    }

    #[test]
    fn test_second_acquire_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json.lock");

        let lock = InstanceLock::acquire(&path).unwrap();
        assert!(path.exists());
        let err = InstanceLock::acquire(&path).unwrap_err();
        assert!(err.to_string().contains("Another instance"));

        drop(lock);
        assert!(!path.exists());
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
