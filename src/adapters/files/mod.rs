//! Download folder post-processing
//!
//! Both capabilities are best-effort from the run's point of view: the batch
//! finalizer logs their failures and carries on.

pub mod notifier;
pub mod organizer;

pub use notifier::{prepare_folder, OpenFolderNotifier, SilentNotifier};
pub use organizer::DownloadOrganizer;

use crate::domain::Result;
use std::path::{Path, PathBuf};

/// Turns fresh downloads into named archives
pub trait DownloadProcessor: Send + Sync {
    /// Process the folder; returns the archive's final path if one was handled
    fn process(&self, folder: &Path) -> Result<Option<PathBuf>>;
}

/// Shows the downloads folder to the user
pub trait FolderNotifier: Send + Sync {
    /// Reveal the folder
    fn reveal(&self, folder: &Path) -> Result<()>;
}
