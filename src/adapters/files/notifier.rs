//! Reveal the downloads folder in the desktop file manager

use super::FolderNotifier;
use crate::domain::{DashportError, Result};
use std::path::Path;

/// Opens folders with the platform's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFolderNotifier;

impl FolderNotifier for OpenFolderNotifier {
    fn reveal(&self, folder: &Path) -> Result<()> {
        let folder = prepare_folder(folder)?;
        open::that(&folder)
            .map_err(|e| DashportError::Io(format!("Failed to open {}: {e}", folder.display())))?;
        tracing::info!(folder = %folder.display(), "Downloads folder opened");
        Ok(())
    }
}

/// Does nothing; used when folder opening is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl FolderNotifier for SilentNotifier {
    fn reveal(&self, folder: &Path) -> Result<()> {
        tracing::debug!(folder = %folder.display(), "Folder opening disabled");
        Ok(())
    }
}

/// Create the folder if needed and return its absolute path
pub fn prepare_folder(folder: &Path) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(folder).map_err(|e| {
        DashportError::Io(format!("Failed to create {}: {e}", folder.display()))
    })?;
    folder
        .canonicalize()
        .map_err(|e| DashportError::Io(format!("Failed to resolve {}: {e}", folder.display())))
}
