//! Dashboard portal trait definitions
//!
//! These traits are the seam between the export coordinator and the remote
//! dashboard. The coordinator only knows about records, topics and the batch
//! download; how those map to pages and clicks is the portal's concern.

use crate::core::export::window::RunWindow;
use crate::domain::{ExportRecord, Result, Topic};
use async_trait::async_trait;

/// Path that triggered the batch download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTrigger {
    /// Native click on the batch button
    Primary,
    /// In-page script click after the native click failed
    Fallback,
}

/// One live session against the dashboard
#[async_trait]
pub trait ExportPortal: Send + Sync {
    /// Read the download-records table
    ///
    /// Returns every row, oldest or newest first as the page lists them; row
    /// positions are the indices accepted by [`ExportPortal::select_rows`].
    async fn list_records(&self) -> Result<Vec<ExportRecord>>;

    /// Run the export sequence for one topic
    ///
    /// Fails with a step error on the first violated post-condition.
    async fn export_topic(&self, topic: &Topic, window: &RunWindow) -> Result<()>;

    /// Tick the rows at `indices` in the records table
    ///
    /// Returns the number of rows checked afterwards.
    async fn select_rows(&self, indices: &[usize]) -> Result<usize>;

    /// Press the batch download button
    ///
    /// # Errors
    ///
    /// Returns a finalize error when neither path could press it
    async fn download_selected(&self) -> Result<DownloadTrigger>;

    /// Reload the current page and let it settle
    async fn reload(&self) -> Result<()>;

    /// Release the browser session
    async fn close(&self) -> Result<()>;
}

/// Creates portal sessions
#[async_trait]
pub trait PortalFactory: Send + Sync {
    /// Portal type produced by this factory
    type Portal: ExportPortal;

    /// Launch one session, ready on the download-records page
    async fn launch(&self) -> Result<Self::Portal>;
}
