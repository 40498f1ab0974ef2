//! Dashboard adapter
//!
//! [`ExportPortal`] is what the export coordinator drives; [`DashboardPortal`]
//! implements it against the live dashboard through any UI actuator.

pub mod portal;
pub mod scripts;
pub mod traits;

pub use portal::{DashboardPortal, DashboardPortalFactory, PortalSelectors, PortalSettings};
pub use traits::{DownloadTrigger, ExportPortal, PortalFactory};
