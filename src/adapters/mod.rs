//! External system integrations for Dashport.
//!
//! This module provides adapters for the systems a run talks to:
//!
//! - [`actuator`] - Browser automation over W3C WebDriver
//! - [`dashboard`] - The dashboard's pages, driven through an actuator
//! - [`files`] - Download folder post-processing
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The export coordinator only sees
//! the [`dashboard::ExportPortal`] trait; the portal only sees the
//! [`actuator::UiActuator`] trait.
//!
//! ```rust,no_run
//! use dashport::adapters::actuator::{SessionOptions, UiActuator, WebDriverActuator};
//! use dashport::config::DashboardConfig;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SessionOptions::from_config(&DashboardConfig::default(), Path::new("downloads"));
//! let actuator = WebDriverActuator::launch(&options).await?;
//! actuator.navigate("https://example.com").await?;
//! actuator.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod actuator;
pub mod dashboard;
pub mod files;
