// Dashport - Scheduled Dashboard Export Runner
// Copyright (c) 2025 Dashport Contributors
// Licensed under the MIT License

//! # Dashport - scheduled dashboard export runner
//!
//! Dashport drives a web dashboard through a real browser once per workday:
//! it exports a fixed set of topics over the window since the previous
//! workday, watches the exports finish, downloads them as one archive and
//! records the day so it never runs twice.
//!
//! ## Architecture
//!
//! Dashport follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (calendar, schedule, export state machine, ledger)
//! - [`adapters`] - External integrations (WebDriver, dashboard pages, downloads)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashport::cli::commands::run::build_coordinator;
//! use dashport::config::load_config;
//! use dashport::core::clock::{Clock, SystemClock};
//! use dashport::core::state::ExecutionLedger;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(load_config("dashport.toml")?);
//!     let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!     let ledger = Arc::new(ExecutionLedger::new(&config.ledger.path, clock.clone()));
//!
//!     let coordinator = build_coordinator(config, clock, ledger)?;
//!     let summary = coordinator.execute_run().await?;
//!
//!     println!("Exported {}/{} topics", summary.exported.len(), summary.total_topics);
//!     Ok(())
//! }
//! ```
//!
//! ## Scheduling
//!
//! A run is eligible on a workday (not a weekend, not a configured holiday)
//! once the trigger time has passed and the ledger has no entry for today:
//!
//! ```rust
//! use dashport::core::calendar::WorkCalendar;
//! use chrono::NaiveDate;
//!
//! let calendar = WorkCalendar::new([NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()]);
//! let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! assert!(!calendar.is_workday(new_year));
//! assert_eq!(
//!     calendar.previous_workday(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
//!     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
//! );
//! ```
//!
//! ## Error Handling
//!
//! Dashport uses the [`domain::DashportError`] type for all errors:
//!
//! ```rust,no_run
//! use dashport::domain::DashportError;
//!
//! fn example() -> Result<(), DashportError> {
//!     let config = dashport::config::load_config("dashport.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
