//! Configuration management for Dashport.
//!
//! Dashport reads one TOML file (default `dashport.toml`) with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DASHPORT_<SECTION>_<KEY>` overrides
//! - Defaults for everything except the topic table
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [schedule]
//! trigger_time = "14:00"
//! holidays = ["2025-01-01", "2025-05-01"]
//!
//! [[dashboard.cookies]]
//! name = "session"
//! value = "${DASHPORT_SESSION_COOKIE}"
//! domain = ".example.com"
//!
//! [[topics]]
//! id = 1
//! name = "Health-1"
//! folder = "Products"
//! ```
//!
//! ```rust,no_run
//! use dashport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dashport.toml")?;
//! println!("Trigger time: {}", config.schedule.trigger_time);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CookieConfig, DashboardConfig, DashportConfig, DownloadsConfig,
    ExportConfig, LedgerConfig, LoggingConfig, ScheduleConfig, SelectorConfig, StatusTextConfig,
    TopicConfig, WaitConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
