//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Dashport configuration file.

use super::{exit_code_for, EXIT_OK};
use crate::adapters::dashboard::PortalSelectors;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading runs every section's validation
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if let Err(e) = PortalSelectors::from_config(&config.selectors) {
            println!("❌ Selector validation failed");
            println!("   Error: {e}");
            return Ok(exit_code_for(&e));
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dashboard: {}", config.dashboard.base_url);
        println!("  WebDriver: {}", config.dashboard.webdriver_url);
        println!(
            "  Browser Binary: {}",
            config
                .dashboard
                .resolved_browser_binary()
                .unwrap_or_else(|| "(driver default)".to_string())
        );
        println!("  Cookies: {}", config.dashboard.cookies.len());
        println!("  Trigger Time: {}", config.schedule.trigger_time);
        println!("  Holidays: {}", config.schedule.holidays.len());
        println!("  Max Retries: {}", config.export.max_retries);
        println!(
            "  Export Timeout: {} min",
            config.export.export_timeout_minutes
        );
        println!("  Topics:");
        for topic in &config.topics {
            println!("    {:>2}. {} ({})", topic.id, topic.name, topic.folder);
        }
        println!("  Downloads: {}", config.downloads.folder);
        println!("  Ledger: {}", config.ledger.path);
        println!();
        Ok(EXIT_OK)
    }
}
