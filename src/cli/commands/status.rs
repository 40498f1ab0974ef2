//! Status command implementation
//!
//! This module implements the `status` command: recent ledger history, whether
//! today is a workday, and when the next run is due.

use super::{exit_code_for, EXIT_FATAL, EXIT_OK};
use crate::config::load_config;
use crate::core::calendar::WorkCalendar;
use crate::core::clock::{Clock, SystemClock};
use crate::core::schedule::LaunchScheduler;
use crate::core::state::ExecutionLedger;
use crate::domain::Result;
use chrono::{Datelike, NaiveDate};
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of days of history to show (defaults to `ledger.history_days`)
    #[arg(long)]
    pub days: Option<u32>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking run status");

        println!("📊 Dashport Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = ExecutionLedger::new(&config.ledger.path, clock.clone());
        let scheduler = match LaunchScheduler::from_config(&config.schedule, clock.clone()) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let days = self.days.unwrap_or(config.ledger.history_days);
        if let Err(e) = print_history(&ledger, scheduler.calendar(), days) {
            println!("❌ Failed to read the execution ledger");
            println!("   Error: {e}");
            return Ok(EXIT_FATAL);
        }

        let today = clock.today();
        println!(
            "Today ({today}): {}",
            if scheduler.calendar().is_workday(today) {
                "workday"
            } else {
                "not a workday"
            }
        );
        println!("Trigger time: {}", scheduler.trigger().format("%H:%M"));

        match scheduler.next_run(&ledger) {
            Ok(None) => println!("Next run: due now"),
            Ok(Some(at)) => println!("Next run: {}", at.format("%Y-%m-%d %H:%M")),
            Err(e) => {
                println!("❌ Failed to compute the next run");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
        }
        println!();
        Ok(EXIT_OK)
    }
}

/// Print the last `days` ledger entries, oldest first
///
/// # Errors
///
/// Returns an error if the ledger cannot be read
pub fn print_history(ledger: &ExecutionLedger, calendar: &WorkCalendar, days: u32) -> Result<()> {
    let history = ledger.recent_history(days)?;
    tracing::info!(days, ledger = %ledger.path().display(), "Recent run history");

    println!("Last {days} day(s):");
    for (date, done) in history {
        println!("  {}", history_line(date, done, calendar));
    }
    println!();
    Ok(())
}

fn history_line(date: NaiveDate, done: bool, calendar: &WorkCalendar) -> String {
    let state = if done {
        "✅ completed"
    } else if calendar.is_holiday(date) {
        "🏖️  holiday"
    } else if !calendar.is_workday(date) {
        "·  weekend"
    } else {
        "⏸️  no run"
    };
    format!("{date} {:<3} {state}", date.weekday())
}
