//! Integration tests for logging functionality
//!
//! A global subscriber can only be installed once per process, so everything
//! that calls `init_logging` lives in a single test.

use chrono::NaiveDate;
use dashport::config::LoggingConfig;
use dashport::core::clock::ManualClock;
use dashport::core::state::ExecutionLedger;
use dashport::logging::{init_logging, parse_log_level};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "logs");
    assert_eq!(config.local_rotation, "daily");

    let console = LoggingConfig::console_only();
    assert!(!console.local_enabled);
}

#[test]
fn test_parse_log_levels() {
    for level in ["trace", "debug", "info", "warn", "error", "INFO"] {
        assert!(parse_log_level(level).is_ok(), "{level} should parse");
    }
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn test_json_file_layer_receives_library_events() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("info", &config).unwrap();
    assert!(guard.has_file_output());
    assert!(log_path.is_dir());

    // A second subscriber is refused
    assert!(init_logging("info", &LoggingConfig::console_only()).is_err());

    let clock = Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap(),
    ));
    let ledger = ExecutionLedger::new(temp_dir.path().join("ledger.json"), clock);
    ledger.mark_run_complete().unwrap();

    // Dropping the guard flushes the non-blocking writer
    drop(guard);

    let mut lines = Vec::new();
    for entry in fs::read_dir(&log_path).unwrap() {
        let contents = fs::read_to_string(entry.unwrap().path()).unwrap();
        lines.extend(contents.lines().map(str::to_string));
    }

    let recorded = lines
        .iter()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find(|v| v["fields"]["message"] == "Run recorded in ledger")
        .expect("ledger event in the JSON log");
    assert_eq!(recorded["level"], "INFO");
    assert_eq!(recorded["fields"]["date"], "20250102");
}
