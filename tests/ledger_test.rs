//! Integration tests for the execution ledger and the instance lock
//!
//! The ledger is the only state that survives a restart, so these tests use
//! separate ledger values over one file to stand in for separate processes.

use chrono::{NaiveDate, NaiveDateTime};
use dashport::core::clock::{Clock, ManualClock};
use dashport::core::state::{ExecutionLedger, InstanceLock};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn test_completed_run_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("execution_record.json");
    let clock = Arc::new(ManualClock::new(at(2025, 1, 2, 15)));

    let first = ExecutionLedger::new(&path, clock.clone());
    first.mark_run_complete().unwrap();
    drop(first);

    let restarted = ExecutionLedger::new(&path, clock.clone());
    assert!(restarted.has_run_today().unwrap());

    // The next morning nothing has run yet
    clock.advance(Duration::from_secs(18 * 3600));
    assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    assert!(!restarted.has_run_today().unwrap());
}

#[test]
fn test_ledger_file_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("execution_record.json");
    let clock = Arc::new(ManualClock::new(at(2025, 1, 2, 15)));
    let ledger = ExecutionLedger::new(&path, clock.clone());

    ledger.mark_run_complete().unwrap();
    clock.set(at(2025, 1, 3, 15));
    ledger.mark_run_complete().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "{\n  \"20250102\": true,\n  \"20250103\": true\n}"
    );
}

#[test]
fn test_existing_entries_are_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("execution_record.json");
    fs::write(&path, r#"{"20241231": true, "20250101": false}"#).unwrap();
    let clock = Arc::new(ManualClock::new(at(2025, 1, 2, 15)));
    let ledger = ExecutionLedger::new(&path, clock);

    ledger.mark_run_complete().unwrap();

    let history = ledger.recent_history(3).unwrap();
    assert_eq!(
        history,
        vec![
            (NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), true),
            (NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), false),
            (NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(), true),
        ]
    );
}

#[test]
fn test_instance_lock_sits_next_to_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("state").join("execution_record.json");
    let lock_path = InstanceLock::path_for(&ledger_path);

    assert_eq!(lock_path.parent(), ledger_path.parent());

    let lock = InstanceLock::acquire(&lock_path).unwrap();
    assert_eq!(
        fs::read_to_string(lock.path()).unwrap(),
        std::process::id().to_string()
    );
    assert!(InstanceLock::acquire(&lock_path).is_err());

    drop(lock);
    assert!(!lock_path.exists());
}
