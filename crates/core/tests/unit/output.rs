//! # Output Writer Tests
//!
//! Rendering of both artifacts and the atomic write path.

use std::fs;

use procsim_core::config::OutputConfig;
use procsim_core::output::{
    EventKind, ExecutionLog, render_execution_log, write_atomic, write_outputs,
};
use procsim_core::Pid;

use crate::common::fixtures;
use crate::common::harness::Fixture;

#[test]
fn test_log_preserves_emission_order() {
    let mut log = ExecutionLog::new();
    log.record(5, Pid::new(1), EventKind::Cpu, "b".to_string());
    log.record(0, Pid::new(0), EventKind::Fork, "a".to_string());
    assert_eq!(render_execution_log(&log), "5, 1, b\n0, 0, a\n");
    assert_eq!(log.for_pid(Pid::new(0)).count(), 1);
}

#[test]
fn test_status_rows_in_creation_order() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE_CONSISTENT).run();
    let status = report.status_text();
    let pids: Vec<&str> = status
        .lines()
        .map(|line| line.split(", ").next().unwrap())
        .collect();
    assert_eq!(pids, ["0", "1"]);
}

#[test]
fn test_write_outputs_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/out");
    let report = Fixture::new(fixtures::LINEAR_TRACE).run();

    let (execution, status) =
        write_outputs(&out, &OutputConfig::default(), &report.log, &report.processes).unwrap();
    assert_eq!(execution, out.join("execution.txt"));
    assert_eq!(fs::read_to_string(execution).unwrap(), report.execution_text());
    assert_eq!(fs::read_to_string(status).unwrap(), report.status_text());
}

#[test]
fn test_write_atomic_replaces_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("execution.txt");
    fs::write(&path, "stale").unwrap();

    write_atomic(&path, "fresh\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_write_atomic_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent/execution.txt");
    assert!(write_atomic(&path, "x").is_err());
    assert!(!path.exists());
}
