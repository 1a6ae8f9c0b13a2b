//! Execution Log and Status Table Output.
//!
//! This module owns the two data artifacts of a run. It provides:
//! 1. **Event Log:** [`ExecutionLog`], the append-only buffer of [`EventLogEntry`] values
//!    the scheduler emits, one per effect, in emission order.
//! 2. **Rendering:** Line-oriented text for the execution log and the system status table.
//! 3. **Atomic Writes:** Each artifact is written to a temporary sibling file and renamed
//!    into place, so a failed run never leaves a file that looks complete.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::common::error::{SimError, SimResult};
use crate::common::pid::Pid;
use crate::config::OutputConfig;
use crate::core::process::ProcessRecord;

/// Category of a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// CPU burst.
    Cpu,
    /// System call (inline model).
    Syscall,
    /// I/O completion (inline model).
    EndIo,
    /// Process creation.
    Fork,
    /// Program switch.
    Exec,
    /// A resumed caller picking up after its program body finished.
    Return,
    /// One step of an interrupt service sequence (vectored model).
    Interrupt,
    /// Implicit zero-cycle I/O completion of a blocked process.
    IoResume,
    /// Per-process failure (unknown program, cost mismatch, unknown device).
    Fault,
    /// Process exit.
    Exit,
}

/// One effect, stamped with the cycle at which it started.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventLogEntry {
    /// Global clock value when the effect began.
    pub cycle: u64,
    /// Acting process.
    pub pid: Pid,
    /// Effect category.
    pub kind: EventKind,
    /// Human-readable summary.
    pub description: String,
}

/// Append-only event buffer.
#[derive(Clone, Debug, Default)]
pub struct ExecutionLog {
    entries: Vec<EventLogEntry>,
}

impl ExecutionLog {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends one entry.
    pub fn record(&mut self, cycle: u64, pid: Pid, kind: EventKind, description: String) {
        self.entries.push(EventLogEntry {
            cycle,
            pid,
            kind,
            description,
        });
    }

    /// Entries in emission order.
    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    /// Entries emitted by `pid`, in emission order.
    pub fn for_pid(&self, pid: Pid) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter().filter(move |entry| entry.pid == pid)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders the execution log: `cycle, pid, description` per line.
pub fn render_execution_log(log: &ExecutionLog) -> String {
    let mut out = String::new();
    for entry in log.entries() {
        let _ = writeln!(out, "{}, {}, {}", entry.cycle, entry.pid, entry.description);
    }
    out
}

/// Renders the status table: `pid, parent, status, total_cycles` per process, in
/// creation order. The root's parent is printed as `-`.
pub fn render_system_status(records: &[ProcessRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let parent = record
            .parent()
            .map_or_else(|| "-".to_string(), |pid| pid.to_string());
        let status = record.status().unwrap_or("running");
        let _ = writeln!(
            out,
            "{}, {}, {}, {}",
            record.pid(),
            parent,
            status,
            record.cycles_consumed()
        );
    }
    out
}

/// Writes `contents` to `path` through a temporary file in the same directory.
///
/// The rename is atomic on the same filesystem: readers see either the previous file
/// or the complete new one.
pub fn write_atomic(path: &Path, contents: &str) -> SimResult<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SimError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| SimError::io(tmp.path(), e))?;
    let _ = tmp.persist(path).map_err(|e| SimError::io(path, e.error))?;
    Ok(())
}

/// Writes both artifacts into `dir`, creating it if needed.
///
/// # Returns
///
/// The paths of the execution log and the status table, in that order.
pub fn write_outputs(
    dir: &Path,
    names: &OutputConfig,
    log: &ExecutionLog,
    records: &[ProcessRecord],
) -> SimResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;
    let execution = dir.join(&names.execution_file);
    let status = dir.join(&names.status_file);
    write_atomic(&execution, &render_execution_log(log))?;
    write_atomic(&status, &render_system_status(records))?;
    info!(
        execution = %execution.display(),
        status = %status.display(),
        entries = log.len(),
        processes = records.len(),
        "outputs written"
    );
    Ok((execution, status))
}
