//! Global Simulator Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **File Names:** Default names of the input and output artifacts.
//! 2. **Interrupt Timings:** Cycle costs of the interrupt-service steps.
//! 3. **Limits:** Safety bounds on dispatch steps and process count.

/// Program name reported for the root process before its first EXEC.
pub const TRACE_PROGRAM: &str = "init";

/// Default execution log file name.
pub const EXECUTION_FILE: &str = "execution.txt";

/// Default system status file name.
pub const STATUS_FILE: &str = "system_status.txt";

/// File extension of per-program body files.
pub const PROGRAM_EXTENSION: &str = "txt";

/// Field separator of every line-oriented input format.
pub const FIELD_SEPARATOR: char = ',';

/// Prefix marking a comment line in instruction and table files.
pub const COMMENT_PREFIX: char = '#';

/// Cycles to switch between user and kernel mode.
pub const SWITCH_MODE_CYCLES: u64 = 1;

/// Cycles to save or restore a process context.
pub const CONTEXT_CYCLES: u64 = 10;

/// Cycles to locate an interrupt vector in memory.
pub const VECTOR_LOOKUP_CYCLES: u64 = 1;

/// Cycles for each activity of an interrupt service routine body.
pub const ISR_ACTIVITY_CYCLES: u64 = 40;

/// Cycles for the IRET instruction.
pub const IRET_CYCLES: u64 = 1;

/// Size in bytes of one vector table entry.
pub const VECTOR_ENTRY_SIZE: u64 = 2;

/// Default bound on dispatch steps per run.
pub const MAX_DISPATCH_STEPS: u64 = 1_000_000;

/// Default bound on live plus terminated processes per run.
pub const MAX_PROCESSES: usize = 4096;
