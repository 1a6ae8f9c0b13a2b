//! Interrupt-driven process execution simulator library.
//!
//! This crate interprets a scripted trace of process-control events and produces a
//! time-stamped execution log plus a final system-status table. It is organised as:
//! 1. **ISA:** Decoding of `OPCODE,operand` lines into typed instructions.
//! 2. **Core:** Process records, the process table, the global clock, and the
//!    conditional (`IF_CHILD`/`IF_PARENT`/`ENDIF`) control-flow evaluator.
//! 3. **Simulation:** Program catalog, input loading, and the deterministic run loop.
//! 4. **Output:** Execution log and status table rendering with atomic file writes.
//! 5. **Support:** Configuration, device tables for vectored interrupts, and run statistics.

/// Common types shared by every component (process ids, errors, constants).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Process model: records, process table, clock, control flow, interrupts.
pub mod core;
/// Vector and device tables used by the vectored interrupt model.
pub mod devices;
/// Instruction set (opcodes, operands, line decoder).
pub mod isa;
/// Execution log and status table serialization.
pub mod output;
/// Program catalog, scenario loading, and the run loop.
pub mod sim;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Error type returned by every fallible run-level operation.
pub use crate::common::error::{SimError, SimResult};
/// Process identifier newtype.
pub use crate::common::pid::Pid;
/// Fully loaded, immutable simulation inputs.
pub use crate::sim::loader::{Scenario, ScenarioPaths};
/// Top-level simulator; construct with `Simulator::new` and call `run`.
pub use crate::sim::simulator::{RunReport, Simulator};
