//! Simulated process model.
//!
//! This module holds everything a dispatch step touches besides the catalog:
//! 1. **Sequences:** Decoded instruction lists with their preparsed conditional blocks.
//! 2. **Control Flow:** The branch-path evaluator for `IF_CHILD`/`IF_PARENT`/`ENDIF`.
//! 3. **Processes:** Process records, execution frames, and the process table.
//! 4. **Clock:** The single global cycle counter.
//! 5. **Interrupts:** Interrupt-service expansion for the vectored interrupt model.

/// Global cycle counter.
pub mod clock;

/// Conditional block preparse and live-instruction evaluation.
pub mod control;

/// Interrupt service routine expansion (vectored model).
pub mod interrupt;

/// Process records, frames, and lifecycle states.
pub mod process;

/// Instruction sequences (trace and program bodies).
pub mod sequence;

/// Process control block store.
pub mod table;

pub use clock::GlobalClock;
pub use process::{Branch, ProcessRecord, ProcessState, Side};
pub use sequence::Sequence;
pub use table::ProcessTable;
