//! Common utilities and types used throughout the simulator.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Process Ids:** A strong type for process identifiers.
//! 2. **Constants:** Default file names, interrupt timings, and safety limits.
//! 3. **Error Handling:** The structural, reference, state, and I/O error taxonomy.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types for decoding, resolution, state, and I/O failures.
pub mod error;

/// Process identifier type.
pub mod pid;

pub use error::{DecodeError, ReferenceError, SimError, SimResult, StateError};
pub use pid::Pid;
