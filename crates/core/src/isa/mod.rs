//! Instruction set definitions and decoding.
//!
//! Traces and program bodies share one line-oriented format. This module provides:
//! 1. **Instruction:** Opcodes, typed operands, and source line tracking.
//! 2. **Decode:** Line and whole-source decoding with per-line error reporting.

/// Line decoder for traces and program bodies.
pub mod decode;

/// Opcode, operand, and instruction definitions.
pub mod instruction;

pub use decode::{decode_line, decode_source};
pub use instruction::{Instruction, Opcode, Operand};
