//! Error taxonomy for the simulator.
//!
//! Errors are split by the moment they are detected:
//! 1. **Structural:** [`DecodeError`] for bad instruction lines and conditional nesting,
//!    found before any cycle is charged.
//! 2. **Reference:** [`ReferenceError`] when an EXEC or interrupt names something the
//!    catalog or device tables do not know. These terminate only the acting process.
//! 3. **State:** [`StateError`] for operations on terminated or unknown processes, or
//!    instructions whose operand does not fit their opcode. These indicate a scheduler
//!    or construction bug rather than bad input.
//! 4. **Run-level:** [`SimError`] wraps everything that aborts a whole run, including I/O.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::common::pid::Pid;
use crate::isa::instruction::Opcode;

/// Result alias for run-level operations.
pub type SimResult<T> = Result<T, SimError>;

/// Structural errors found while decoding a trace or program body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The opcode token is not part of the instruction set.
    #[error("line {line}: unknown opcode `{opcode}`")]
    UnknownOpcode {
        /// 1-based source line.
        line: usize,
        /// The offending token.
        opcode: String,
    },

    /// The operand is missing, not a non-negative integer, or an empty program name.
    #[error("line {line}: malformed operand `{operand}` for {opcode}: {reason}")]
    MalformedOperand {
        /// 1-based source line.
        line: usize,
        /// Opcode whose operand failed to parse.
        opcode: Opcode,
        /// Raw operand text.
        operand: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A conditional block is not closed, or an `ENDIF` has no open block.
    #[error("line {line}: unterminated conditional: {reason}")]
    UnterminatedConditional {
        /// 1-based source line of the opener (or of the stray `ENDIF`).
        line: usize,
        /// What was wrong with the nesting.
        reason: &'static str,
    },
}

impl DecodeError {
    /// Returns the source line the error was reported for.
    pub const fn line(&self) -> usize {
        match self {
            Self::UnknownOpcode { line, .. }
            | Self::MalformedOperand { line, .. }
            | Self::UnterminatedConditional { line, .. } => *line,
        }
    }
}

/// Resolve-time errors. The scheduler terminates the acting process with a failure
/// status; sibling processes keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// EXEC named a program that was never registered.
    #[error("unknown program `{name}`")]
    UnknownProgram {
        /// The requested program name.
        name: String,
    },

    /// EXEC declared a load cost different from the catalog's registered cost.
    #[error("program `{name}` declared load cost {declared} but the catalog registers {registered}")]
    InconsistentProgramCost {
        /// Program name.
        name: String,
        /// Cost written in the EXEC operand.
        declared: u64,
        /// Cost from the external-files listing.
        registered: u64,
    },

    /// A vectored interrupt named a device outside the vector or device table.
    #[error("unknown device {device} (tables define {available} devices)")]
    UnknownDevice {
        /// Requested device number.
        device: u64,
        /// Number of devices both tables define.
        available: usize,
    },
}

/// Process table invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// An operation targeted a process that has already terminated.
    #[error("process {pid} is already terminated")]
    ProcessTerminated {
        /// Target process.
        pid: Pid,
    },

    /// An operation targeted a process id that was never allocated.
    #[error("process {pid} does not exist")]
    UnknownProcess {
        /// Target process.
        pid: Pid,
    },

    /// A dispatched instruction carries an operand its opcode never takes.
    #[error("process {pid} dispatched {opcode} with operand {operand}")]
    OperandMismatch {
        /// Acting process.
        pid: Pid,
        /// Opcode of the instruction.
        opcode: Opcode,
        /// Debug rendering of the operand.
        operand: String,
    },
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SimError {
    /// One or more structural errors in a trace or program body.
    #[error("{origin}: {}", summarize(.errors))]
    Structural {
        /// Name of the decoded source (file path or program name).
        origin: String,
        /// Every error found, in line order.
        errors: Vec<DecodeError>,
    },

    /// A process table invariant was violated.
    #[error("internal state error: {0}")]
    State(#[from] StateError),

    /// An input could not be read or an output could not be written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A line of the external-files listing, vector table, or device table is malformed.
    #[error("{}:{line}: {reason}", .path.display())]
    MalformedTable {
        /// The table file.
        path: PathBuf,
        /// 1-based line.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run did not reach the all-terminated state within the step bound.
    #[error("run exceeded {limit} dispatch steps")]
    StepLimitExceeded {
        /// The configured bound.
        limit: u64,
    },

    /// Forking would exceed the process bound.
    #[error("run exceeded {limit} processes")]
    ProcessLimitExceeded {
        /// The configured bound.
        limit: usize,
    },
}

impl SimError {
    /// Builds an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn summarize(errors: &[DecodeError]) -> String {
    match errors {
        [] => "no errors".to_string(),
        [only] => only.to_string(),
        all => {
            let mut out = format!("{} errors", all.len());
            for error in all {
                let _ = write!(out, "\n  {error}");
            }
            out
        }
    }
}
