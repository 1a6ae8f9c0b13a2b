//! Instruction representation.
//!
//! An [`Instruction`] is an immutable value: an [`Opcode`], its typed [`Operand`], and
//! the 1-based source line it was decoded from. Sequences of instructions are ordered
//! and executed front to back.

use std::fmt;
use std::sync::Arc;

/// Every opcode a trace or program body may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Create a child process; operand is the fork cost in cycles.
    Fork,
    /// Switch the acting process to a catalog program.
    Exec,
    /// CPU burst; operand is its length in cycles.
    Cpu,
    /// Blocking system call; operand is cycles (inline) or a device (vectored).
    Syscall,
    /// I/O completion; operand is cycles (inline) or a device (vectored).
    EndIo,
    /// Opens or marks the region executed by the child side of a fork.
    IfChild,
    /// Opens or marks the region executed by the parent side of a fork.
    IfParent,
    /// Closes the innermost conditional block.
    EndIf,
}

impl Opcode {
    /// All opcodes, in mnemonic table order.
    pub const ALL: [Self; 8] = [
        Self::Fork,
        Self::Exec,
        Self::Cpu,
        Self::Syscall,
        Self::EndIo,
        Self::IfChild,
        Self::IfParent,
        Self::EndIf,
    ];

    /// Returns the textual mnemonic used in trace files.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Fork => "FORK",
            Self::Exec => "EXEC",
            Self::Cpu => "CPU",
            Self::Syscall => "SYSCALL",
            Self::EndIo => "END_IO",
            Self::IfChild => "IF_CHILD",
            Self::IfParent => "IF_PARENT",
            Self::EndIf => "ENDIF",
        }
    }

    /// Looks up an opcode by its mnemonic.
    pub fn from_mnemonic(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == token)
    }

    /// Returns `true` for the conditional markers `IF_CHILD`, `IF_PARENT`, and `ENDIF`.
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::IfChild | Self::IfParent | Self::EndIf)
    }

    /// Returns `true` for opcodes whose operand is a cycle count.
    pub const fn takes_cycles(self) -> bool {
        matches!(self, Self::Fork | Self::Cpu | Self::Syscall | Self::EndIo)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Typed instruction operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Conditional markers carry no meaningful operand.
    None,
    /// Non-negative count for FORK, CPU, SYSCALL, and END_IO.
    Count(u64),
    /// Program reference for EXEC, with the load cost written in the trace if present.
    Program {
        /// Catalog name of the program.
        name: Arc<str>,
        /// Declared load cost, if the line carried one.
        cost: Option<u64>,
    },
}

/// A decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Operation to perform.
    pub opcode: Opcode,
    /// Typed operand.
    pub operand: Operand,
    /// 1-based line in the source it was decoded from (0 for synthesized instructions).
    pub line: usize,
}

impl Instruction {
    /// Creates an instruction with no source line.
    pub const fn new(opcode: Opcode, operand: Operand) -> Self {
        Self {
            opcode,
            operand,
            line: 0,
        }
    }

    /// Returns a copy tagged with the given source line.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// `CPU,n`.
    pub const fn cpu(cycles: u64) -> Self {
        Self::new(Opcode::Cpu, Operand::Count(cycles))
    }

    /// `SYSCALL,n`.
    pub const fn syscall(n: u64) -> Self {
        Self::new(Opcode::Syscall, Operand::Count(n))
    }

    /// `END_IO,n`.
    pub const fn end_io(n: u64) -> Self {
        Self::new(Opcode::EndIo, Operand::Count(n))
    }

    /// `FORK,n`.
    pub const fn fork(cost: u64) -> Self {
        Self::new(Opcode::Fork, Operand::Count(cost))
    }

    /// `EXEC,name[,cost]`.
    pub fn exec(name: &str, cost: Option<u64>) -> Self {
        Self::new(
            Opcode::Exec,
            Operand::Program {
                name: Arc::from(name),
                cost,
            },
        )
    }

    /// A conditional marker (`IF_CHILD`, `IF_PARENT`, or `ENDIF`).
    pub const fn marker(opcode: Opcode) -> Self {
        Self::new(opcode, Operand::None)
    }

    /// Returns the count operand, if this instruction has one.
    pub const fn count(&self) -> Option<u64> {
        match self.operand {
            Operand::Count(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Operand::None => write!(f, "{},0", self.opcode),
            Operand::Count(n) => write!(f, "{},{n}", self.opcode),
            Operand::Program { name, cost: None } => write!(f, "{},{name}", self.opcode),
            Operand::Program {
                name,
                cost: Some(cost),
            } => write!(f, "{},{name},{cost}", self.opcode),
        }
    }
}
