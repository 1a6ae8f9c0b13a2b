//! Process identifier type.
//!
//! Process ids are assigned monotonically by the process table, starting at zero for
//! the root process. Creation order and id order are therefore the same thing, which
//! is what the scheduler relies on for its FIFO tie-break.

use std::fmt;

use serde::Serialize;

/// A simulated process identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    /// The id always given to the root process.
    pub const ROOT: Self = Self(0);

    /// Creates a process id from a raw value.
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Returns the id as a table index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
