//! Process records.
//!
//! A [`ProcessRecord`] is one simulated process. Its execution context is a stack of
//! [`Frame`]s: the bottom frame runs the sequence the process was created with, and
//! every EXEC in resume mode pushes the program body on top. Each frame owns its own
//! cursor and its own open conditional regions, so the same `Arc<Sequence>` can be run
//! by any number of processes at once.

use std::fmt;
use std::sync::Arc;

use crate::common::pid::Pid;
use crate::core::sequence::Sequence;

/// Lineage tag of a process, set at fork time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Branch {
    /// The process never took part in a fork.
    #[default]
    None,
    /// The process was created by a fork.
    Child,
    /// The process forked at least once and was not itself forked.
    Parent,
}

impl Branch {
    /// Side taken by a conditional block that was not armed by a FORK.
    pub const fn default_side(self) -> Side {
        match self {
            Self::Child => Side::Child,
            Self::None | Self::Parent => Side::Parent,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Child => "CHILD",
            Self::Parent => "PARENT",
        })
    }
}

/// One side of a conditional block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The `IF_CHILD` region.
    Child,
    /// The `IF_PARENT` region.
    Parent,
}

/// Lifecycle state of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Eligible to advance.
    Running,
    /// Issued a SYSCALL and has not reached its END_IO yet.
    BlockedIo,
    /// Finished; never leaves this state.
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "RUNNING",
            Self::BlockedIo => "BLOCKED_IO",
            Self::Terminated => "TERMINATED",
        })
    }
}

/// A conditional region a frame is currently inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenRegion {
    /// Block id in the sequence's conditional map.
    pub block: usize,
    /// Side this process takes in that block.
    pub side: Side,
}

/// Execution state of one sequence inside a process.
#[derive(Clone, Debug)]
pub struct Frame {
    /// The sequence being executed.
    pub sequence: Arc<Sequence>,
    /// Index of the next instruction to fetch.
    pub cursor: usize,
    /// Open conditional regions, outermost first.
    pub open: Vec<OpenRegion>,
    /// Side bound by a FORK to the block opening at `cursor`.
    pub armed: Option<Side>,
}

impl Frame {
    /// Creates a frame positioned at the first instruction of `sequence`.
    pub const fn new(sequence: Arc<Sequence>) -> Self {
        Self {
            sequence,
            cursor: 0,
            open: Vec::new(),
            armed: None,
        }
    }
}

/// A simulated process (process control block).
#[derive(Clone, Debug)]
pub struct ProcessRecord {
    pid: Pid,
    parent: Option<Pid>,
    branch: Branch,
    program: Arc<str>,
    frames: Vec<Frame>,
    state: ProcessState,
    cycles_consumed: u64,
    status: Option<String>,
}

impl ProcessRecord {
    pub(crate) fn new(pid: Pid, parent: Option<Pid>, sequence: Arc<Sequence>) -> Self {
        Self {
            pid,
            parent,
            branch: Branch::None,
            program: sequence.shared_name(),
            frames: vec![Frame::new(sequence)],
            state: ProcessState::Running,
            cycles_consumed: 0,
            status: None,
        }
    }

    /// Clones the execution context of `parent` into a fresh record.
    pub(crate) fn forked_from(pid: Pid, parent: &Self) -> Self {
        Self {
            pid,
            parent: Some(parent.pid),
            branch: Branch::None,
            program: Arc::clone(&parent.program),
            frames: parent.frames.clone(),
            state: ProcessState::Running,
            cycles_consumed: 0,
            status: None,
        }
    }

    /// Returns the process id.
    pub const fn pid(&self) -> Pid {
        self.pid
    }

    /// Returns the parent id, `None` for the root.
    pub const fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Returns the lineage tag.
    pub const fn branch(&self) -> Branch {
        self.branch
    }

    /// Returns the name of the program currently executing.
    pub fn program_name(&self) -> &str {
        &self.program
    }

    /// Returns the lifecycle state.
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// Returns the total cycles charged to this process.
    pub const fn cycles_consumed(&self) -> u64 {
        self.cycles_consumed
    }

    /// Returns the final status, set at termination.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Returns `true` once the process has terminated.
    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    /// Returns the cursor into the active sequence, `None` after termination.
    pub fn cursor(&self) -> Option<usize> {
        self.frames.last().map(|frame| frame.cursor)
    }

    /// Returns the number of stacked frames (1 unless EXEC resumed into a program).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the sides of every open conditional region, outermost first, across
    /// all frames.
    pub fn branch_path(&self) -> Vec<Side> {
        self.frames
            .iter()
            .flat_map(|frame| frame.open.iter().map(|region| region.side))
            .collect()
    }

    pub(crate) fn top_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn top_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub(crate) fn frames_mut(&mut self) -> &mut Vec<Frame> {
        &mut self.frames
    }

    pub(crate) const fn set_branch(&mut self, branch: Branch) {
        self.branch = branch;
    }

    pub(crate) fn set_program(&mut self, program: Arc<str>) {
        self.program = program;
    }

    pub(crate) const fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    pub(crate) const fn charge(&mut self, cycles: u64) {
        self.cycles_consumed = self.cycles_consumed.saturating_add(cycles);
    }

    pub(crate) fn finish(&mut self, status: String) {
        self.state = ProcessState::Terminated;
        self.status = Some(status);
        self.frames.clear();
    }
}
