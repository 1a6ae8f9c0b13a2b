//! Process Control Block Store.
//!
//! The [`ProcessTable`] owns every [`ProcessRecord`] of a run, indexed by pid. It
//! enforces the lifecycle invariants:
//! 1. **Lineage:** a child's parent always has a smaller pid (it was created earlier).
//! 2. **Monotonic termination:** once a record is terminated every mutating operation
//!    on it fails with [`StateError::ProcessTerminated`].
//! 3. **Bounded size:** forking beyond the configured process limit fails.

use std::sync::Arc;

use crate::common::error::{SimError, SimResult, StateError};
use crate::common::pid::Pid;
use crate::core::process::{Frame, ProcessRecord, ProcessState};
use crate::core::sequence::Sequence;

/// How EXEC rebinds a process's frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rebind {
    /// Push the program body; the caller resumes when it is exhausted.
    Push,
    /// Discard every frame and run only the program body.
    Replace,
}

/// Store of all process records, in creation order.
#[derive(Debug)]
pub struct ProcessTable {
    records: Vec<ProcessRecord>,
    limit: usize,
}

impl ProcessTable {
    /// Creates an empty table that admits at most `limit` processes.
    pub const fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }

    /// Allocates a parentless record running `sequence`.
    pub fn create_root(&mut self, sequence: Arc<Sequence>) -> SimResult<Pid> {
        let pid = self.next_pid()?;
        self.records.push(ProcessRecord::new(pid, None, sequence));
        Ok(pid)
    }

    /// Allocates a child of `parent` that continues from the parent's current context.
    ///
    /// The child starts with lineage tag `NONE`, state `RUNNING`, zero cycles, and a
    /// copy of the parent's frames (cursors included).
    pub fn fork(&mut self, parent: Pid) -> SimResult<Pid> {
        let source = self.live(parent)?;
        let child = self.next_pid()?;
        let record = ProcessRecord::forked_from(child, source);
        self.records.push(record);
        Ok(child)
    }

    /// Switches `pid` to a program: charges `cost` cycles, then rebinds its frames so
    /// the cursor sits at index 0 of `body`.
    pub fn exec(
        &mut self,
        pid: Pid,
        body: Arc<Sequence>,
        cost: u64,
        rebind: Rebind,
    ) -> Result<(), StateError> {
        let record = self.live_mut(pid)?;
        record.charge(cost);
        record.set_program(body.shared_name());
        let frames = record.frames_mut();
        if rebind == Rebind::Replace {
            frames.clear();
        }
        frames.push(Frame::new(body));
        Ok(())
    }

    /// Drops the exhausted top frame of `pid` if a caller frame is underneath it.
    ///
    /// # Returns
    ///
    /// The program name the process is back in, or `None` (nothing popped) when the
    /// top frame is the last one.
    pub fn return_to_caller(&mut self, pid: Pid) -> Result<Option<Arc<str>>, StateError> {
        let record = self.live_mut(pid)?;
        if record.depth() < 2 {
            return Ok(None);
        }
        let _ = record.frames_mut().pop();
        let caller = record.top_frame().map(|frame| frame.sequence.shared_name());
        if let Some(name) = &caller {
            record.set_program(Arc::clone(name));
        }
        Ok(caller)
    }

    /// Marks `pid` terminated and freezes its status.
    pub fn terminate(&mut self, pid: Pid, status: String) -> Result<(), StateError> {
        self.live_mut(pid)?.finish(status);
        Ok(())
    }

    /// Adds `cycles` to the running total of `pid`.
    pub fn charge(&mut self, pid: Pid, cycles: u64) -> Result<(), StateError> {
        self.live_mut(pid)?.charge(cycles);
        Ok(())
    }

    /// Moves `pid` between `RUNNING` and `BLOCKED_IO`.
    ///
    /// Termination goes through [`ProcessTable::terminate`] so that a status is
    /// always recorded.
    pub fn set_state(&mut self, pid: Pid, state: ProcessState) -> Result<(), StateError> {
        let record = self.live_mut(pid)?;
        if state != ProcessState::Terminated {
            record.set_state(state);
        }
        Ok(())
    }

    /// Read access to any record, terminated or not.
    pub fn get(&self, pid: Pid) -> Result<&ProcessRecord, StateError> {
        self.records
            .get(pid.index())
            .ok_or(StateError::UnknownProcess { pid })
    }

    /// Read access to a record that has not terminated.
    pub fn live(&self, pid: Pid) -> Result<&ProcessRecord, StateError> {
        let record = self.get(pid)?;
        if record.is_terminated() {
            return Err(StateError::ProcessTerminated { pid });
        }
        Ok(record)
    }

    /// Mutable access to a record that has not terminated.
    pub(crate) fn live_mut(&mut self, pid: Pid) -> Result<&mut ProcessRecord, StateError> {
        let record = self
            .records
            .get_mut(pid.index())
            .ok_or(StateError::UnknownProcess { pid })?;
        if record.is_terminated() {
            return Err(StateError::ProcessTerminated { pid });
        }
        Ok(record)
    }

    /// Every record, in creation order.
    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Pids of every process that has not terminated, in creation order.
    pub fn live_pids(&self) -> Vec<Pid> {
        self.records
            .iter()
            .filter(|record| !record.is_terminated())
            .map(ProcessRecord::pid)
            .collect()
    }

    /// Returns `true` when every record has terminated.
    pub fn all_terminated(&self) -> bool {
        self.records.iter().all(ProcessRecord::is_terminated)
    }

    /// Number of records ever created.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` before the root is created.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the table, returning the records in creation order.
    pub fn into_records(self) -> Vec<ProcessRecord> {
        self.records
    }

    fn next_pid(&self) -> SimResult<Pid> {
        if self.records.len() >= self.limit {
            return Err(SimError::ProcessLimitExceeded { limit: self.limit });
        }
        Ok(Pid::new(self.records.len() as u32))
    }
}
