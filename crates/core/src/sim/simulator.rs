//! Simulator: the deterministic run loop.
//!
//! The [`Simulator`] owns every piece of mutable run state (clock, process table, event
//! log, statistics) next to the read-only catalog and device tables. A run is a series
//! of passes:
//! 1. **Pass:** every non-terminated process, in creation order, takes exactly one
//!    dispatch step. Children forked during a pass start in the next one.
//! 2. **Step:** the control-flow evaluator skips conditional markers to the process's
//!    next live instruction, which is then applied. An exhausted frame either returns
//!    to its caller or terminates the process.
//! 3. **Effect:** every effect advances the global clock, charges the acting process,
//!    and appends exactly one log entry stamped with the cycle it started at.
//!
//! The loop ends when every process is terminated, or fails with `StepLimitExceeded`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::common::error::{ReferenceError, SimError, SimResult, StateError};
use crate::common::pid::Pid;
use crate::config::{Config, ExecCostPolicy, ExecMode, InterruptModel, OutputConfig};
use crate::core::clock::GlobalClock;
use crate::core::control::fetch_live;
use crate::core::interrupt::{self, InterruptKind};
use crate::core::process::{Branch, ProcessRecord, ProcessState, Side};
use crate::core::table::{ProcessTable, Rebind};
use crate::devices::DeviceTables;
use crate::isa::instruction::{Instruction, Opcode, Operand};
use crate::output::{self, EventKind, ExecutionLog};
use crate::sim::catalog::ProgramCatalog;
use crate::sim::loader::Scenario;
use crate::stats::RunStats;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Event log in emission order.
    pub log: ExecutionLog,
    /// Final process records in creation order.
    pub processes: Vec<ProcessRecord>,
    /// Run counters.
    pub stats: RunStats,
    /// Global clock at the end of the run.
    pub final_cycle: u64,
}

impl RunReport {
    /// Final record of `pid`.
    pub fn process(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.processes.get(pid.index())
    }

    /// Rendered execution log.
    pub fn execution_text(&self) -> String {
        output::render_execution_log(&self.log)
    }

    /// Rendered system status table.
    pub fn status_text(&self) -> String {
        output::render_system_status(&self.processes)
    }

    /// Writes both artifacts into `dir`.
    pub fn write(&self, dir: &Path, names: &OutputConfig) -> SimResult<(PathBuf, PathBuf)> {
        output::write_outputs(dir, names, &self.log, &self.processes)
    }
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    catalog: ProgramCatalog,
    devices: DeviceTables,
    clock: GlobalClock,
    table: ProcessTable,
    log: ExecutionLog,
    stats: RunStats,
}

impl Simulator {
    /// Creates a simulator for `scenario` and spawns the root process on its trace.
    pub fn new(scenario: Scenario, config: Config) -> SimResult<Self> {
        config.validate()?;
        let mut table = ProcessTable::new(config.general.max_processes);
        let root = table.create_root(scenario.trace)?;
        debug!(%root, "root process created");

        let mut stats = RunStats::default();
        stats.processes_created = 1;
        Ok(Self {
            config,
            catalog: scenario.catalog,
            devices: scenario.devices,
            clock: GlobalClock::new(),
            table,
            log: ExecutionLog::new(),
            stats,
        })
    }

    /// Global clock.
    pub const fn clock(&self) -> &GlobalClock {
        &self.clock
    }

    /// Process table.
    pub const fn table(&self) -> &ProcessTable {
        &self.table
    }

    /// Event log emitted so far.
    pub const fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Returns `true` once every process has terminated.
    pub fn is_finished(&self) -> bool {
        self.table.all_terminated()
    }

    /// Runs passes until every process has terminated.
    pub fn run(mut self) -> SimResult<RunReport> {
        info!(
            programs = self.catalog.len(),
            exec_mode = ?self.config.general.exec_mode,
            exec_cost = ?self.config.general.exec_cost,
            interrupts = ?self.config.interrupts.model,
            "run started"
        );
        while !self.is_finished() {
            self.run_pass()?;
        }
        self.stats.final_cycle = self.clock.now();
        info!(
            cycles = self.stats.final_cycle,
            processes = self.table.len(),
            entries = self.log.len(),
            steps = self.stats.dispatch_steps,
            "run finished"
        );
        Ok(self.into_report())
    }

    /// Gives every live process one dispatch step, in creation order.
    pub fn run_pass(&mut self) -> SimResult<()> {
        self.stats.passes += 1;
        for pid in self.table.live_pids() {
            self.step(pid)?;
        }
        Ok(())
    }

    /// Performs one dispatch step for `pid`.
    ///
    /// # Returns
    ///
    /// `Err` only for run-fatal conditions: the step bound, the process bound, a
    /// violated table invariant, or an operand that does not fit its opcode. Reference
    /// errors terminate `pid` and return `Ok`.
    pub fn step(&mut self, pid: Pid) -> SimResult<()> {
        let limit = self.config.general.max_dispatch_steps;
        if self.stats.dispatch_steps >= limit {
            return Err(SimError::StepLimitExceeded { limit });
        }
        self.stats.dispatch_steps += 1;

        let record = self.table.live_mut(pid)?;
        let lineage = record.branch();
        let state = record.state();
        let fetched = record
            .top_frame_mut()
            .and_then(|frame| fetch_live(frame, lineage));

        let Some(inst) = fetched else {
            return self.exhaust(pid);
        };
        trace!(%pid, cycle = self.clock.now(), %inst, "dispatch");

        if state == ProcessState::BlockedIo && inst.opcode != Opcode::EndIo {
            self.resume_io(pid)?;
        }
        self.dispatch(pid, &inst)
    }

    fn dispatch(&mut self, pid: Pid, inst: &Instruction) -> SimResult<()> {
        match (&inst.opcode, &inst.operand) {
            (Opcode::Cpu, Operand::Count(n)) => self.cpu(pid, *n),
            (Opcode::Syscall, Operand::Count(n)) => self.syscall(pid, *n),
            (Opcode::EndIo, Operand::Count(n)) => self.end_io(pid, *n),
            (Opcode::Fork, Operand::Count(n)) => self.fork(pid, *n),
            (Opcode::Exec, Operand::Program { name, cost }) => self.exec(pid, name, *cost),
            (opcode, operand) => Err(StateError::OperandMismatch {
                pid,
                opcode: *opcode,
                operand: format!("{operand:?}"),
            }
            .into()),
        }
    }

    fn cpu(&mut self, pid: Pid, burst: u64) -> SimResult<()> {
        let cycles = self.config.cpu.scale(burst);
        self.emit(pid, EventKind::Cpu, cycles, format!("CPU execution ({cycles} cycles)"))?;
        self.stats.cpu_bursts += 1;
        self.stats.cpu_cycles += cycles;
        Ok(())
    }

    fn syscall(&mut self, pid: Pid, operand: u64) -> SimResult<()> {
        match self.config.interrupts.model {
            InterruptModel::Inline => {
                self.emit(
                    pid,
                    EventKind::Syscall,
                    operand,
                    format!("SYSCALL ({operand} cycles), blocked on I/O"),
                )?;
                self.stats.io_cycles += operand;
            }
            InterruptModel::Vectored => {
                if !self.service_interrupt(pid, InterruptKind::Syscall, operand)? {
                    return Ok(());
                }
            }
        }
        self.stats.syscalls += 1;
        self.table.set_state(pid, ProcessState::BlockedIo)?;
        Ok(())
    }

    fn end_io(&mut self, pid: Pid, operand: u64) -> SimResult<()> {
        match self.config.interrupts.model {
            InterruptModel::Inline => {
                self.emit(
                    pid,
                    EventKind::EndIo,
                    operand,
                    format!("END_IO ({operand} cycles), I/O complete"),
                )?;
                self.stats.io_cycles += operand;
            }
            InterruptModel::Vectored => {
                if !self.service_interrupt(pid, InterruptKind::EndIo, operand)? {
                    return Ok(());
                }
            }
        }
        self.stats.io_completions += 1;
        self.table.set_state(pid, ProcessState::Running)?;
        Ok(())
    }

    /// Logs the interrupt service sequence for `device`.
    ///
    /// Returns `false` when the device is unknown and the process was failed instead.
    fn service_interrupt(&mut self, pid: Pid, kind: InterruptKind, device: u64) -> SimResult<bool> {
        let steps = match interrupt::service_routine(
            kind,
            device,
            &self.devices,
            &self.config.interrupts,
        ) {
            Ok(steps) => steps,
            Err(err) => {
                self.fail(pid, &err)?;
                return Ok(false);
            }
        };

        for step in &steps {
            self.emit(
                pid,
                EventKind::Interrupt,
                step.duration,
                format!("{} ({} cycles)", step.description, step.duration),
            )?;
        }
        self.stats.interrupt_steps += steps.len() as u64;
        self.stats.io_cycles += interrupt::total_cycles(&steps);
        Ok(true)
    }

    fn fork(&mut self, pid: Pid, cost: u64) -> SimResult<()> {
        let child = self.table.fork(pid)?;
        self.emit(
            pid,
            EventKind::Fork,
            cost,
            format!("FORK ({cost} cycles), created process {child}"),
        )?;

        let parent = self.table.live_mut(pid)?;
        if parent.branch() == Branch::None {
            parent.set_branch(Branch::Parent);
        }
        arm(parent, Side::Parent);

        let record = self.table.live_mut(child)?;
        record.set_branch(Branch::Child);
        arm(record, Side::Child);

        self.stats.forks += 1;
        self.stats.processes_created += 1;
        self.stats.overhead_cycles += cost;
        debug!(%pid, %child, cycle = self.clock.now(), "forked");
        Ok(())
    }

    fn exec(&mut self, pid: Pid, name: &str, declared: Option<u64>) -> SimResult<()> {
        let program = match self.catalog.resolve(name) {
            Ok(program) => program,
            Err(err) => return self.fail(pid, &err),
        };

        let cost = match (self.config.general.exec_cost, declared) {
            (ExecCostPolicy::Strict, Some(declared)) if declared != program.cost => {
                let err = ReferenceError::InconsistentProgramCost {
                    name: name.to_string(),
                    declared,
                    registered: program.cost,
                };
                return self.fail(pid, &err);
            }
            (ExecCostPolicy::Operand, Some(declared)) => declared,
            _ => program.cost,
        };

        let rebind = match self.config.general.exec_mode {
            ExecMode::Resume => Rebind::Push,
            ExecMode::Replace => Rebind::Replace,
        };
        let start = self.clock.advance(cost);
        self.table.exec(pid, Arc::clone(&program.body), cost, rebind)?;
        self.log.record(
            start,
            pid,
            EventKind::Exec,
            format!("EXEC {} (load cost {cost} cycles)", program.name),
        );

        self.stats.execs += 1;
        self.stats.overhead_cycles += cost;
        debug!(%pid, program = %program.name, cost, "exec");
        Ok(())
    }

    /// Handles a frame with no live instruction left.
    fn exhaust(&mut self, pid: Pid) -> SimResult<()> {
        if let Some(caller) = self.table.return_to_caller(pid)? {
            self.log
                .record(self.clock.now(), pid, EventKind::Return, format!("return to {caller}"));
            self.stats.returns += 1;
            return Ok(());
        }

        let record = self.table.live(pid)?;
        let cycles = record.cycles_consumed();
        let status = format!("exited ({}, {cycles} cycles)", record.program_name());
        self.log.record(
            self.clock.now(),
            pid,
            EventKind::Exit,
            format!("exit after {cycles} cycles"),
        );
        self.table.terminate(pid, status)?;
        debug!(%pid, cycles, "terminated");
        Ok(())
    }

    /// Completes a pending I/O before the blocked process moves on.
    fn resume_io(&mut self, pid: Pid) -> SimResult<()> {
        self.log.record(
            self.clock.now(),
            pid,
            EventKind::IoResume,
            "I/O complete (implicit END_IO, 0 cycles)".to_string(),
        );
        self.stats.io_completions += 1;
        self.table.set_state(pid, ProcessState::Running)?;
        Ok(())
    }

    /// Terminates `pid` on a reference error; siblings keep running.
    fn fail(&mut self, pid: Pid, err: &ReferenceError) -> SimResult<()> {
        warn!(%pid, cycle = self.clock.now(), "process failed: {err}");
        self.log
            .record(self.clock.now(), pid, EventKind::Fault, format!("failed: {err}"));
        self.table.terminate(pid, format!("failed: {err}"))?;
        self.stats.failures += 1;
        Ok(())
    }

    /// Advances the clock by `cycles`, charges them to `pid`, and logs the effect at
    /// the cycle it started.
    fn emit(&mut self, pid: Pid, kind: EventKind, cycles: u64, description: String) -> SimResult<()> {
        self.table.charge(pid, cycles)?;
        let start = self.clock.advance(cycles);
        self.log.record(start, pid, kind, description);
        Ok(())
    }

    fn into_report(self) -> RunReport {
        RunReport {
            log: self.log,
            processes: self.table.into_records(),
            final_cycle: self.clock.now(),
            stats: self.stats,
        }
    }
}

/// Binds `side` to the conditional block that opens at the record's cursor, if any.
fn arm(record: &mut ProcessRecord, side: Side) {
    if let Some(frame) = record.top_frame_mut() {
        let opens = frame
            .sequence
            .conditionals()
            .block_opening_at(frame.cursor)
            .is_some();
        if opens {
            frame.armed = Some(side);
        }
    }
}
