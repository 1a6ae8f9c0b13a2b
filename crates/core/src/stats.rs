//! Run statistics collection and reporting.
//!
//! This module tracks what a run did. It provides:
//! 1. **Dispatch:** Dispatch steps and scheduler passes.
//! 2. **Process lifecycle:** Processes created, forks, execs, returns, and failures.
//! 3. **Instruction mix:** CPU bursts, syscalls, I/O completions, interrupt steps.
//! 4. **Cycle breakdown:** CPU, I/O, and overhead (fork, load, interrupt entry/exit) cycles.
//!
//! Counters serialize with `serde` for `--stats-json`; host timing is not serialized so
//! that the JSON of two identical runs is identical.

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;

/// Counters of one run.
#[derive(Clone, Debug, Serialize)]
pub struct RunStats {
    #[serde(skip)]
    start_time: Instant,

    /// Dispatch steps performed (markers excluded).
    pub dispatch_steps: u64,
    /// Scheduler passes over the live process list.
    pub passes: u64,

    /// Processes created, root included.
    pub processes_created: u64,
    /// FORK instructions executed.
    pub forks: u64,
    /// EXEC instructions that switched program.
    pub execs: u64,
    /// Resumed callers after a program body finished.
    pub returns: u64,
    /// Processes terminated by a reference error.
    pub failures: u64,

    /// CPU bursts executed.
    pub cpu_bursts: u64,
    /// SYSCALL instructions executed.
    pub syscalls: u64,
    /// END_IO instructions executed plus implicit I/O completions.
    pub io_completions: u64,
    /// Interrupt service steps logged (vectored model).
    pub interrupt_steps: u64,

    /// Cycles spent in CPU bursts.
    pub cpu_cycles: u64,
    /// Cycles spent in SYSCALL/END_IO handling.
    pub io_cycles: u64,
    /// Cycles spent on fork costs and program load costs.
    pub overhead_cycles: u64,
    /// Global clock at the end of the run.
    pub final_cycle: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            dispatch_steps: 0,
            passes: 0,
            processes_created: 0,
            forks: 0,
            execs: 0,
            returns: 0,
            failures: 0,
            cpu_bursts: 0,
            syscalls: 0,
            io_completions: 0,
            interrupt_steps: 0,
            cpu_cycles: 0,
            io_cycles: 0,
            overhead_cycles: 0,
            final_cycle: 0,
        }
    }
}

impl RunStats {
    /// Total cycles charged to processes.
    pub const fn charged_cycles(&self) -> u64 {
        self.cpu_cycles + self.io_cycles + self.overhead_cycles
    }

    /// Renders the requested sections. Empty `sections` renders all of them:
    /// `summary`, `processes`, `instructions`, `cycles`.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let total = self.charged_cycles().max(1) as f64;
        let pct = |n: u64| (n as f64 / total) * 100.0;
        let mut out = String::new();

        if want("summary") {
            let seconds = self.start_time.elapsed().as_secs_f64();
            let _ = writeln!(out, "\n==========================================================");
            let _ = writeln!(out, "PROCESS EXECUTION SIMULATION STATISTICS");
            let _ = writeln!(out, "==========================================================");
            let _ = writeln!(out, "host_seconds             {seconds:.4} s");
            let _ = writeln!(out, "sim_cycles               {}", self.final_cycle);
            let _ = writeln!(out, "dispatch_steps           {}", self.dispatch_steps);
            let _ = writeln!(out, "scheduler_passes         {}", self.passes);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("processes") {
            let _ = writeln!(out, "PROCESS LIFECYCLE");
            let _ = writeln!(out, "  processes.created      {}", self.processes_created);
            let _ = writeln!(out, "  fork                   {}", self.forks);
            let _ = writeln!(out, "  exec                   {}", self.execs);
            let _ = writeln!(out, "  return                 {}", self.returns);
            let _ = writeln!(out, "  failed                 {}", self.failures);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("instructions") {
            let _ = writeln!(out, "INSTRUCTION MIX");
            let _ = writeln!(out, "  cpu                    {}", self.cpu_bursts);
            let _ = writeln!(out, "  syscall                {}", self.syscalls);
            let _ = writeln!(out, "  io.completion          {}", self.io_completions);
            let _ = writeln!(out, "  interrupt.steps        {}", self.interrupt_steps);
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("cycles") {
            let _ = writeln!(out, "CYCLE BREAKDOWN");
            let _ = writeln!(
                out,
                "  cycles.cpu             {} ({:.2}%)",
                self.cpu_cycles,
                pct(self.cpu_cycles)
            );
            let _ = writeln!(
                out,
                "  cycles.io              {} ({:.2}%)",
                self.io_cycles,
                pct(self.io_cycles)
            );
            let _ = writeln!(
                out,
                "  cycles.overhead        {} ({:.2}%)",
                self.overhead_cycles,
                pct(self.overhead_cycles)
            );
            let _ = writeln!(out, "==========================================================");
        }
        out
    }

    /// Prints selected sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints every section to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
