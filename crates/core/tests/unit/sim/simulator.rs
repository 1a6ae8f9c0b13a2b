//! # Simulator Scenario Tests
//!
//! End-to-end runs through the scheduler: fork/exec lineage, branch paths, exec
//! policies, blocking I/O, per-process failures, and run-level limits.

use pretty_assertions::assert_eq;
use std::sync::Arc;

use procsim_core::common::error::{SimError, StateError};
use procsim_core::config::{Config, ExecCostPolicy, ExecMode};
use procsim_core::core::{ProcessRecord, Sequence, Side};
use procsim_core::isa::{Instruction, Opcode, Operand};
use procsim_core::output::EventKind;
use procsim_core::sim::ProgramCatalog;
use procsim_core::{Pid, Scenario, Simulator};

use crate::common::fixtures;
use crate::common::harness::{Fixture, descriptions, entries_of, final_state};

#[test]
fn test_reference_scenario_with_consistent_costs() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE_CONSISTENT).run();

    assert_eq!(
        report.execution_text(),
        "\
0, 0, FORK (10 cycles), created process 1
10, 0, EXEC program2 (load cost 15 cycles)
25, 1, EXEC program1 (load cost 10 cycles)
35, 0, return to init
35, 1, CPU execution (100 cycles)
135, 0, CPU execution (100 cycles)
235, 1, SYSCALL (4 cycles), blocked on I/O
239, 0, exit after 125 cycles
239, 1, I/O complete (implicit END_IO, 0 cycles)
239, 1, CPU execution (50 cycles)
289, 1, return to init
289, 1, CPU execution (100 cycles)
389, 1, exit after 264 cycles
"
    );
    assert_eq!(
        report.status_text(),
        "0, -, exited (init, 125 cycles), 125\n1, 0, exited (init, 264 cycles), 264\n"
    );
    assert_eq!(report.final_cycle, 389);
}

#[test]
fn test_reference_scenario_strict_costs_fail_each_process() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE).run();

    assert_eq!(report.processes.len(), 2);
    assert!(report.processes.iter().all(ProcessRecord::is_terminated));
    assert_eq!(
        final_state(&report, 0),
        (
            "failed: program `program2` declared load cost 25 but the catalog registers 15"
                .to_string(),
            10
        )
    );
    assert_eq!(
        final_state(&report, 1),
        (
            "failed: program `program1` declared load cost 50 but the catalog registers 10"
                .to_string(),
            0
        )
    );
    assert_eq!(entries_of(&report, EventKind::Fault).len(), 2);
    assert_eq!(report.stats.failures, 2);
}

#[test]
fn test_catalog_policy_charges_registered_cost() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE)
        .exec_cost(ExecCostPolicy::Catalog)
        .run();
    assert_eq!(final_state(&report, 0).1, 125);
    assert_eq!(final_state(&report, 1).1, 264);
    assert_eq!(report.final_cycle, 389);
}

#[test]
fn test_operand_policy_charges_declared_cost() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE)
        .exec_cost(ExecCostPolicy::Operand)
        .run();
    assert_eq!(final_state(&report, 0).1, 10 + 25 + 100);
    assert_eq!(final_state(&report, 1).1, 50 + 100 + 4 + 50 + 100);
    assert_eq!(report.final_cycle, 439);
}

#[test]
fn test_exec_without_cost_uses_catalog() {
    let report = Fixture::new("EXEC,editor\n")
        .listing("editor,30\n")
        .body("editor", "CPU,5\n")
        .run();
    assert_eq!(
        descriptions(&report, 0),
        [
            "EXEC editor (load cost 30 cycles)",
            "CPU execution (5 cycles)",
            "return to init",
            "exit after 35 cycles",
        ]
    );
}

#[test]
fn test_replace_mode_discards_the_caller() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE_CONSISTENT)
        .exec_mode(ExecMode::Replace)
        .run();

    assert_eq!(
        final_state(&report, 0),
        ("exited (program2, 25 cycles)".to_string(), 25)
    );
    assert_eq!(
        final_state(&report, 1),
        ("exited (program1, 164 cycles)".to_string(), 164)
    );
    assert!(entries_of(&report, EventKind::Return).is_empty());
}

#[test]
fn test_linear_trace_single_process() {
    let report = Fixture::new(fixtures::LINEAR_TRACE).run();
    assert_eq!(
        report.execution_text(),
        "\
0, 0, CPU execution (50 cycles)
50, 0, SYSCALL (20 cycles), blocked on I/O
70, 0, END_IO (5 cycles), I/O complete
75, 0, CPU execution (25 cycles)
100, 0, exit after 100 cycles
"
    );
    assert_eq!(report.status_text(), "0, -, exited (init, 100 cycles), 100\n");
}

#[test]
fn test_nested_forks_follow_their_branch_path() {
    let trace = "\
FORK,1
IF_CHILD,0
FORK,2
IF_CHILD,0
CPU,3
IF_PARENT,0
CPU,4
ENDIF,0
IF_PARENT,0
CPU,5
ENDIF,0
CPU,6
";
    let report = Fixture::new(trace).run();

    assert_eq!(
        descriptions(&report, 0),
        [
            "FORK (1 cycles), created process 1",
            "CPU execution (5 cycles)",
            "CPU execution (6 cycles)",
            "exit after 12 cycles",
        ]
    );
    assert_eq!(
        descriptions(&report, 1),
        [
            "FORK (2 cycles), created process 2",
            "CPU execution (4 cycles)",
            "CPU execution (6 cycles)",
            "exit after 12 cycles",
        ]
    );
    assert_eq!(
        descriptions(&report, 2),
        [
            "CPU execution (3 cycles)",
            "CPU execution (6 cycles)",
            "exit after 9 cycles",
        ]
    );
    assert_eq!(report.process(Pid::new(2)).unwrap().parent(), Some(Pid::new(1)));
}

#[test]
fn test_fork_inside_parent_region_keeps_outer_path() {
    let trace = "\
FORK,1
IF_CHILD,0
CPU,2
IF_PARENT,0
FORK,3
IF_CHILD,0
CPU,4
ENDIF,0
CPU,5
ENDIF,0
CPU,6
";
    let report = Fixture::new(trace).run();

    assert_eq!(
        descriptions(&report, 0),
        [
            "FORK (1 cycles), created process 1",
            "FORK (3 cycles), created process 2",
            "CPU execution (5 cycles)",
            "CPU execution (6 cycles)",
            "exit after 15 cycles",
        ]
    );
    assert_eq!(
        descriptions(&report, 1),
        [
            "CPU execution (2 cycles)",
            "CPU execution (6 cycles)",
            "exit after 8 cycles",
        ]
    );
    assert_eq!(
        descriptions(&report, 2),
        [
            "CPU execution (4 cycles)",
            "CPU execution (5 cycles)",
            "CPU execution (6 cycles)",
            "exit after 15 cycles",
        ]
    );
    assert_eq!(report.process(Pid::new(2)).unwrap().parent(), Some(Pid::ROOT));
}

#[test]
fn test_unknown_program_fails_only_that_process() {
    let trace = "FORK,5\nIF_CHILD,0\nEXEC,ghost\nENDIF,0\nCPU,10\n";
    let report = Fixture::new(trace).run();

    assert_eq!(
        final_state(&report, 0),
        ("exited (init, 15 cycles)".to_string(), 15)
    );
    assert_eq!(
        final_state(&report, 1),
        ("failed: unknown program `ghost`".to_string(), 0)
    );
}

#[test]
fn test_consecutive_syscalls_resume_implicitly() {
    let report = Fixture::new("SYSCALL,3\nSYSCALL,4\nEND_IO,1\n").run();
    assert_eq!(
        descriptions(&report, 0),
        [
            "SYSCALL (3 cycles), blocked on I/O",
            "I/O complete (implicit END_IO, 0 cycles)",
            "SYSCALL (4 cycles), blocked on I/O",
            "END_IO (1 cycles), I/O complete",
            "exit after 8 cycles",
        ]
    );
    assert_eq!(report.stats.io_completions, 2);
}

#[test]
fn test_cpu_speed_scales_bursts() {
    let mut fixture = Fixture::new("CPU,101\n");
    fixture.config.cpu.speed = 2.0;
    let report = fixture.run();
    assert_eq!(descriptions(&report, 0)[0], "CPU execution (51 cycles)");
    assert_eq!(report.final_cycle, 51);
}

#[test]
fn test_self_exec_hits_step_limit() {
    let mut fixture = Fixture::new("EXEC,loop\n")
        .listing("loop,1\n")
        .body("loop", "EXEC,loop,1\n");
    fixture.config.general.max_dispatch_steps = 50;
    assert!(matches!(
        fixture.try_run(),
        Err(SimError::StepLimitExceeded { limit: 50 })
    ));
}

#[test]
fn test_fork_bomb_hits_process_limit() {
    let mut fixture = Fixture::new("FORK,1\nFORK,1\nFORK,1\n");
    fixture.config.general.max_processes = 3;
    assert!(matches!(
        fixture.try_run(),
        Err(SimError::ProcessLimitExceeded { limit: 3 })
    ));
}

#[test]
fn test_empty_trace_exits_immediately() {
    let report = Fixture::new("# nothing to do\n").run();
    assert_eq!(report.execution_text(), "0, 0, exit after 0 cycles\n");
    assert_eq!(report.final_cycle, 0);
}

#[test]
fn test_stats_track_the_run() {
    let report = Fixture::fork_exec(fixtures::FORK_EXEC_TRACE_CONSISTENT).run();
    let stats = &report.stats;
    assert_eq!(stats.processes_created, 2);
    assert_eq!(stats.forks, 1);
    assert_eq!(stats.execs, 2);
    assert_eq!(stats.returns, 2);
    assert_eq!(stats.cpu_bursts, 4);
    assert_eq!(stats.syscalls, 1);
    assert_eq!(stats.cpu_cycles, 350);
    assert_eq!(stats.io_cycles, 4);
    assert_eq!(stats.overhead_cycles, 35);
    assert_eq!(stats.charged_cycles(), report.final_cycle);
    assert_eq!(stats.final_cycle, 389);
}

#[test]
fn test_grandchild_branch_path_spans_both_blocks() {
    let trace = "\
FORK,1
IF_CHILD,0
CPU,2
IF_PARENT,0
FORK,3
IF_CHILD,0
CPU,4
ENDIF,0
CPU,5
ENDIF,0
";
    let fixture = Fixture::new(trace);
    let mut sim = Simulator::new(fixture.scenario().unwrap(), fixture.config.clone()).unwrap();
    let path = |sim: &Simulator, pid: u32| sim.table().get(Pid::new(pid)).unwrap().branch_path();

    sim.run_pass().unwrap();
    assert!(path(&sim, 0).is_empty());

    // Root enters the outer parent region and forks the grandchild there.
    sim.run_pass().unwrap();
    assert_eq!(path(&sim, 0), [Side::Parent]);
    assert_eq!(path(&sim, 1), [Side::Child]);
    assert_eq!(path(&sim, 2), [Side::Parent]);

    sim.run_pass().unwrap();
    assert_eq!(path(&sim, 2), [Side::Parent, Side::Child]);
    assert_eq!(path(&sim, 0), [Side::Parent]);

    let report = sim.run().unwrap();
    assert_eq!(
        descriptions(&report, 2),
        [
            "CPU execution (4 cycles)",
            "CPU execution (5 cycles)",
            "exit after 9 cycles",
        ]
    );
}

#[test]
fn test_operand_that_does_not_fit_opcode_aborts_the_run() {
    let bogus = Instruction::new(Opcode::Cpu, Operand::None);
    let trace = Arc::new(Sequence::new("init", vec![bogus]).unwrap());
    let scenario = Scenario::new(trace, ProgramCatalog::new());

    let err = Simulator::new(scenario, Config::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::State(StateError::OperandMismatch {
            opcode: Opcode::Cpu,
            ..
        })
    ));
}
