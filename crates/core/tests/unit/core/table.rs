//! # Process Table Tests
//!
//! Lifecycle operations and the invariants the table enforces.

use std::sync::Arc;

use procsim_core::common::error::{SimError, StateError};
use procsim_core::core::table::Rebind;
use procsim_core::core::{Branch, ProcessState, ProcessTable, Sequence};
use procsim_core::Pid;

fn body(name: &str, text: &str) -> Arc<Sequence> {
    Arc::new(Sequence::compile(name, text).unwrap())
}

fn table_with_root() -> (ProcessTable, Pid) {
    let mut table = ProcessTable::new(16);
    let root = table.create_root(body("init", "FORK,1\nCPU,5")).unwrap();
    (table, root)
}

#[test]
fn test_root_record() {
    let (table, root) = table_with_root();
    assert_eq!(root, Pid::ROOT);
    let record = table.get(root).unwrap();
    assert_eq!(record.parent(), None);
    assert_eq!(record.branch(), Branch::None);
    assert_eq!(record.state(), ProcessState::Running);
    assert_eq!(record.program_name(), "init");
    assert_eq!(record.cursor(), Some(0));
    assert_eq!(record.cycles_consumed(), 0);
}

#[test]
fn test_fork_allocates_child_of_parent() {
    let (mut table, root) = table_with_root();
    table.charge(root, 7).unwrap();
    let child = table.fork(root).unwrap();

    assert_eq!(child, Pid::new(1));
    let record = table.get(child).unwrap();
    assert_eq!(record.parent(), Some(root));
    assert_eq!(record.branch(), Branch::None);
    assert_eq!(record.state(), ProcessState::Running);
    assert_eq!(record.cycles_consumed(), 0);
    assert_eq!(record.cursor(), table.get(root).unwrap().cursor());
    assert_eq!(table.live_pids(), vec![root, child]);
}

#[test]
fn test_exec_charges_cost_and_rebinds() {
    let (mut table, root) = table_with_root();
    table
        .exec(root, body("editor", "CPU,1"), 30, Rebind::Push)
        .unwrap();
    let record = table.get(root).unwrap();
    assert_eq!(record.cycles_consumed(), 30);
    assert_eq!(record.program_name(), "editor");
    assert_eq!(record.cursor(), Some(0));
    assert_eq!(record.depth(), 2);

    table
        .exec(root, body("shell", "CPU,1"), 5, Rebind::Replace)
        .unwrap();
    assert_eq!(table.get(root).unwrap().depth(), 1);
}

#[test]
fn test_return_to_caller_restores_program() {
    let (mut table, root) = table_with_root();
    assert_eq!(table.return_to_caller(root).unwrap(), None);

    table
        .exec(root, body("editor", "CPU,1"), 0, Rebind::Push)
        .unwrap();
    let caller = table.return_to_caller(root).unwrap();
    assert_eq!(caller.as_deref(), Some("init"));
    assert_eq!(table.get(root).unwrap().program_name(), "init");
    assert_eq!(table.get(root).unwrap().depth(), 1);
}

#[test]
fn test_terminated_record_rejects_operations() {
    let (mut table, root) = table_with_root();
    table.terminate(root, "done".to_string()).unwrap();

    let record = table.get(root).unwrap();
    assert!(record.is_terminated());
    assert_eq!(record.status(), Some("done"));
    assert_eq!(record.cursor(), None);

    let terminated = StateError::ProcessTerminated { pid: root };
    assert_eq!(table.charge(root, 1), Err(terminated.clone()));
    assert_eq!(
        table.terminate(root, "again".to_string()),
        Err(terminated.clone())
    );
    assert_eq!(
        table.set_state(root, ProcessState::Running),
        Err(terminated)
    );
    assert!(matches!(
        table.fork(root),
        Err(SimError::State(StateError::ProcessTerminated { .. }))
    ));
    assert!(table.all_terminated());
}

#[test]
fn test_unknown_process() {
    let (table, _) = table_with_root();
    let pid = Pid::new(42);
    assert_eq!(
        table.get(pid).unwrap_err(),
        StateError::UnknownProcess { pid }
    );
}

#[test]
fn test_process_limit() {
    let mut table = ProcessTable::new(2);
    let root = table.create_root(body("init", "CPU,1")).unwrap();
    let _ = table.fork(root).unwrap();
    assert!(matches!(
        table.fork(root),
        Err(SimError::ProcessLimitExceeded { limit: 2 })
    ));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_set_state_cannot_terminate() {
    let (mut table, root) = table_with_root();
    table.set_state(root, ProcessState::BlockedIo).unwrap();
    table.set_state(root, ProcessState::Terminated).unwrap();
    assert_eq!(table.get(root).unwrap().state(), ProcessState::BlockedIo);
}
