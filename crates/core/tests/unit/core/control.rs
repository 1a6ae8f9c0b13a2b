//! # Control-Flow Evaluator Tests
//!
//! Walks frames through conditional blocks under every lineage and arming.

use std::sync::Arc;

use procsim_core::common::error::DecodeError;
use procsim_core::core::control::fetch_live;
use procsim_core::core::process::Frame;
use procsim_core::core::{Branch, Sequence, Side};
use rstest::rstest;

const TWO_REGIONS: &str = "IF_CHILD,0\nCPU,1\nIF_PARENT,0\nCPU,2\nENDIF,0\nCPU,3";

fn frame(text: &str) -> Frame {
    Frame::new(Arc::new(Sequence::compile("t", text).unwrap()))
}

fn walk(frame: &mut Frame, lineage: Branch) -> Vec<String> {
    std::iter::from_fn(|| fetch_live(frame, lineage))
        .map(|inst| inst.to_string())
        .collect()
}

#[rstest]
#[case(Branch::Child, &["CPU,1", "CPU,3"])]
#[case(Branch::Parent, &["CPU,2", "CPU,3"])]
#[case(Branch::None, &["CPU,2", "CPU,3"])]
fn test_lineage_selects_region(#[case] lineage: Branch, #[case] expected: &[&str]) {
    let mut f = frame(TWO_REGIONS);
    assert_eq!(walk(&mut f, lineage), expected);
    assert!(f.open.is_empty());
}

#[test]
fn test_parent_region_first() {
    let mut f = frame("IF_PARENT,0\nCPU,2\nIF_CHILD,0\nCPU,1\nENDIF,0");
    assert_eq!(walk(&mut f, Branch::Child), ["CPU,1"]);
}

#[test]
fn test_missing_region_is_skipped_entirely() {
    let mut f = frame("IF_CHILD,0\nCPU,1\nENDIF,0\nCPU,3");
    assert_eq!(walk(&mut f, Branch::Parent), ["CPU,3"]);
}

#[test]
fn test_armed_side_overrides_lineage_once() {
    let mut f = frame("IF_CHILD,0\nCPU,1\nENDIF,0\nIF_CHILD,0\nCPU,2\nENDIF,0");
    f.armed = Some(Side::Child);
    assert_eq!(walk(&mut f, Branch::None), ["CPU,1"]);
    assert_eq!(f.armed, None);
}

#[rstest]
#[case(Branch::Parent, &["CPU,1", "CPU,4"])]
#[case(Branch::Child, &["CPU,2", "CPU,4"])]
fn test_nested_block_inside_region(#[case] lineage: Branch, #[case] expected: &[&str]) {
    let src = "IF_PARENT,0\nCPU,1\nIF_CHILD,0\nCPU,2\nIF_PARENT,0\nCPU,3\nENDIF,0\nENDIF,0\nCPU,4";
    let mut f = frame(src);
    assert_eq!(walk(&mut f, lineage), expected);
}

#[test]
fn test_open_regions_track_the_path() {
    let mut f = frame("IF_CHILD,0\nIF_CHILD,0\nCPU,1\nENDIF,0\nENDIF,0");
    let first = fetch_live(&mut f, Branch::Child).unwrap();
    assert_eq!(first.to_string(), "CPU,1");
    let path: Vec<Side> = f.open.iter().map(|region| region.side).collect();
    assert_eq!(path, [Side::Child, Side::Child]);
    assert!(fetch_live(&mut f, Branch::Child).is_none());
    assert!(f.open.is_empty());
}

#[test]
fn test_cursor_points_past_fetched_instruction() {
    let mut f = frame(TWO_REGIONS);
    let _ = fetch_live(&mut f, Branch::Child).unwrap();
    assert_eq!(f.cursor, 2);
}

#[test]
fn test_unclosed_block_is_structural() {
    let errors = Sequence::compile("t", "FORK,1\nIF_CHILD,0\nCPU,1\nIF_PARENT,0\nCPU,2").unwrap_err();
    assert_eq!(
        errors,
        vec![DecodeError::UnterminatedConditional {
            line: 2,
            reason: "block is never closed by ENDIF",
        }]
    );
}

#[test]
fn test_stray_endif_is_structural() {
    let errors = Sequence::compile("t", "CPU,1\nENDIF,0").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line(), 2);
}
