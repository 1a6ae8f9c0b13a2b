//! # Run Statistics Tests

use procsim_core::stats::RunStats;

use crate::common::fixtures;
use crate::common::harness::Fixture;

#[test]
fn test_default_is_zeroed() {
    let stats = RunStats::default();
    assert_eq!(stats.dispatch_steps, 0);
    assert_eq!(stats.charged_cycles(), 0);
}

#[test]
fn test_render_selected_sections() {
    let stats = Fixture::new(fixtures::LINEAR_TRACE).run().stats;
    let text = stats.render_sections(&["cycles".to_string()]);
    assert!(text.contains("CYCLE BREAKDOWN"));
    assert!(text.contains("cycles.cpu             75 (75.00%)"));
    assert!(!text.contains("INSTRUCTION MIX"));

    let all = stats.render_sections(&[]);
    for header in ["STATISTICS", "PROCESS LIFECYCLE", "INSTRUCTION MIX", "CYCLE BREAKDOWN"] {
        assert!(all.contains(header), "missing {header}");
    }
}

#[test]
fn test_json_skips_host_timing() {
    let stats = Fixture::new(fixtures::LINEAR_TRACE).run().stats;
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["cpu_bursts"], 2);
    assert_eq!(json["final_cycle"], 100);
    assert!(json.get("start_time").is_none());
}
