//! # Device Table Tests

use std::path::Path;

use procsim_core::common::error::SimError;
use procsim_core::devices::DeviceTables;

fn parse(vectors: &str, delays: &str) -> Result<DeviceTables, SimError> {
    DeviceTables::parse(Path::new("vt.txt"), vectors, Path::new("dt.txt"), delays)
}

#[test]
fn test_tables_are_indexed_by_device() {
    let tables = parse("0X01E3\n0X029C\n# spare\n0X0695\n", "110\n150\n\n250\n").unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables.vector(2), Some("0X0695"));
    assert_eq!(tables.delay(2), Some(250));
    assert_eq!(tables.vector(3), None);
}

#[test]
fn test_length_mismatch_uses_shorter_table() {
    let tables = parse("0X01E3\n0X029C\n", "110\n").unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables.delay(1), None);
}

#[test]
fn test_bad_delay_names_file_and_line() {
    match parse("0X01E3\n", "110\n-4\n").unwrap_err() {
        SimError::MalformedTable { path, line, .. } => {
            assert_eq!(path, Path::new("dt.txt"));
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error {other}"),
    }
}
