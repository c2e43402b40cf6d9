mod common;

use common::fixture_path;
use prm_diff::{DescriptionError, Descriptions};

#[test]
fn fixture_descriptions_load() {
    let descriptions = Descriptions::load(fixture_path("descriptions.yaml")).expect("valid");
    assert_eq!(descriptions.len(), 4);

    let rapid = descriptions.get(2025).expect("string key parsed as number");
    assert_eq!(rapid.shortname.as_deref(), Some("G0tL"));
    assert_eq!(rapid.subgroup.as_deref(), Some("Servo"));

    let null_description = descriptions.get(8003).expect("8003 present");
    assert_eq!(null_description.description, None);
}

#[test]
fn bad_fixture_is_rejected_whole() {
    let err = Descriptions::load(fixture_path("bad_descriptions.yaml")).expect_err("should fail");
    assert!(matches!(err, DescriptionError::InvalidKey { ref key } if key == "speed"));
    assert!(err.to_string().contains("speed"));
}

#[test]
fn missing_file_is_io_error() {
    let err = Descriptions::load(fixture_path("no_such.yaml")).expect_err("should fail");
    assert!(matches!(err, DescriptionError::Io { .. }));
    assert_eq!(err.code(), "PRM_DESC_001");
}
