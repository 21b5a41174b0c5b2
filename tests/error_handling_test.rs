use phyem_lib::error::{PhyemError, ValidationError};

#[test]
fn test_error_creation() {
    let error = PhyemError::new("Test error", "test_stage");
    assert_eq!(error.message, "Test error");
    assert_eq!(error.stage, "test_stage");
    assert!(error.collaborator.is_none());
}

#[test]
fn test_error_with_context() {
    let error = PhyemError::new("Test error", "test_stage")
        .with_context("Additional context");
    assert_eq!(error.context.as_deref(), Some("Additional context"));
}

#[test]
fn test_error_with_collaborator() {
    let error = PhyemError::new("Test error", "http")
        .with_collaborator("cloud_sync");
    assert_eq!(error.collaborator.as_deref(), Some("cloud_sync"));
}

#[test]
fn test_error_display() {
    let error = PhyemError::new("Test error", "test_stage")
        .with_context("context")
        .with_collaborator("report_store");
    let display = format!("{}", error);
    assert!(display.starts_with("[test_stage] Test error"));
    assert!(display.contains("(collaborator: report_store)"));
    assert!(display.contains("(context: context)"));
}

#[test]
fn test_validation_error_converts() {
    let error: PhyemError = ValidationError::RatingOutOfRange(9).into();
    assert_eq!(error.stage, "validation");
    assert!(error.message.contains('9'));
}

#[test]
fn test_json_error_converts() {
    let parse = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
    let error: PhyemError = parse.into();
    assert_eq!(error.stage, "json_parse");
    assert_eq!(error.source.as_deref(), Some("serde_json"));
}

#[test]
fn test_error_serializes_for_the_ui() {
    let error = PhyemError::new("locked", "admin");
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["stage"], "admin");
    assert_eq!(json["message"], "locked");
}
