//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::{ApprovalStatus, LifecycleStatus, PortError};

#[test]
fn test_core_error_validation() {
    let CoreError::Validation(msg) = CoreError::validation("Invalid input");
    assert_eq!(msg, "Invalid input");
}

#[test]
fn test_status_parse_errors_are_validation() {
    match "ARCHIVED".parse::<ApprovalStatus>() {
        Err(CoreError::Validation(msg)) => assert!(msg.contains("ARCHIVED")),
        other => panic!("Expected Validation error, got {:?}", other),
    }
    assert!(matches!(
        "half-open".parse::<LifecycleStatus>(),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn test_port_error_validation_field() {
    let error = PortError::validation_field("must be YYYY-MM-DD or YYMMDD", "installation_date");

    match error {
        PortError::Validation { message, field } => {
            assert!(message.contains("YYMMDD"));
            assert_eq!(field.as_deref(), Some("installation_date"));
        }
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_port_error_display() {
    let error = PortError::not_found("Claim", 5);
    assert_eq!(error.to_string(), "Not found: Claim with id 5");
}
