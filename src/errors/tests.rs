//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        1,
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_line() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        42,
    );

    assert_eq!(error.get_line(), 42);
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "int".to_string(),
            received: "double".to_string(),
        },
        3,
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(error.to_string(), "Type mismatch: expected `int`, received `double`");
}

#[test]
fn test_undeclared_variable_error() {
    let error = Error::new(
        ErrorImpl::UndeclaredVariable {
            variable: "foo".to_string(),
        },
        0,
    );

    assert_eq!(error.get_error_name(), "UndeclaredVariable");
    assert_eq!(error.to_string(), "Undeclared variable foo");
    assert_eq!(error.get_tip().to_string(), "Declare `foo` before using it");
}

#[test]
fn test_redeclaration_error() {
    let error = Error::new(
        ErrorImpl::VariableRedeclaration {
            variable: "x".to_string(),
        },
        7,
    );

    assert_eq!(error.get_error_name(), "VariableRedeclaration");
    assert_eq!(error.kind(), &ErrorImpl::VariableRedeclaration { variable: "x".to_string() });
}

#[test]
fn test_security_errors() {
    let implicit = Error::new(
        ErrorImpl::SecurityViolationImplicit {
            variable: "y".to_string(),
        },
        3,
    );
    let explicit = Error::new(
        ErrorImpl::SecurityViolationExplicit {
            variable: "y".to_string(),
        },
        3,
    );

    assert_eq!(implicit.get_error_name(), "SecurityViolationImplicit");
    assert!(implicit.to_string().contains("implicit flow"));
    assert_eq!(explicit.get_error_name(), "SecurityViolationExplicit");
    assert!(explicit.to_string().contains("explicit flow"));
}

#[test]
fn test_guard_and_block_errors() {
    let guard = Error::new(ErrorImpl::GuardTypeError { received: "int".to_string() }, 1);
    let block = Error::new(ErrorImpl::BlockNotVoid { received: "int".to_string() }, 1);

    assert_eq!(guard.get_error_name(), "GuardTypeError");
    assert_eq!(block.get_error_name(), "BlockNotVoid");
    assert!(guard.to_string().contains("received `int`"));
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let no_tip = ErrorTip::None;
    assert_eq!(no_tip.to_string(), "");
}
