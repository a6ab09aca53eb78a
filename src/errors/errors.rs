use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    line: u32,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, line: u32) -> Self {
        Error {
            internal_error: error_impl,
            line,
        }
    }

    /// 1-based source line, 0 when unknown.
    pub fn get_line(&self) -> u32 {
        self.line
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UndeclaredVariable { .. } => "UndeclaredVariable",
            ErrorImpl::VariableRedeclaration { .. } => "VariableRedeclaration",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::GuardTypeError { .. } => "GuardTypeError",
            ErrorImpl::BlockNotVoid { .. } => "BlockNotVoid",
            ErrorImpl::SecurityViolationImplicit { .. } => "SecurityViolationImplicit",
            ErrorImpl::SecurityViolationExplicit { .. } => "SecurityViolationExplicit",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UndeclaredVariable { variable } => {
                ErrorTip::Suggestion(format!("Declare `{}` before using it", variable))
            }
            ErrorImpl::VariableRedeclaration { variable } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this block, declare it in a nested block to shadow it",
                variable
            )),
            ErrorImpl::TypeMismatch { .. } => ErrorTip::Suggestion(String::from(
                "There is no implicit conversion between `int` and `double`",
            )),
            ErrorImpl::GuardTypeError { .. } => {
                ErrorTip::Suggestion(String::from("Use a comparison to produce a `bool` guard"))
            }
            ErrorImpl::BlockNotVoid { .. } => ErrorTip::None,
            ErrorImpl::SecurityViolationImplicit { variable } => ErrorTip::Suggestion(format!(
                "Declare `{}` as `high` or move the assignment out of the secret-dependent branch",
                variable
            )),
            ErrorImpl::SecurityViolationExplicit { variable } => {
                ErrorTip::Suggestion(format!("Declare `{}` as `high`", variable))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("Undeclared variable {variable}")]
    UndeclaredVariable { variable: String },
    #[error("Variable redeclaration {variable}")]
    VariableRedeclaration { variable: String },
    #[error("Type mismatch: expected `{expected}`, received `{received}`")]
    TypeMismatch { expected: String, received: String },
    #[error("Failed on the guard: expected `bool`, received `{received}`")]
    GuardTypeError { received: String },
    #[error("Expected a block of statements, received `{received}`")]
    BlockNotVoid { received: String },
    #[error("Failed when trying to assign to low variable {variable} from a high context (implicit flow)")]
    SecurityViolationImplicit { variable: String },
    #[error("Failed on security: high value assigned to low variable {variable} (explicit flow)")]
    SecurityViolationExplicit { variable: String },
}
