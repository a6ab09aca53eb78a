//! Error types and error handling for the compiler.
//!
//! This module defines the recoverable errors reported to the user:
//!
//! - Lexing and parsing errors, returned as `Result`s
//! - The type checker's diagnostics (undeclared and redeclared variables,
//!   type mismatches, guard and block shape errors, implicit and explicit
//!   information-flow violations), accumulated per pass
//!
//! Every error carries the source line it was raised on. Internal invariant
//! violations during code generation are not represented here: they abort.

pub mod errors;

#[cfg(test)]
mod tests;
