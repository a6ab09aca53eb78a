//! Lexical analysis.
//!
//! Turns source text into tokens with regex patterns tried in order at the
//! current position:
//!
//! - Keywords (`if`, `else`, `while`, `skip`, `true`, `false`, `high`, `low`)
//!   and identifiers
//! - Integer and floating point literals
//! - Operators and punctuation
//! - Whitespace and `//` comments, which are skipped
//!
//! Each token records the line it starts on.

pub mod lexer;
pub mod tokens;
