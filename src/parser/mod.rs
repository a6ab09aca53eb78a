//! Parser module for building the syntax tree.
//!
//! A Pratt parser turns the token stream into a root `Block` node:
//!
//! - Statements are dispatched on their first token (declarations,
//!   `if`, `while`, blocks, `skip`), anything else is an expression
//!   statement
//! - Expressions use NUD (null denotation) and LED (left denotation)
//!   handlers, with binding powers for precedence
//!
//! Parsing stops at the first error.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;

#[cfg(test)]
mod tests;
