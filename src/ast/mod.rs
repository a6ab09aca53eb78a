//! Abstract syntax tree for the language.
//!
//! The tree is a closed sum type ([`ast::NodeKind`]) with a line number on
//! every node. This module also holds the type vocabulary shared by the
//! checker and the code generator:
//!
//! - [`types::StaticType`] and [`types::SecurityLabel`]
//! - [`types::SType`], the pair the type checker computes per expression
//! - [`types::BinaryOperator`]

pub mod ast;
pub mod types;
