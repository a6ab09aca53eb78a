//! Information-flow type checking.
//!
//! A single pass over the tree that computes a static type and a security
//! label for every expression and checks that:
//!
//! - every name is declared before use and declared once per block
//! - operands, guards and assignments agree on their static types
//! - no secret value is assigned to a public variable (explicit flow)
//! - no public variable is written under a secret guard (implicit flow)
//!
//! Problems are collected as diagnostics; the pass never stops early.

pub mod type_checker;
