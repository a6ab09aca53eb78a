//! Nested name bindings with a security context per level.
//!
//! Both passes own a [`scope::Scope`] of their own and push and pop it in
//! step with the traversal. Lookups walk outward, so an inner declaration
//! shadows an outer one until its block ends.

pub mod scope;

#[cfg(test)]
mod tests;
