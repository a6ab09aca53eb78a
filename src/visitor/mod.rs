//! The traversal protocol shared by every pass.
//!
//! A tree is flattened into an ordered sequence of `(node, phase)` events by
//! [`traversal::Traversal`]. A pass is a [`traversal::Visitor`] folded over
//! that sequence, so passes never recurse over the tree themselves; the
//! phase tells a visitor where inside a composite node it currently is.

pub mod phase;
pub mod recorder;
pub mod traversal;

#[cfg(test)]
mod tests;
