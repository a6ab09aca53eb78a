//! Code generation.
//!
//! This module lowers a type-checked tree into a control-flow graph:
//!
//! - [`backend::Backend`]: the instruction-emission surface code generation drives
//! - [`ir::IrModule`]: in-process backend that can verify, print and run `main`
//! - [`compiler::CodeGenerator`]: the lowering visitor and [`compiler::lower`]
//! - `llvm::LlvmBackend`: the same surface over LLVM (feature `llvm`)

pub mod backend;
pub mod compiler;
pub mod ir;
#[cfg(feature = "llvm")]
pub mod llvm;
