use std::{
    fmt::{Debug, Display},
    path::Path,
};

use thiserror::Error;

use crate::ast::types::StaticType;

/// Literal operand for [`Backend::constant`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Constant {
    pub fn ty(&self) -> StaticType {
        match self {
            Constant::Int(_) => StaticType::Int64,
            Constant::Double(_) => StaticType::Double,
            Constant::Bool(_) => StaticType::Bool,
        }
    }
}

/// Arithmetic instructions, already specialised to integer or float operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl ArithOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::SDiv => "sdiv",
            ArithOp::FAdd => "fadd",
            ArithOp::FSub => "fsub",
            ArithOp::FMul => "fmul",
            ArithOp::FDiv => "fdiv",
        }
    }
}

/// Signed integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// Unordered floating point comparisons: true if either operand is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Ueq,
    Une,
    Ult,
    Ule,
    Ugt,
    Uge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Int(IntPredicate),
    Float(FloatPredicate),
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (instruction, condition) = match self {
            Predicate::Int(IntPredicate::Eq) => ("icmp", "eq"),
            Predicate::Int(IntPredicate::Ne) => ("icmp", "ne"),
            Predicate::Int(IntPredicate::Slt) => ("icmp", "slt"),
            Predicate::Int(IntPredicate::Sle) => ("icmp", "sle"),
            Predicate::Int(IntPredicate::Sgt) => ("icmp", "sgt"),
            Predicate::Int(IntPredicate::Sge) => ("icmp", "sge"),
            Predicate::Float(FloatPredicate::Ueq) => ("fcmp", "ueq"),
            Predicate::Float(FloatPredicate::Une) => ("fcmp", "une"),
            Predicate::Float(FloatPredicate::Ult) => ("fcmp", "ult"),
            Predicate::Float(FloatPredicate::Ule) => ("fcmp", "ule"),
            Predicate::Float(FloatPredicate::Ugt) => ("fcmp", "ugt"),
            Predicate::Float(FloatPredicate::Uge) => ("fcmp", "uge"),
        };
        write!(f, "{} {}", instruction, condition)
    }
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to write module: {0}")]
    Io(#[from] std::io::Error),
    #[error("module verification failed: {0}")]
    Verification(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

/// Runtime value of a slot after execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeValue {
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Display for RuntimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeValue::Int(value) => write!(f, "{}", value),
            RuntimeValue::Double(value) => write!(f, "{:?}", value),
            RuntimeValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Final value of each slot in allocation order. Slots that were never
    /// stored to are left out. Empty for backends that cannot observe slots.
    pub variables: Vec<(String, RuntimeValue)>,
}

impl ExecutionResult {
    /// Last recorded value of `name`. With shadowing, the innermost
    /// allocation that was written wins.
    pub fn variable(&self, name: &str) -> Option<RuntimeValue> {
        self.variables
            .iter()
            .rev()
            .find(|(variable, _)| variable == name)
            .map(|(_, value)| *value)
    }
}

/// The instruction-emission capabilities the code generator drives.
///
/// A backend owns a single function, `main`, whose `entry` block is the
/// insertion point when the backend is handed to the code generator.
/// Blocks from [`Backend::create_block`] join the function's layout only
/// once [`Backend::append_block_to_function`] is called for them.
pub trait Backend {
    type Block: Copy + Debug + PartialEq;
    type Value: Copy + Debug;
    type Slot: Copy + Debug;

    fn create_block(&mut self, label: &str) -> Self::Block;
    fn set_insertion_point(&mut self, block: Self::Block);
    fn append_block_to_function(&mut self, block: Self::Block);

    fn branch(&mut self, target: Self::Block);
    fn cond_branch(&mut self, condition: Self::Value, then_block: Self::Block, else_block: Self::Block);

    fn constant(&mut self, constant: Constant) -> Self::Value;
    fn bin_op(&mut self, op: ArithOp, lhs: Self::Value, rhs: Self::Value) -> Self::Value;
    fn cmp_op(&mut self, predicate: Predicate, lhs: Self::Value, rhs: Self::Value) -> Self::Value;

    fn alloca_slot(&mut self, ty: StaticType, name: &str) -> Self::Slot;
    fn load(&mut self, slot: Self::Slot) -> Self::Value;
    fn store(&mut self, value: Self::Value, slot: Self::Slot);

    fn emit_return(&mut self, value: Option<Self::Value>);

    /// Checks the structural well-formedness of the finished function.
    fn verify(&self) -> Result<(), BackendError>;

    fn serialize(&self, _path: &Path) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("serialization"))
    }

    fn execute(&self) -> Result<ExecutionResult, BackendError> {
        Err(BackendError::Unsupported("execution"))
    }
}
