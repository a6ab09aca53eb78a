//! Native backend on top of LLVM through `inkwell`.
//!
//! Only built with the `llvm` feature, which needs a system LLVM 14.

use std::{fmt::Display, path::Path};

use inkwell::{
    basic_block::BasicBlock,
    builder::{Builder, BuilderError},
    context::Context,
    module::Module,
    targets::{InitializationConfig, Target},
    types::BasicTypeEnum,
    values::{BasicValueEnum, FunctionValue, PointerValue},
    OptimizationLevel,
};

use crate::ast::types::StaticType;

use super::backend::{
    ArithOp, Backend, BackendError, Constant, ExecutionResult, FloatPredicate, IntPredicate, Predicate,
};

pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    function: FunctionValue<'ctx>,
}

impl<'ctx> LlvmBackend<'ctx> {
    /// Creates a module with an empty `main` and positions the builder at
    /// the end of its `entry` block.
    pub fn new(context: &'ctx Context, name: &str) -> Self {
        let module = context.create_module(name);
        let builder = context.create_builder();

        let function = module.add_function("main", context.i32_type().fn_type(&[], false), None);
        let entry = context.append_basic_block(function, "entry");
        builder.position_at_end(entry);

        LlvmBackend {
            context,
            module,
            builder,
            function,
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    fn convert_type(&self, ty: StaticType) -> BasicTypeEnum<'ctx> {
        match ty {
            StaticType::Int64 => self.context.i64_type().into(),
            StaticType::Double => self.context.f64_type().into(),
            StaticType::Bool => self.context.bool_type().into(),
            // Declared with an unknown type name; never read or written.
            StaticType::Void => self.context.i8_type().into(),
        }
    }
}

fn built<T>(result: Result<T, BuilderError>) -> T {
    result.unwrap_or_else(|error| panic!("internal compiler error: LLVM builder failed: {}", error))
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Block = BasicBlock<'ctx>;
    type Value = BasicValueEnum<'ctx>;
    type Slot = (PointerValue<'ctx>, BasicTypeEnum<'ctx>);

    fn create_block(&mut self, label: &str) -> BasicBlock<'ctx> {
        self.context.append_basic_block(self.function, label)
    }

    fn set_insertion_point(&mut self, block: BasicBlock<'ctx>) {
        self.builder.position_at_end(block);
    }

    fn append_block_to_function(&mut self, block: BasicBlock<'ctx>) {
        if let Some(last) = self.function.get_last_basic_block() {
            if last != block && block.move_after(last).is_err() {
                panic!("internal compiler error: could not move block {:?}", block.get_name());
            }
        }
    }

    fn branch(&mut self, target: BasicBlock<'ctx>) {
        built(self.builder.build_unconditional_branch(target));
    }

    fn cond_branch(
        &mut self,
        condition: BasicValueEnum<'ctx>,
        then_block: BasicBlock<'ctx>,
        else_block: BasicBlock<'ctx>,
    ) {
        built(
            self.builder
                .build_conditional_branch(condition.into_int_value(), then_block, else_block),
        );
    }

    fn constant(&mut self, constant: Constant) -> BasicValueEnum<'ctx> {
        match constant {
            Constant::Int(value) => self.context.i64_type().const_int(value as u64, true).into(),
            Constant::Double(value) => self.context.f64_type().const_float(value).into(),
            Constant::Bool(value) => self.context.bool_type().const_int(value as u64, false).into(),
        }
    }

    fn bin_op(&mut self, op: ArithOp, lhs: BasicValueEnum<'ctx>, rhs: BasicValueEnum<'ctx>) -> BasicValueEnum<'ctx> {
        let builder = &self.builder;
        match op {
            ArithOp::Add => built(builder.build_int_add(lhs.into_int_value(), rhs.into_int_value(), "addtmp")).into(),
            ArithOp::Sub => built(builder.build_int_sub(lhs.into_int_value(), rhs.into_int_value(), "subtmp")).into(),
            ArithOp::Mul => built(builder.build_int_mul(lhs.into_int_value(), rhs.into_int_value(), "multmp")).into(),
            ArithOp::SDiv => {
                built(builder.build_int_signed_div(lhs.into_int_value(), rhs.into_int_value(), "divtmp")).into()
            }
            ArithOp::FAdd => {
                built(builder.build_float_add(lhs.into_float_value(), rhs.into_float_value(), "addtmp")).into()
            }
            ArithOp::FSub => {
                built(builder.build_float_sub(lhs.into_float_value(), rhs.into_float_value(), "subtmp")).into()
            }
            ArithOp::FMul => {
                built(builder.build_float_mul(lhs.into_float_value(), rhs.into_float_value(), "multmp")).into()
            }
            ArithOp::FDiv => {
                built(builder.build_float_div(lhs.into_float_value(), rhs.into_float_value(), "divtmp")).into()
            }
        }
    }

    fn cmp_op(
        &mut self,
        predicate: Predicate,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> BasicValueEnum<'ctx> {
        match predicate {
            Predicate::Int(predicate) => {
                let predicate = match predicate {
                    IntPredicate::Eq => inkwell::IntPredicate::EQ,
                    IntPredicate::Ne => inkwell::IntPredicate::NE,
                    IntPredicate::Slt => inkwell::IntPredicate::SLT,
                    IntPredicate::Sle => inkwell::IntPredicate::SLE,
                    IntPredicate::Sgt => inkwell::IntPredicate::SGT,
                    IntPredicate::Sge => inkwell::IntPredicate::SGE,
                };
                built(
                    self.builder
                        .build_int_compare(predicate, lhs.into_int_value(), rhs.into_int_value(), "cmptmp"),
                )
                .into()
            }
            Predicate::Float(predicate) => {
                let predicate = match predicate {
                    FloatPredicate::Ueq => inkwell::FloatPredicate::UEQ,
                    FloatPredicate::Une => inkwell::FloatPredicate::UNE,
                    FloatPredicate::Ult => inkwell::FloatPredicate::ULT,
                    FloatPredicate::Ule => inkwell::FloatPredicate::ULE,
                    FloatPredicate::Ugt => inkwell::FloatPredicate::UGT,
                    FloatPredicate::Uge => inkwell::FloatPredicate::UGE,
                };
                built(self.builder.build_float_compare(
                    predicate,
                    lhs.into_float_value(),
                    rhs.into_float_value(),
                    "cmptmp",
                ))
                .into()
            }
        }
    }

    fn alloca_slot(&mut self, ty: StaticType, name: &str) -> Self::Slot {
        let ty = self.convert_type(ty);
        (built(self.builder.build_alloca(ty, name)), ty)
    }

    fn load(&mut self, (pointer, ty): Self::Slot) -> BasicValueEnum<'ctx> {
        built(self.builder.build_load(ty, pointer, "loadtmp"))
    }

    fn store(&mut self, value: BasicValueEnum<'ctx>, (pointer, _): Self::Slot) {
        built(self.builder.build_store(pointer, value));
    }

    fn emit_return(&mut self, value: Option<BasicValueEnum<'ctx>>) {
        let zero = self.context.i32_type().const_zero();
        match value {
            Some(value) => built(self.builder.build_return(Some(&value))),
            None => built(self.builder.build_return(Some(&zero))),
        };
    }

    fn verify(&self) -> Result<(), BackendError> {
        if !self.function.verify(false) {
            return Err(BackendError::Verification(String::from("`main` failed the LLVM function verifier")));
        }
        self.module
            .verify()
            .map_err(|error| BackendError::Verification(error.to_string()))
    }

    fn serialize(&self, path: &Path) -> Result<(), BackendError> {
        if self.module.write_bitcode_to_path(path) {
            Ok(())
        } else {
            Err(BackendError::Io(std::io::Error::other(format!(
                "could not write bitcode to {}",
                path.display()
            ))))
        }
    }

    fn execute(&self) -> Result<ExecutionResult, BackendError> {
        self.verify()?;
        Target::initialize_native(&InitializationConfig::default()).map_err(BackendError::Execution)?;

        let engine = self
            .module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|error| BackendError::Execution(error.to_string()))?;

        let exit_code = unsafe {
            let main = engine
                .get_function::<unsafe extern "C" fn() -> i32>("main")
                .map_err(|error| BackendError::Execution(error.to_string()))?;
            main.call()
        };

        Ok(ExecutionResult {
            exit_code,
            variables: vec![],
        })
    }
}

impl Display for LlvmBackend<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.module.print_to_string().to_string())
    }
}
