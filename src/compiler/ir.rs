//! In-process IR backend.
//!
//! [`IrModule`] records the instructions the code generator emits into a
//! small LLVM-shaped control-flow graph. It can verify the graph, print it
//! as text, write that text to disk and interpret `main` directly.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    path::Path,
};

use crate::ast::types::StaticType;

use super::backend::{
    ArithOp, Backend, BackendError, Constant, ExecutionResult, FloatPredicate, IntPredicate, Predicate,
    RuntimeValue,
};

/// Instruction budget of [`IrModule::execute`] unless overridden.
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Const(Constant),
    Value(ValueId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        slot: SlotId,
        ty: StaticType,
    },
    Load {
        result: ValueId,
        slot: SlotId,
    },
    Store {
        value: Operand,
        slot: SlotId,
    },
    Binary {
        result: ValueId,
        op: ArithOp,
        lhs: Operand,
        rhs: Operand,
    },
    Compare {
        result: ValueId,
        predicate: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    Br {
        target: BlockId,
    },
    CondBr {
        condition: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret {
        value: Option<Operand>,
    },
}

impl Instruction {
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::Alloca { .. } => "alloca",
            Instruction::Load { .. } => "load",
            Instruction::Store { .. } => "store",
            Instruction::Binary { op, .. } => op.mnemonic(),
            Instruction::Compare {
                predicate: Predicate::Int(_),
                ..
            } => "icmp",
            Instruction::Compare {
                predicate: Predicate::Float(_),
                ..
            } => "fcmp",
            Instruction::Br { .. } | Instruction::CondBr { .. } => "br",
            Instruction::Ret { .. } => "ret",
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Br { .. } | Instruction::CondBr { .. } | Instruction::Ret { .. }
        )
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Br { target } => vec![*target],
            Instruction::CondBr {
                then_block, else_block, ..
            } => vec![*then_block, *else_block],
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone)]
struct BasicBlock {
    label: String,
    instructions: Vec<Instruction>,
}

#[derive(Debug, Clone)]
struct SlotInfo {
    name: String,
    display_name: String,
    ty: StaticType,
}

/// A module holding the single function `main`.
#[derive(Debug, Clone)]
pub struct IrModule {
    name: String,
    blocks: Vec<BasicBlock>,
    /// Blocks that are part of `main`, in layout order
    layout: Vec<BlockId>,
    slots: Vec<SlotInfo>,
    value_types: Vec<StaticType>,
    insertion_point: BlockId,
    names_in_use: HashMap<String, usize>,
    step_limit: u64,
}

impl IrModule {
    pub fn new(name: &str) -> Self {
        let mut module = IrModule {
            name: name.to_string(),
            blocks: vec![],
            layout: vec![],
            slots: vec![],
            value_types: vec![],
            insertion_point: BlockId(0),
            names_in_use: HashMap::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        };

        let entry = module.create_block("entry");
        module.append_block_to_function(entry);
        module.insertion_point = entry;
        module
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_block(&self) -> BlockId {
        self.layout[0]
    }

    pub fn insertion_point(&self) -> BlockId {
        self.insertion_point
    }

    pub fn instructions(&self, block: BlockId) -> &[Instruction] {
        &self.blocks[block.0].instructions
    }

    pub fn label(&self, block: BlockId) -> &str {
        &self.blocks[block.0].label
    }

    /// Labels of the blocks in `main`, in layout order.
    pub fn block_labels(&self) -> Vec<&str> {
        self.layout.iter().map(|block| self.label(*block)).collect()
    }

    pub fn block_by_label(&self, label: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|block| block.label == label)
            .map(BlockId)
    }

    /// Labels of the blocks the terminator of `label` can jump to.
    pub fn successors(&self, label: &str) -> Vec<&str> {
        self.block_by_label(label)
            .and_then(|block| self.instructions(block).last())
            .map(|terminator| {
                terminator
                    .successors()
                    .into_iter()
                    .map(|block| self.label(block))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every instruction of `main` in layout order.
    pub fn function_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.layout
            .iter()
            .flat_map(|block| self.blocks[block.0].instructions.iter())
    }

    pub fn slot_name(&self, slot: SlotId) -> &str {
        &self.slots[slot.0].name
    }

    /// LLVM names locals uniquely by appending a counter; so does this.
    fn unique_name(&mut self, base: &str) -> String {
        let count = self.names_in_use.entry(base.to_string()).or_insert(0);
        let name = if *count == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, count)
        };
        *count += 1;
        name
    }

    fn new_value(&mut self, ty: StaticType) -> ValueId {
        self.value_types.push(ty);
        ValueId(self.value_types.len() - 1)
    }

    fn operand_type(&self, operand: Operand) -> StaticType {
        match operand {
            Operand::Const(constant) => constant.ty(),
            Operand::Value(value) => self.value_types[value.0],
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.blocks[self.insertion_point.0]
            .instructions
            .push(instruction);
    }

    fn is_in_function(&self, block: BlockId) -> bool {
        self.layout.contains(&block)
    }

    fn verify_block(&self, block: BlockId) -> Result<(), BackendError> {
        let BasicBlock { label, instructions } = &self.blocks[block.0];

        match instructions.last() {
            None => {
                return Err(BackendError::Verification(format!("block `{}` is empty", label)));
            }
            Some(last) if !last.is_terminator() => {
                return Err(BackendError::Verification(format!(
                    "block `{}` does not end in a terminator",
                    label
                )));
            }
            _ => {}
        }

        for (index, instruction) in instructions.iter().enumerate() {
            if instruction.is_terminator() && index + 1 != instructions.len() {
                return Err(BackendError::Verification(format!(
                    "terminator in the middle of block `{}`",
                    label
                )));
            }

            for target in instruction.successors() {
                if !self.is_in_function(target) {
                    return Err(BackendError::Verification(format!(
                        "block `{}` branches to `{}`, which is not part of the function",
                        label,
                        self.label(target)
                    )));
                }
            }

            match instruction {
                Instruction::Store { value, slot } if self.operand_type(*value) != self.slots[slot.0].ty => {
                    return Err(BackendError::Verification(format!(
                        "store of {} into {} slot `{}`",
                        llvm_type(self.operand_type(*value)),
                        llvm_type(self.slots[slot.0].ty),
                        self.slots[slot.0].display_name
                    )));
                }
                Instruction::Binary { lhs, rhs, .. } | Instruction::Compare { lhs, rhs, .. }
                    if self.operand_type(*lhs) != self.operand_type(*rhs) =>
                {
                    return Err(BackendError::Verification(format!(
                        "operand types differ in block `{}`",
                        label
                    )));
                }
                Instruction::CondBr { condition, .. } if self.operand_type(*condition) != StaticType::Bool => {
                    return Err(BackendError::Verification(format!(
                        "branch condition in block `{}` is not i1",
                        label
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn fmt_operand(&self, operand: Operand) -> String {
        match operand {
            Operand::Const(Constant::Int(value)) => value.to_string(),
            Operand::Const(Constant::Double(value)) => format!("{:?}", value),
            Operand::Const(Constant::Bool(value)) => value.to_string(),
            Operand::Value(value) => format!("%{}", value.0),
        }
    }

    fn fmt_instruction(&self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Alloca { slot, ty } => {
                format!("%{} = alloca {}", self.slots[slot.0].display_name, llvm_type(*ty))
            }
            Instruction::Load { result, slot } => format!(
                "%{} = load {}, ptr %{}",
                result.0,
                llvm_type(self.slots[slot.0].ty),
                self.slots[slot.0].display_name
            ),
            Instruction::Store { value, slot } => format!(
                "store {} {}, ptr %{}",
                llvm_type(self.operand_type(*value)),
                self.fmt_operand(*value),
                self.slots[slot.0].display_name
            ),
            Instruction::Binary { result, op, lhs, rhs } => format!(
                "%{} = {} {} {}, {}",
                result.0,
                op.mnemonic(),
                llvm_type(self.operand_type(*lhs)),
                self.fmt_operand(*lhs),
                self.fmt_operand(*rhs)
            ),
            Instruction::Compare {
                result,
                predicate,
                lhs,
                rhs,
            } => format!(
                "%{} = {} {} {}, {}",
                result.0,
                predicate,
                llvm_type(self.operand_type(*lhs)),
                self.fmt_operand(*lhs),
                self.fmt_operand(*rhs)
            ),
            Instruction::Br { target } => format!("br label %{}", self.label(*target)),
            Instruction::CondBr {
                condition,
                then_block,
                else_block,
            } => format!(
                "br i1 {}, label %{}, label %{}",
                self.fmt_operand(*condition),
                self.label(*then_block),
                self.label(*else_block)
            ),
            Instruction::Ret { value: None } => String::from("ret i32 0"),
            Instruction::Ret { value: Some(value) } => format!(
                "ret {} {}",
                llvm_type(self.operand_type(*value)),
                self.fmt_operand(*value)
            ),
        }
    }
}

fn llvm_type(ty: StaticType) -> &'static str {
    match ty {
        StaticType::Int64 => "i64",
        StaticType::Double => "double",
        StaticType::Bool => "i1",
        StaticType::Void => "void",
    }
}

impl Backend for IrModule {
    type Block = BlockId;
    type Value = Operand;
    type Slot = SlotId;

    fn create_block(&mut self, label: &str) -> BlockId {
        let label = self.unique_name(label);
        self.blocks.push(BasicBlock {
            label,
            instructions: vec![],
        });
        BlockId(self.blocks.len() - 1)
    }

    fn set_insertion_point(&mut self, block: BlockId) {
        self.insertion_point = block;
    }

    fn append_block_to_function(&mut self, block: BlockId) {
        self.layout.retain(|existing| *existing != block);
        self.layout.push(block);
    }

    fn branch(&mut self, target: BlockId) {
        self.emit(Instruction::Br { target });
    }

    fn cond_branch(&mut self, condition: Operand, then_block: BlockId, else_block: BlockId) {
        self.emit(Instruction::CondBr {
            condition,
            then_block,
            else_block,
        });
    }

    fn constant(&mut self, constant: Constant) -> Operand {
        Operand::Const(constant)
    }

    fn bin_op(&mut self, op: ArithOp, lhs: Operand, rhs: Operand) -> Operand {
        let result = self.new_value(self.operand_type(lhs));
        self.emit(Instruction::Binary { result, op, lhs, rhs });
        Operand::Value(result)
    }

    fn cmp_op(&mut self, predicate: Predicate, lhs: Operand, rhs: Operand) -> Operand {
        let result = self.new_value(StaticType::Bool);
        self.emit(Instruction::Compare {
            result,
            predicate,
            lhs,
            rhs,
        });
        Operand::Value(result)
    }

    fn alloca_slot(&mut self, ty: StaticType, name: &str) -> SlotId {
        let display_name = self.unique_name(name);
        self.slots.push(SlotInfo {
            name: name.to_string(),
            display_name,
            ty,
        });
        let slot = SlotId(self.slots.len() - 1);
        self.emit(Instruction::Alloca { slot, ty });
        slot
    }

    fn load(&mut self, slot: SlotId) -> Operand {
        let result = self.new_value(self.slots[slot.0].ty);
        self.emit(Instruction::Load { result, slot });
        Operand::Value(result)
    }

    fn store(&mut self, value: Operand, slot: SlotId) {
        self.emit(Instruction::Store { value, slot });
    }

    fn emit_return(&mut self, value: Option<Operand>) {
        self.emit(Instruction::Ret { value });
    }

    fn verify(&self) -> Result<(), BackendError> {
        if self.layout.first() != Some(&BlockId(0)) {
            return Err(BackendError::Verification(String::from(
                "`entry` is not the first block of `main`",
            )));
        }

        for (index, block) in self.blocks.iter().enumerate() {
            if !self.is_in_function(BlockId(index)) && !block.instructions.is_empty() {
                return Err(BackendError::Verification(format!(
                    "block `{}` holds instructions but was never added to the function",
                    block.label
                )));
            }
        }

        self.layout
            .iter()
            .try_for_each(|block| self.verify_block(*block))
    }

    fn serialize(&self, path: &Path) -> Result<(), BackendError> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }

    fn execute(&self) -> Result<ExecutionResult, BackendError> {
        self.verify()?;
        Interpreter::new(self).run()
    }
}

impl Display for IrModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "define i32 @main() {{")?;
        for (position, block) in self.layout.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", self.label(*block))?;
            for instruction in self.instructions(*block) {
                writeln!(f, "  {}", self.fmt_instruction(instruction))?;
            }
        }
        writeln!(f, "}}")
    }
}

struct Interpreter<'m> {
    module: &'m IrModule,
    values: Vec<Option<RuntimeValue>>,
    slots: Vec<Option<RuntimeValue>>,
    steps: u64,
}

impl<'m> Interpreter<'m> {
    fn new(module: &'m IrModule) -> Self {
        Interpreter {
            module,
            values: vec![None; module.value_types.len()],
            slots: vec![None; module.slots.len()],
            steps: 0,
        }
    }

    fn run(mut self) -> Result<ExecutionResult, BackendError> {
        let module = self.module;
        let mut block = module.entry_block();

        loop {
            let mut next = None;

            for instruction in module.instructions(block) {
                self.steps += 1;
                if self.steps > self.module.step_limit {
                    return Err(BackendError::Execution(format!(
                        "step limit of {} exceeded",
                        self.module.step_limit
                    )));
                }

                match instruction {
                    Instruction::Alloca { slot, .. } => self.slots[slot.0] = None,
                    Instruction::Load { result, slot } => {
                        let value = self.slots[slot.0].ok_or_else(|| {
                            BackendError::Execution(format!(
                                "load from uninitialised slot `{}`",
                                self.module.slots[slot.0].display_name
                            ))
                        })?;
                        self.values[result.0] = Some(value);
                    }
                    Instruction::Store { value, slot } => {
                        self.slots[slot.0] = Some(self.read(*value)?);
                    }
                    Instruction::Binary { result, op, lhs, rhs } => {
                        let value = arithmetic(*op, self.read(*lhs)?, self.read(*rhs)?)?;
                        self.values[result.0] = Some(value);
                    }
                    Instruction::Compare {
                        result,
                        predicate,
                        lhs,
                        rhs,
                    } => {
                        let value = compare(*predicate, self.read(*lhs)?, self.read(*rhs)?)?;
                        self.values[result.0] = Some(RuntimeValue::Bool(value));
                    }
                    Instruction::Br { target } => next = Some(*target),
                    Instruction::CondBr {
                        condition,
                        then_block,
                        else_block,
                    } => {
                        next = match self.read(*condition)? {
                            RuntimeValue::Bool(true) => Some(*then_block),
                            RuntimeValue::Bool(false) => Some(*else_block),
                            other => {
                                return Err(BackendError::Execution(format!(
                                    "branch on non-boolean value {:?}",
                                    other
                                )))
                            }
                        };
                    }
                    Instruction::Ret { value } => {
                        let exit_code = match value {
                            None => 0,
                            Some(value) => match self.read(*value)? {
                                RuntimeValue::Int(code) => code as i32,
                                RuntimeValue::Bool(flag) => flag as i32,
                                RuntimeValue::Double(_) => {
                                    return Err(BackendError::Execution(String::from(
                                        "main returned a double",
                                    )))
                                }
                            },
                        };
                        return Ok(self.finish(exit_code));
                    }
                }
            }

            block = next.ok_or_else(|| {
                BackendError::Execution(format!(
                    "fell off the end of block `{}`",
                    self.module.label(block)
                ))
            })?;
        }
    }

    fn read(&self, operand: Operand) -> Result<RuntimeValue, BackendError> {
        match operand {
            Operand::Const(Constant::Int(value)) => Ok(RuntimeValue::Int(value)),
            Operand::Const(Constant::Double(value)) => Ok(RuntimeValue::Double(value)),
            Operand::Const(Constant::Bool(value)) => Ok(RuntimeValue::Bool(value)),
            Operand::Value(value) => self.values[value.0].ok_or_else(|| {
                BackendError::Execution(format!("%{} used before it was computed", value.0))
            }),
        }
    }

    fn finish(self, exit_code: i32) -> ExecutionResult {
        let variables = self
            .module
            .slots
            .iter()
            .zip(self.slots)
            .filter_map(|(info, value)| value.map(|value| (info.name.clone(), value)))
            .collect();

        ExecutionResult { exit_code, variables }
    }
}

fn arithmetic(op: ArithOp, lhs: RuntimeValue, rhs: RuntimeValue) -> Result<RuntimeValue, BackendError> {
    use RuntimeValue::{Double, Int};

    let value = match (op, lhs, rhs) {
        (ArithOp::Add, Int(a), Int(b)) => Int(a.wrapping_add(b)),
        (ArithOp::Sub, Int(a), Int(b)) => Int(a.wrapping_sub(b)),
        (ArithOp::Mul, Int(a), Int(b)) => Int(a.wrapping_mul(b)),
        (ArithOp::SDiv, Int(_), Int(0)) => {
            return Err(BackendError::Execution(String::from("integer division by zero")));
        }
        (ArithOp::SDiv, Int(a), Int(b)) => Int(a.checked_div(b).ok_or_else(|| {
            BackendError::Execution(String::from("integer division overflow"))
        })?),
        (ArithOp::FAdd, Double(a), Double(b)) => Double(a + b),
        (ArithOp::FSub, Double(a), Double(b)) => Double(a - b),
        (ArithOp::FMul, Double(a), Double(b)) => Double(a * b),
        (ArithOp::FDiv, Double(a), Double(b)) => Double(a / b),
        (op, lhs, rhs) => {
            return Err(BackendError::Execution(format!(
                "{} applied to {:?} and {:?}",
                op.mnemonic(),
                lhs,
                rhs
            )));
        }
    };
    Ok(value)
}

fn compare(predicate: Predicate, lhs: RuntimeValue, rhs: RuntimeValue) -> Result<bool, BackendError> {
    match (predicate, lhs, rhs) {
        (Predicate::Int(predicate), RuntimeValue::Int(a), RuntimeValue::Int(b)) => Ok(int_compare(predicate, a, b)),
        // i1 is signed in icmp: true is -1
        (Predicate::Int(predicate), RuntimeValue::Bool(a), RuntimeValue::Bool(b)) => {
            Ok(int_compare(predicate, -(a as i64), -(b as i64)))
        }
        (Predicate::Float(predicate), RuntimeValue::Double(a), RuntimeValue::Double(b)) => {
            if a.is_nan() || b.is_nan() {
                return Ok(true);
            }
            Ok(match predicate {
                FloatPredicate::Ueq => a == b,
                FloatPredicate::Une => a != b,
                FloatPredicate::Ult => a < b,
                FloatPredicate::Ule => a <= b,
                FloatPredicate::Ugt => a > b,
                FloatPredicate::Uge => a >= b,
            })
        }
        (predicate, lhs, rhs) => Err(BackendError::Execution(format!(
            "{} applied to {:?} and {:?}",
            predicate, lhs, rhs
        ))),
    }
}

fn int_compare(predicate: IntPredicate, a: i64, b: i64) -> bool {
    match predicate {
        IntPredicate::Eq => a == b,
        IntPredicate::Ne => a != b,
        IntPredicate::Slt => a < b,
        IntPredicate::Sle => a <= b,
        IntPredicate::Sgt => a > b,
        IntPredicate::Sge => a >= b,
    }
}
