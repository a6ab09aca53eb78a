//! Lowering of a type-checked tree to backend instructions.
//!
//! The [`CodeGenerator`] is a [`Visitor`]: it never recurses over the tree.
//! Child expressions hand their results to the parent through a value stack,
//! and `if`/`while` keep their blocks in frames that live from the phase
//! that creates them to the phase that closes them.

use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::{BinaryOperator, SecurityLabel, StaticType},
    },
    scope::scope::{Scope, Symbol},
    visitor::{
        phase::Phase,
        traversal::{walk, Visitor},
    },
};

use super::backend::{ArithOp, Backend, Constant, FloatPredicate, IntPredicate, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfState {
    GuardDone,
    InThen,
    InElse,
}

#[derive(Debug)]
struct IfFrame<K> {
    then_block: K,
    else_block: K,
    merge_block: K,
    state: IfState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhileState {
    CondReady,
    GuardDone,
    InBody,
}

#[derive(Debug)]
struct WhileFrame<K> {
    cond_block: K,
    body_block: K,
    end_block: K,
    state: WhileState,
}

/// Drives a [`Backend`] from the event stream of a well-typed tree.
///
/// The input must have passed the type checker. Anything that breaks that
/// contract (an unbound name, a phase out of order, an unbalanced stack) is
/// an internal compiler error and panics.
pub struct CodeGenerator<B: Backend> {
    backend: B,
    scope: Scope<B::Slot>,
    values: Vec<(B::Value, StaticType)>,
    if_frames: Vec<IfFrame<B::Block>>,
    while_frames: Vec<WhileFrame<B::Block>>,
    /// Value stack depth at each open block
    block_depths: Vec<usize>,
    verbose: bool,
}

impl<B: Backend> CodeGenerator<B> {
    /// Takes a backend whose insertion point is the entry block of `main`.
    pub fn new(backend: B) -> Self {
        let mut scope = Scope::new();
        scope.initialize(SecurityLabel::Low);

        CodeGenerator {
            backend,
            scope,
            values: vec![],
            if_frames: vec![],
            while_frames: vec![],
            block_depths: vec![],
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    pub fn value_depth(&self) -> usize {
        self.values.len()
    }

    /// Lowers every statement of `root` at the current insertion point.
    pub fn generate(&mut self, root: &Node) {
        if self.verbose {
            println!("Generating code...");
        }
        walk(root, self);
    }

    /// Emits the return from `main` and hands the backend back.
    pub fn finish(mut self) -> B {
        self.backend.emit_return(None);

        if self.scope.depth() != 1 {
            internal_error(format!(
                "code generator scope depth is {} after the pass",
                self.scope.depth()
            ));
        }
        if !self.values.is_empty() {
            internal_error(format!(
                "{} values left on the code generator stack",
                self.values.len()
            ));
        }
        if !self.if_frames.is_empty() || !self.while_frames.is_empty() || !self.block_depths.is_empty() {
            internal_error("unclosed control structure after the pass");
        }

        self.backend
    }

    fn push(&mut self, value: B::Value, ty: StaticType) {
        self.values.push((value, ty));
    }

    fn pop(&mut self) -> (B::Value, StaticType) {
        self.values
            .pop()
            .unwrap_or_else(|| internal_error("code generator value stack underflow"))
    }

    fn slot_of(&self, name: &str) -> B::Slot {
        match self.scope.lookup(name) {
            Some(symbol) => symbol.slot,
            None => internal_error(format!("no slot bound to `{}`", name)),
        }
    }

    fn visit_block(&mut self, phase: Phase) {
        match phase {
            Phase::Enter => {
                self.scope.initialize(self.scope.current_security_context());
                self.block_depths.push(self.values.len());
            }
            Phase::Exit => {
                self.scope.finalize();
                let depth = self
                    .block_depths
                    .pop()
                    .unwrap_or_else(|| internal_error("block exit without enter"));
                if depth != self.values.len() {
                    internal_error(format!(
                        "block left {} values on the stack",
                        self.values.len() as isize - depth as isize
                    ));
                }
            }
            _ => internal_error(format!("block visited with phase {}", phase)),
        }
    }

    fn visit_if(&mut self, phase: Phase) {
        match phase {
            Phase::Enter | Phase::GuardEnter => {}
            Phase::GuardExit => {
                let (guard, _) = self.pop();

                let then_block = self.backend.create_block("then");
                let else_block = self.backend.create_block("else");
                let merge_block = self.backend.create_block("merge");
                self.backend.append_block_to_function(then_block);
                self.backend.cond_branch(guard, then_block, else_block);

                self.if_frames.push(IfFrame {
                    then_block,
                    else_block,
                    merge_block,
                    state: IfState::GuardDone,
                });
            }
            Phase::ThenEnter => {
                let frame = self.if_frame(IfState::GuardDone, phase);
                frame.state = IfState::InThen;
                let then_block = frame.then_block;
                self.backend.set_insertion_point(then_block);
            }
            Phase::ThenExit => {
                let merge_block = self.if_frame(IfState::InThen, phase).merge_block;
                self.backend.branch(merge_block);
            }
            Phase::ElseEnter => {
                let frame = self.if_frame(IfState::InThen, phase);
                frame.state = IfState::InElse;
                let else_block = frame.else_block;
                self.backend.append_block_to_function(else_block);
                self.backend.set_insertion_point(else_block);
            }
            Phase::ElseExit => {
                let merge_block = self.if_frame(IfState::InElse, phase).merge_block;
                self.backend.branch(merge_block);
            }
            Phase::Exit => {
                let merge_block = self.if_frame(IfState::InElse, phase).merge_block;
                self.if_frames.pop();
                self.backend.append_block_to_function(merge_block);
                self.backend.set_insertion_point(merge_block);
            }
            Phase::None => internal_error("if visited without a phase"),
        }
    }

    fn if_frame(&mut self, expected: IfState, phase: Phase) -> &mut IfFrame<B::Block> {
        match self.if_frames.last_mut() {
            Some(frame) if frame.state == expected => frame,
            Some(frame) => internal_error(format!("if frame in state {:?} at phase {}", frame.state, phase)),
            None => internal_error(format!("if phase {} without a frame", phase)),
        }
    }

    fn visit_while(&mut self, phase: Phase) {
        match phase {
            Phase::Enter => {}
            Phase::GuardEnter => {
                let cond_block = self.backend.create_block("cond");
                let body_block = self.backend.create_block("body");
                let end_block = self.backend.create_block("end");

                self.backend.branch(cond_block);
                self.backend.append_block_to_function(cond_block);
                self.backend.set_insertion_point(cond_block);

                self.while_frames.push(WhileFrame {
                    cond_block,
                    body_block,
                    end_block,
                    state: WhileState::CondReady,
                });
            }
            Phase::GuardExit => {
                self.while_frame(WhileState::CondReady, phase).state = WhileState::GuardDone;
            }
            Phase::ThenEnter => {
                let (guard, _) = self.pop();
                let frame = self.while_frame(WhileState::GuardDone, phase);
                frame.state = WhileState::InBody;
                let (body_block, end_block) = (frame.body_block, frame.end_block);

                self.backend.cond_branch(guard, body_block, end_block);
                self.backend.append_block_to_function(body_block);
                self.backend.set_insertion_point(body_block);
            }
            Phase::ThenExit => {
                let cond_block = self.while_frame(WhileState::InBody, phase).cond_block;
                self.backend.branch(cond_block);
            }
            Phase::Exit => {
                let end_block = self.while_frame(WhileState::InBody, phase).end_block;
                self.while_frames.pop();
                self.backend.append_block_to_function(end_block);
                self.backend.set_insertion_point(end_block);
            }
            _ => internal_error(format!("while visited with phase {}", phase)),
        }
    }

    fn while_frame(&mut self, expected: WhileState, phase: Phase) -> &mut WhileFrame<B::Block> {
        match self.while_frames.last_mut() {
            Some(frame) if frame.state == expected => frame,
            Some(frame) => internal_error(format!("while frame in state {:?} at phase {}", frame.state, phase)),
            None => internal_error(format!("while phase {} without a frame", phase)),
        }
    }

    fn visit_declaration(&mut self, ty: &Node, security: &Node, id: &str) {
        let ty = match &ty.kind {
            NodeKind::TypeAnnotation(name) => StaticType::from_annotation(name),
            _ => internal_error("declaration without a type annotation"),
        };
        let security = match &security.kind {
            NodeKind::SecurityAnnotation(label) => label.unwrap_or_default(),
            _ => internal_error("declaration without a security annotation"),
        };

        let slot = self.backend.alloca_slot(ty, id);
        if let Err(error) = self.scope.insert(id, Symbol::new(slot, ty, security)) {
            internal_error(error.to_string());
        }
    }

    fn visit_binary(&mut self, op: BinaryOperator) {
        let (rhs, rhs_ty) = self.pop();
        let (lhs, lhs_ty) = self.pop();
        if lhs_ty != rhs_ty {
            internal_error(format!("{} applied to {} and {}", op, lhs_ty, rhs_ty));
        }

        if op.is_arithmetic() {
            let instruction = arithmetic_instruction(op, lhs_ty);
            let value = self.backend.bin_op(instruction, lhs, rhs);
            self.push(value, lhs_ty);
        } else {
            let predicate = comparison_predicate(op, lhs_ty);
            let value = self.backend.cmp_op(predicate, lhs, rhs);
            self.push(value, StaticType::Bool);
        }
    }
}

impl<'ast, B: Backend> Visitor<'ast> for CodeGenerator<B> {
    fn visit(&mut self, node: &'ast Node, phase: Phase) {
        if self.verbose {
            println!("CodeGenerator {} {}", node.tag(), phase);
        }

        match &node.kind {
            NodeKind::Block(_) => self.visit_block(phase),
            NodeKind::IfExpr { .. } => self.visit_if(phase),
            NodeKind::WhileExpr { .. } => self.visit_while(phase),
            _ if phase != Phase::None => {
                internal_error(format!("{} visited with phase {}", node.tag(), phase))
            }
            NodeKind::Skip | NodeKind::TypeAnnotation(_) | NodeKind::SecurityAnnotation(_) => {}
            NodeKind::IntLiteral(value) => {
                let value = self.backend.constant(Constant::Int(*value));
                self.push(value, StaticType::Int64);
            }
            NodeKind::DoubleLiteral(value) => {
                let value = self.backend.constant(Constant::Double(*value));
                self.push(value, StaticType::Double);
            }
            NodeKind::BoolLiteral(value) => {
                let value = self.backend.constant(Constant::Bool(*value));
                self.push(value, StaticType::Bool);
            }
            NodeKind::Identifier(name) => {
                let (slot, ty) = match self.scope.lookup(name) {
                    Some(symbol) => (symbol.slot, symbol.ty),
                    None => internal_error(format!("no slot bound to `{}`", name)),
                };
                let value = self.backend.load(slot);
                self.push(value, ty);
            }
            NodeKind::Assignment { target, .. } => {
                let (value, _) = self.pop();
                let slot = self.slot_of(target);
                self.backend.store(value, slot);
            }
            NodeKind::VariableDeclaration { ty, security, id, .. } => self.visit_declaration(ty, security, id),
            NodeKind::BinaryOp { op, .. } => self.visit_binary(*op),
            NodeKind::ExpressionStatement(expression) => {
                if expression.produces_value() {
                    self.pop();
                }
            }
        }
    }
}

fn arithmetic_instruction(op: BinaryOperator, ty: StaticType) -> ArithOp {
    match (op, ty) {
        (BinaryOperator::Add, StaticType::Int64) => ArithOp::Add,
        (BinaryOperator::Sub, StaticType::Int64) => ArithOp::Sub,
        (BinaryOperator::Mul, StaticType::Int64) => ArithOp::Mul,
        (BinaryOperator::Div, StaticType::Int64) => ArithOp::SDiv,
        (BinaryOperator::Add, StaticType::Double) => ArithOp::FAdd,
        (BinaryOperator::Sub, StaticType::Double) => ArithOp::FSub,
        (BinaryOperator::Mul, StaticType::Double) => ArithOp::FMul,
        (BinaryOperator::Div, StaticType::Double) => ArithOp::FDiv,
        _ => internal_error(format!("no arithmetic instruction for {} on {}", op, ty)),
    }
}

fn comparison_predicate(op: BinaryOperator, ty: StaticType) -> Predicate {
    match ty {
        StaticType::Int64 | StaticType::Bool => {
            let predicate = match op {
                BinaryOperator::Equal => IntPredicate::Eq,
                BinaryOperator::NotEqual => IntPredicate::Ne,
                BinaryOperator::Less if ty == StaticType::Int64 => IntPredicate::Slt,
                BinaryOperator::LessEqual if ty == StaticType::Int64 => IntPredicate::Sle,
                BinaryOperator::Greater if ty == StaticType::Int64 => IntPredicate::Sgt,
                BinaryOperator::GreaterEqual if ty == StaticType::Int64 => IntPredicate::Sge,
                _ => internal_error(format!("no comparison for {} on {}", op, ty)),
            };
            Predicate::Int(predicate)
        }
        StaticType::Double => {
            let predicate = match op {
                BinaryOperator::Equal => FloatPredicate::Ueq,
                BinaryOperator::NotEqual => FloatPredicate::Une,
                BinaryOperator::Less => FloatPredicate::Ult,
                BinaryOperator::LessEqual => FloatPredicate::Ule,
                BinaryOperator::Greater => FloatPredicate::Ugt,
                BinaryOperator::GreaterEqual => FloatPredicate::Uge,
                _ => internal_error(format!("no comparison for {} on {}", op, ty)),
            };
            Predicate::Float(predicate)
        }
        StaticType::Void => internal_error(format!("{} applied to void operands", op)),
    }
}

fn internal_error(message: impl std::fmt::Display) -> ! {
    panic!("internal compiler error: {}", message)
}

/// Lowers a program that passed type checking into `backend` and returns it
/// with `main` terminated.
pub fn lower<B: Backend>(root: &Node, backend: B, verbose: bool) -> B {
    let mut generator = CodeGenerator::new(backend).with_verbose(verbose);
    generator.generate(root);
    generator.finish()
}
