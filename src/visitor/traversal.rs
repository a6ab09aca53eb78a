use crate::ast::ast::{Node, NodeKind};

use super::phase::Phase;

/// One visitor callback: a node and the phase it is being visited in.
#[derive(Debug, Clone, Copy)]
pub struct Event<'ast> {
    pub node: &'ast Node,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy)]
enum Work<'ast> {
    Expand(&'ast Node),
    Emit(&'ast Node, Phase),
}

/// Depth-first, non-recursive walk of a tree yielding the callback sequence
/// every visitor receives.
///
/// Sequences per node:
///
/// - `Block`: `Enter`, statements, `Exit`
/// - `IfExpr`: `Enter`, `GuardEnter`, guard, `GuardExit`, `ThenEnter`, then,
///   `ThenExit`, `ElseEnter`, else, `ElseExit`, `Exit`
/// - `WhileExpr`: as `IfExpr` without the else part
/// - `BinaryOp`: lhs, rhs, `None`
/// - `Assignment` and `ExpressionStatement`: child, `None`
/// - `VariableDeclaration`: type, security, `None`, then the implicit
///   initializer assignment if there is one
/// - everything else: `None`
///
/// Cloning forks the walk at its current position; [`Traversal::new`] on the
/// same root starts it over.
#[derive(Debug, Clone)]
pub struct Traversal<'ast> {
    work: Vec<Work<'ast>>,
}

impl<'ast> Traversal<'ast> {
    pub fn new(root: &'ast Node) -> Self {
        Traversal {
            work: vec![Work::Expand(root)],
        }
    }

    /// Pushes the work for `node` in reverse so it pops in visiting order.
    fn expand(&mut self, node: &'ast Node) {
        match &node.kind {
            NodeKind::Block(statements) => {
                self.work.push(Work::Emit(node, Phase::Exit));
                for statement in statements.iter().rev() {
                    self.work.push(Work::Expand(statement));
                }
                self.work.push(Work::Emit(node, Phase::Enter));
            }
            NodeKind::IfExpr {
                guard,
                then_block,
                else_block,
            } => {
                self.work.push(Work::Emit(node, Phase::Exit));
                self.work.push(Work::Emit(node, Phase::ElseExit));
                self.work.push(Work::Expand(else_block));
                self.work.push(Work::Emit(node, Phase::ElseEnter));
                self.work.push(Work::Emit(node, Phase::ThenExit));
                self.work.push(Work::Expand(then_block));
                self.work.push(Work::Emit(node, Phase::ThenEnter));
                self.work.push(Work::Emit(node, Phase::GuardExit));
                self.work.push(Work::Expand(guard));
                self.work.push(Work::Emit(node, Phase::GuardEnter));
                self.work.push(Work::Emit(node, Phase::Enter));
            }
            NodeKind::WhileExpr { guard, body } => {
                self.work.push(Work::Emit(node, Phase::Exit));
                self.work.push(Work::Emit(node, Phase::ThenExit));
                self.work.push(Work::Expand(body));
                self.work.push(Work::Emit(node, Phase::ThenEnter));
                self.work.push(Work::Emit(node, Phase::GuardExit));
                self.work.push(Work::Expand(guard));
                self.work.push(Work::Emit(node, Phase::GuardEnter));
                self.work.push(Work::Emit(node, Phase::Enter));
            }
            NodeKind::BinaryOp { lhs, rhs, .. } => {
                self.work.push(Work::Emit(node, Phase::None));
                self.work.push(Work::Expand(rhs));
                self.work.push(Work::Expand(lhs));
            }
            NodeKind::Assignment { value, .. } => {
                self.work.push(Work::Emit(node, Phase::None));
                self.work.push(Work::Expand(value));
            }
            NodeKind::ExpressionStatement(expression) => {
                self.work.push(Work::Emit(node, Phase::None));
                self.work.push(Work::Expand(expression));
            }
            NodeKind::VariableDeclaration {
                ty,
                security,
                initializer,
                ..
            } => {
                if let Some(assignment) = initializer {
                    self.work.push(Work::Expand(assignment));
                }
                self.work.push(Work::Emit(node, Phase::None));
                self.work.push(Work::Expand(security));
                self.work.push(Work::Expand(ty));
            }
            NodeKind::Skip
            | NodeKind::IntLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::DoubleLiteral(_)
            | NodeKind::TypeAnnotation(_)
            | NodeKind::SecurityAnnotation(_)
            | NodeKind::Identifier(_) => {
                self.work.push(Work::Emit(node, Phase::None));
            }
        }
    }
}

impl<'ast> Iterator for Traversal<'ast> {
    type Item = Event<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.work.pop()? {
                Work::Emit(node, phase) => return Some(Event { node, phase }),
                Work::Expand(node) => self.expand(node),
            }
        }
    }
}

/// Receives the traversal's callbacks. Implementations keep whatever state
/// they need between callbacks; the traversal itself keeps none for them.
pub trait Visitor<'ast> {
    fn visit(&mut self, node: &'ast Node, phase: Phase);
}

/// Drives `visitor` over the whole tree rooted at `root`.
pub fn walk<'ast, V: Visitor<'ast> + ?Sized>(root: &'ast Node, visitor: &mut V) {
    for event in Traversal::new(root) {
        visitor.visit(event.node, event.phase);
    }
}
