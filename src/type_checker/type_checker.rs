use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::{BinaryOperator, SType, SecurityLabel, StaticType},
    },
    errors::errors::{Error, ErrorImpl},
    scope::scope::{Scope, Symbol},
    visitor::{
        phase::Phase,
        traversal::{walk, Visitor},
    },
};

/// Result of one node. `stype` is `None` when the node could not be typed;
/// the diagnostic for that was recorded where the failure happened, so
/// parents only propagate it.
#[derive(Debug, Clone, Copy)]
struct Computed {
    stype: Option<SType>,
    line: u32,
}

/// An `if` or `while` between its guard and its exit.
#[derive(Debug)]
struct BranchFrame {
    context: SecurityLabel,
    ok: bool,
}

/// The information-flow type checker.
///
/// Every node leaves exactly one [`Computed`] on the scratch stack for its
/// parent to consume. Errors are recorded as diagnostics and the walk
/// continues, so one run reports every independent problem.
#[derive(Debug)]
pub struct TypeChecker {
    scope: Scope<()>,
    types: Vec<Computed>,
    /// Scratch stack depth at each open block
    blocks: Vec<usize>,
    branches: Vec<BranchFrame>,
    /// Initializer of a declaration that failed. Compared by address only.
    failed_initializer: Option<*const Node>,
    diagnostics: Vec<Error>,
    verbose: bool,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut scope = Scope::new();
        scope.initialize(SecurityLabel::Low);

        TypeChecker {
            scope,
            types: vec![],
            blocks: vec![],
            branches: vec![],
            failed_initializer: None,
            diagnostics: vec![],
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    /// Type checks a whole program. Succeeds iff the root types to `Void`
    /// and nothing was reported.
    pub fn check(&mut self, root: &Node) -> bool {
        if self.verbose {
            println!("Type-checking code...");
        }

        walk(root, self);

        if self.scope.depth() != 1 {
            panic!(
                "internal compiler error: type checker scope depth is {} after the pass",
                self.scope.depth()
            );
        }

        let result = self.pop();
        if !self.types.is_empty()
            || !self.blocks.is_empty()
            || !self.branches.is_empty()
            || self.failed_initializer.is_some()
        {
            panic!("internal compiler error: type checker stacks not empty after the pass");
        }

        match result.stype {
            Some(stype) if stype.is_void() => self.diagnostics.is_empty(),
            Some(stype) => {
                self.report(ErrorImpl::BlockNotVoid { received: stype.ty.to_string() }, result.line);
                false
            }
            None => false,
        }
    }

    fn report(&mut self, error: ErrorImpl, line: u32) {
        if self.verbose {
            println!("TypeChecker error on line {}: {}", line, error);
        }
        self.diagnostics.push(Error::new(error, line));
    }

    fn push(&mut self, stype: Option<SType>, line: u32) {
        self.types.push(Computed { stype, line });
    }

    fn pop(&mut self) -> Computed {
        self.types
            .pop()
            .unwrap_or_else(|| panic!("internal compiler error: type checker scratch stack underflow"))
    }

    fn current_branch(&mut self) -> &mut BranchFrame {
        self.branches
            .last_mut()
            .unwrap_or_else(|| panic!("internal compiler error: branch phase outside of a branch"))
    }

    fn visit_block(&mut self, node: &Node, phase: Phase) {
        match phase {
            Phase::Enter => {
                self.scope.initialize(self.scope.current_security_context());
                self.blocks.push(self.types.len());
            }
            Phase::Exit => {
                self.scope.finalize();
                let depth = self
                    .blocks
                    .pop()
                    .unwrap_or_else(|| panic!("internal compiler error: block exit without enter"));

                let mut ok = true;
                for statement in self.types.split_off(depth) {
                    match statement.stype {
                        Some(stype) if stype.is_void() => {}
                        Some(stype) => {
                            self.report(ErrorImpl::BlockNotVoid { received: stype.ty.to_string() }, statement.line);
                            ok = false;
                        }
                        None => ok = false,
                    }
                }

                self.push(ok.then(SType::void), node.line);
            }
            _ => unexpected_phase(node, phase),
        }
    }

    /// Shared by `if` and `while`; `while` never sees the else phases.
    fn visit_branching(&mut self, node: &Node, phase: Phase) {
        match phase {
            Phase::Enter | Phase::GuardEnter => {}
            Phase::GuardExit => {
                let guard = self.pop();
                let outer = self.scope.current_security_context();

                let frame = match guard.stype {
                    Some(stype) if stype.ty == StaticType::Bool => BranchFrame {
                        context: outer.join(stype.security),
                        ok: true,
                    },
                    Some(stype) => {
                        self.report(ErrorImpl::GuardTypeError { received: stype.ty.to_string() }, node.line);
                        BranchFrame {
                            context: outer.join(stype.security),
                            ok: false,
                        }
                    }
                    None => BranchFrame {
                        context: outer,
                        ok: false,
                    },
                };

                if self.verbose {
                    println!("(Branch) Creating a new scope of security type: {}", frame.context);
                }
                self.branches.push(frame);
            }
            Phase::ThenEnter | Phase::ElseEnter => {
                let context = self.current_branch().context;
                self.scope.initialize(context);
            }
            Phase::ThenExit | Phase::ElseExit => {
                let branch = self.pop();
                let ok = match branch.stype {
                    Some(stype) if stype.is_void() => true,
                    Some(stype) => {
                        self.report(ErrorImpl::BlockNotVoid { received: stype.ty.to_string() }, branch.line);
                        false
                    }
                    None => false,
                };
                self.scope.finalize();
                self.current_branch().ok &= ok;
            }
            Phase::Exit => {
                let frame = self
                    .branches
                    .pop()
                    .unwrap_or_else(|| panic!("internal compiler error: branch exit without guard"));
                self.push(frame.ok.then(SType::void), node.line);
            }
            Phase::None => unexpected_phase(node, phase),
        }
    }

    fn visit_assignment(&mut self, node: &Node, target: &str) {
        let line = node.line;
        let value = self.pop();

        // Initializer of a rejected declaration
        if self
            .failed_initializer
            .is_some_and(|initializer| std::ptr::eq(initializer, node))
        {
            self.failed_initializer = None;
            self.push(None, line);
            return;
        }

        let Some(dtype) = self.scope.lookup(target).map(Symbol::stype) else {
            self.report(ErrorImpl::UndeclaredVariable { variable: target.to_string() }, line);
            self.push(None, line);
            return;
        };
        let Some(atype) = value.stype else {
            self.push(None, line);
            return;
        };

        let error = if dtype.security == SecurityLabel::Low && self.scope.current_security_context().is_high() {
            Some(ErrorImpl::SecurityViolationImplicit { variable: target.to_string() })
        } else if dtype.ty != atype.ty {
            Some(ErrorImpl::TypeMismatch {
                expected: dtype.ty.to_string(),
                received: atype.ty.to_string(),
            })
        } else if dtype.security == SecurityLabel::Low && atype.security.is_high() {
            Some(ErrorImpl::SecurityViolationExplicit { variable: target.to_string() })
        } else {
            None
        };

        match error {
            Some(error) => {
                self.report(error, line);
                self.push(None, line);
            }
            None => self.push(Some(SType::void()), line),
        }
    }

    fn visit_declaration(&mut self, id: &str, initializer: Option<&Node>, line: u32) {
        let security = self.pop();
        let ty = self.pop();

        if self.scope.is_declared_locally(id) {
            self.report(ErrorImpl::VariableRedeclaration { variable: id.to_string() }, line);
            self.fail_declaration(initializer, line);
            return;
        }

        let (Some(ty), Some(security)) = (ty.stype, security.stype) else {
            self.fail_declaration(initializer, line);
            return;
        };

        if self.verbose {
            println!("TypeChecker declaring {} as {} {}", id, security.security, ty.ty);
        }

        if let Err(error) = self.scope.insert(id, Symbol::new((), ty.ty, security.security)) {
            self.report(error, line);
            self.fail_declaration(initializer, line);
            return;
        }
        self.push(Some(SType::void()), line);
    }

    /// Marks the declaration untyped. Its initializer is still walked but
    /// reports nothing, since there is no binding to check it against.
    fn fail_declaration(&mut self, initializer: Option<&Node>, line: u32) {
        self.failed_initializer = initializer.map(|initializer| initializer as *const Node);
        self.push(None, line);
    }

    fn visit_binary(&mut self, op: BinaryOperator, line: u32) {
        let rhs = self.pop();
        let lhs = self.pop();

        let (Some(tlhs), Some(trhs)) = (lhs.stype, rhs.stype) else {
            self.push(None, line);
            return;
        };
        let security = tlhs.security.join(trhs.security);

        let operands_match = tlhs.ty == trhs.ty
            && (tlhs.ty.is_numeric() || (op.is_equality() && tlhs.ty == StaticType::Bool));

        if !operands_match {
            self.report(
                ErrorImpl::TypeMismatch {
                    expected: tlhs.ty.to_string(),
                    received: trhs.ty.to_string(),
                },
                line,
            );
            self.push(None, line);
            return;
        }

        let ty = if op.is_arithmetic() { tlhs.ty } else { StaticType::Bool };
        self.push(Some(SType::new(ty, security)), line);
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        TypeChecker::new()
    }
}

impl<'ast> Visitor<'ast> for TypeChecker {
    fn visit(&mut self, node: &'ast Node, phase: Phase) {
        if self.verbose {
            println!("TypeChecker {} {}", node.tag(), phase);
        }

        match &node.kind {
            NodeKind::Block(_) => self.visit_block(node, phase),
            NodeKind::IfExpr { .. } | NodeKind::WhileExpr { .. } => self.visit_branching(node, phase),
            _ if phase != Phase::None => unexpected_phase(node, phase),
            NodeKind::Skip => self.push(Some(SType::void()), node.line),
            NodeKind::IntLiteral(_) => self.push(Some(SType::low(StaticType::Int64)), node.line),
            NodeKind::DoubleLiteral(_) => self.push(Some(SType::low(StaticType::Double)), node.line),
            NodeKind::BoolLiteral(_) => self.push(Some(SType::low(StaticType::Bool)), node.line),
            NodeKind::TypeAnnotation(name) => {
                self.push(Some(SType::low(StaticType::from_annotation(name))), node.line)
            }
            NodeKind::SecurityAnnotation(label) => self.push(
                Some(SType::new(StaticType::Void, label.unwrap_or_default())),
                node.line,
            ),
            NodeKind::Identifier(name) => match self.scope.lookup(name).map(Symbol::stype) {
                Some(stype) => self.push(Some(stype), node.line),
                None => {
                    self.report(ErrorImpl::UndeclaredVariable { variable: name.clone() }, node.line);
                    self.push(None, node.line);
                }
            },
            NodeKind::Assignment { target, .. } => self.visit_assignment(node, target),
            NodeKind::VariableDeclaration { id, initializer, .. } => {
                self.visit_declaration(id, initializer.as_deref(), node.line)
            }
            NodeKind::BinaryOp { op, .. } => self.visit_binary(*op, node.line),
            NodeKind::ExpressionStatement(_) => {
                let expression = self.pop();
                self.push(expression.stype.map(|_| SType::void()), node.line);
            }
        }
    }
}

fn unexpected_phase(node: &Node, phase: Phase) -> ! {
    panic!(
        "internal compiler error: {} visited with unexpected phase {}",
        node.tag(),
        phase
    )
}

/// Type checks `root` with a fresh checker and a `Low` global scope.
///
/// Returns whether the program passed together with every diagnostic.
pub fn type_check(root: &Node, verbose: bool) -> (bool, Vec<Error>) {
    let mut type_checker = TypeChecker::new().with_verbose(verbose);
    let passed = type_checker.check(root);
    (passed, type_checker.diagnostics)
}
