use super::types::{BinaryOperator, SecurityLabel};

/// A node of the syntax tree together with the source line it came from.
///
/// Trees are built once and never mutated. Children are owned, so the tree
/// has no sharing and no cycles; identifiers refer to variables by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Skip,
    IntLiteral(i64),
    BoolLiteral(bool),
    DoubleLiteral(f64),
    TypeAnnotation(String),
    /// `None` when the declaration carried no label.
    SecurityAnnotation(Option<SecurityLabel>),
    Identifier(String),
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Assignment {
        target: String,
        value: Box<Node>,
    },
    Block(Vec<Node>),
    IfExpr {
        guard: Box<Node>,
        then_block: Box<Node>,
        else_block: Box<Node>,
    },
    WhileExpr {
        guard: Box<Node>,
        body: Box<Node>,
    },
    ExpressionStatement(Box<Node>),
    VariableDeclaration {
        ty: Box<Node>,
        security: Box<Node>,
        id: String,
        /// The initializer, already wrapped in an `Assignment` to `id` carrying
        /// the declaration's line. Built by [`Node::variable_declaration`].
        initializer: Option<Box<Node>>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Node { kind, line }
    }

    pub fn skip(line: u32) -> Self {
        Node::new(NodeKind::Skip, line)
    }

    pub fn int(value: i64, line: u32) -> Self {
        Node::new(NodeKind::IntLiteral(value), line)
    }

    pub fn boolean(value: bool, line: u32) -> Self {
        Node::new(NodeKind::BoolLiteral(value), line)
    }

    pub fn double(value: f64, line: u32) -> Self {
        Node::new(NodeKind::DoubleLiteral(value), line)
    }

    pub fn identifier(name: impl Into<String>, line: u32) -> Self {
        Node::new(NodeKind::Identifier(name.into()), line)
    }

    pub fn binary(op: BinaryOperator, lhs: Node, rhs: Node, line: u32) -> Self {
        Node::new(
            NodeKind::BinaryOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            line,
        )
    }

    pub fn assignment(target: impl Into<String>, value: Node, line: u32) -> Self {
        Node::new(
            NodeKind::Assignment {
                target: target.into(),
                value: Box::new(value),
            },
            line,
        )
    }

    pub fn block(statements: Vec<Node>, line: u32) -> Self {
        Node::new(NodeKind::Block(statements), line)
    }

    pub fn if_expr(guard: Node, then_block: Node, else_block: Node, line: u32) -> Self {
        Node::new(
            NodeKind::IfExpr {
                guard: Box::new(guard),
                then_block: Box::new(then_block),
                else_block: Box::new(else_block),
            },
            line,
        )
    }

    pub fn while_expr(guard: Node, body: Node, line: u32) -> Self {
        Node::new(
            NodeKind::WhileExpr {
                guard: Box::new(guard),
                body: Box::new(body),
            },
            line,
        )
    }

    pub fn expression_statement(expression: Node, line: u32) -> Self {
        Node::new(NodeKind::ExpressionStatement(Box::new(expression)), line)
    }

    /// Builds a declaration `security type id = initializer`.
    ///
    /// The initializer is stored as the implicit `Assignment(id, initializer)`
    /// that traversal visits right after the declaration itself.
    pub fn variable_declaration(
        type_name: impl Into<String>,
        security: Option<SecurityLabel>,
        id: impl Into<String>,
        initializer: Option<Node>,
        line: u32,
    ) -> Self {
        let id = id.into();
        let initializer = initializer.map(|value| Box::new(Node::assignment(id.clone(), value, line)));

        Node::new(
            NodeKind::VariableDeclaration {
                ty: Box::new(Node::new(NodeKind::TypeAnnotation(type_name.into()), line)),
                security: Box::new(Node::new(NodeKind::SecurityAnnotation(security), line)),
                id,
                initializer,
            },
            line,
        )
    }

    /// Short name of the variant, used by trace output and event recording.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Skip => "Skip",
            NodeKind::IntLiteral(_) => "IntLiteral",
            NodeKind::BoolLiteral(_) => "BoolLiteral",
            NodeKind::DoubleLiteral(_) => "DoubleLiteral",
            NodeKind::TypeAnnotation(_) => "TypeAnnotation",
            NodeKind::SecurityAnnotation(_) => "SecurityAnnotation",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Block(_) => "Block",
            NodeKind::IfExpr { .. } => "IfExpr",
            NodeKind::WhileExpr { .. } => "WhileExpr",
            NodeKind::ExpressionStatement(_) => "ExpressionStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
        }
    }

    /// Whether lowering this node leaves exactly one value behind for its
    /// parent. Every other node leaves nothing.
    pub fn produces_value(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::IntLiteral(_)
                | NodeKind::BoolLiteral(_)
                | NodeKind::DoubleLiteral(_)
                | NodeKind::Identifier(_)
                | NodeKind::BinaryOp { .. }
        )
    }

    /// The initializer expression of a declaration, if any.
    pub fn initializer(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::VariableDeclaration {
                initializer: Some(assignment),
                ..
            } => match &assignment.kind {
                NodeKind::Assignment { value, .. } => Some(value),
                _ => None,
            },
            _ => None,
        }
    }
}
