//! Unit tests for the traversal protocol.
//!
//! Each test asserts the literal callback sequence for one node shape.

use crate::ast::{
    ast::Node,
    types::{BinaryOperator, SecurityLabel},
};

use super::{
    phase::Phase,
    recorder::EventRecorder,
    traversal::{walk, Traversal},
};

fn record(root: &Node) -> Vec<String> {
    let mut recorder = EventRecorder::new();
    walk(root, &mut recorder);
    recorder.lines()
}

#[test]
fn test_leaf_is_visited_once() {
    assert_eq!(record(&Node::int(1, 1)), vec!["IntLiteral"]);
    assert_eq!(record(&Node::skip(1)), vec!["Skip"]);
    assert_eq!(record(&Node::identifier("x", 1)), vec!["Identifier"]);
}

#[test]
fn test_block_sequence() {
    let block = Node::block(vec![Node::skip(1), Node::int(2, 1)], 1);

    assert_eq!(
        record(&block),
        vec!["Block(Enter)", "Skip", "IntLiteral", "Block(Exit)"]
    );
}

#[test]
fn test_binary_op_visits_children_first() {
    let expr = Node::binary(BinaryOperator::Add, Node::identifier("x", 1), Node::int(2, 1), 1);

    assert_eq!(record(&expr), vec!["Identifier", "IntLiteral", "BinaryOp"]);
}

#[test]
fn test_assignment_sequence() {
    let assignment = Node::assignment("x", Node::int(1, 1), 1);
    assert_eq!(record(&assignment), vec!["IntLiteral", "Assignment"]);
}

#[test]
fn test_expression_statement_sequence() {
    let statement = Node::expression_statement(Node::assignment("x", Node::int(1, 1), 1), 1);
    assert_eq!(
        record(&statement),
        vec!["IntLiteral", "Assignment", "ExpressionStatement"]
    );
}

#[test]
fn test_declaration_sequence_with_initializer() {
    let decl = Node::variable_declaration("int", Some(SecurityLabel::High), "x", Some(Node::int(5, 1)), 1);

    assert_eq!(
        record(&decl),
        vec![
            "TypeAnnotation",
            "SecurityAnnotation",
            "VariableDeclaration",
            "IntLiteral",
            "Assignment",
        ]
    );
}

#[test]
fn test_declaration_sequence_without_initializer() {
    let decl = Node::variable_declaration("int", None, "x", None, 1);

    assert_eq!(
        record(&decl),
        vec!["TypeAnnotation", "SecurityAnnotation", "VariableDeclaration"]
    );
}

#[test]
fn test_if_sequence() {
    let if_expr = Node::if_expr(
        Node::boolean(true, 1),
        Node::block(vec![Node::skip(1)], 1),
        Node::block(vec![], 1),
        1,
    );

    assert_eq!(
        record(&if_expr),
        vec![
            "IfExpr(Enter)",
            "IfExpr(Guard|Enter)",
            "BoolLiteral",
            "IfExpr(Guard|Exit)",
            "IfExpr(Then|Enter)",
            "Block(Enter)",
            "Skip",
            "Block(Exit)",
            "IfExpr(Then|Exit)",
            "IfExpr(Else|Enter)",
            "Block(Enter)",
            "Block(Exit)",
            "IfExpr(Else|Exit)",
            "IfExpr(Exit)",
        ]
    );
}

#[test]
fn test_while_sequence() {
    let while_expr = Node::while_expr(
        Node::binary(BinaryOperator::Less, Node::identifier("x", 1), Node::int(10, 1), 1),
        Node::block(vec![], 1),
        1,
    );

    assert_eq!(
        record(&while_expr),
        vec![
            "WhileExpr(Enter)",
            "WhileExpr(Guard|Enter)",
            "Identifier",
            "IntLiteral",
            "BinaryOp",
            "WhileExpr(Guard|Exit)",
            "WhileExpr(Then|Enter)",
            "Block(Enter)",
            "Block(Exit)",
            "WhileExpr(Then|Exit)",
            "WhileExpr(Exit)",
        ]
    );
}

#[test]
fn test_nested_structures_are_balanced() {
    let program = Node::block(
        vec![
            Node::variable_declaration("int", None, "x", Some(Node::int(0, 1)), 1),
            Node::while_expr(
                Node::binary(BinaryOperator::Less, Node::identifier("x", 2), Node::int(3, 2), 2),
                Node::block(
                    vec![Node::if_expr(
                        Node::boolean(false, 3),
                        Node::block(vec![], 3),
                        Node::block(vec![], 3),
                        3,
                    )],
                    2,
                ),
                2,
            ),
        ],
        1,
    );

    let events: Vec<_> = Traversal::new(&program).collect();
    let enters = events.iter().filter(|event| event.phase.is_enter()).count();
    let exits = events.iter().filter(|event| event.phase.is_exit()).count();

    assert_eq!(enters, exits);
    assert_eq!(events.first().map(|event| event.phase), Some(Phase::Enter));
    assert_eq!(events.last().map(|event| event.phase), Some(Phase::Exit));
}

#[test]
fn test_traversal_restarts() {
    let program = Node::block(vec![Node::int(1, 1)], 1);

    let first: Vec<_> = Traversal::new(&program).map(|event| event.phase).collect();
    let second: Vec<_> = Traversal::new(&program).map(|event| event.phase).collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_phase_display() {
    assert_eq!(Phase::GuardEnter.to_string(), "Guard|Enter");
    assert_eq!(Phase::ElseExit.to_string(), "Else|Exit");
    assert_eq!(Phase::None.to_string(), "None");
}
