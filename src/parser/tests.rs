//! Unit tests for the parser module.

use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::{BinaryOperator, SecurityLabel},
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

use super::parser::parse;

fn parse_source(source: &str) -> Result<Node, Error> {
    parse(tokenize(source).unwrap())
}

fn statements(source: &str) -> Vec<Node> {
    match parse_source(source).unwrap().kind {
        NodeKind::Block(statements) => statements,
        other => panic!("root is not a block: {:?}", other),
    }
}

fn single(source: &str) -> Node {
    let mut statements = statements(source);
    assert_eq!(statements.len(), 1);
    statements.remove(0)
}

#[test]
fn test_parse_declarations() {
    let node = single("high int x = 42;");
    assert_eq!(
        node,
        Node::variable_declaration("int", Some(SecurityLabel::High), "x", Some(Node::int(42, 1)), 1)
    );

    let node = single("double d;");
    assert_eq!(node, Node::variable_declaration("double", None, "d", None, 1));

    let node = single("low bool b = true;");
    assert_eq!(
        node,
        Node::variable_declaration("bool", Some(SecurityLabel::Low), "b", Some(Node::boolean(true, 1)), 1)
    );
}

#[test]
fn test_parse_literals() {
    let node = single("1.5;");
    assert_eq!(node, Node::expression_statement(Node::double(1.5, 1), 1));

    let node = single("false;");
    assert_eq!(node, Node::expression_statement(Node::boolean(false, 1), 1));
}

#[test]
fn test_parse_precedence() {
    // 1 + 2 * 3 < 4 - 5
    let node = single("1 + 2 * 3 < 4 - 5;");
    let expected = Node::binary(
        BinaryOperator::Less,
        Node::binary(
            BinaryOperator::Add,
            Node::int(1, 1),
            Node::binary(BinaryOperator::Mul, Node::int(2, 1), Node::int(3, 1), 1),
            1,
        ),
        Node::binary(BinaryOperator::Sub, Node::int(4, 1), Node::int(5, 1), 1),
        1,
    );
    assert_eq!(node, Node::expression_statement(expected, 1));
}

#[test]
fn test_parse_left_associative_and_grouping() {
    let node = single("(10 - 2) - 3;");
    let left_assoc = single("10 - 2 - 3;");
    assert_eq!(node, left_assoc);

    let node = single("10 - (2 - 3);");
    let expected = Node::binary(
        BinaryOperator::Sub,
        Node::int(10, 1),
        Node::binary(BinaryOperator::Sub, Node::int(2, 1), Node::int(3, 1), 1),
        1,
    );
    assert_eq!(node, Node::expression_statement(expected, 1));
}

#[test]
fn test_parse_assignment_is_a_statement() {
    let node = single("x = x + 1;");
    assert_eq!(
        node,
        Node::assignment(
            "x",
            Node::binary(BinaryOperator::Add, Node::identifier("x", 1), Node::int(1, 1), 1),
            1
        )
    );
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let node = single("a = b = 1;");
    assert_eq!(
        node,
        Node::assignment("a", Node::assignment("b", Node::int(1, 1), 1), 1)
    );
}

#[test]
fn test_parse_if_without_else() {
    let node = single("if (x > 0) {\n  y = 1;\n}");
    assert_eq!(
        node,
        Node::if_expr(
            Node::binary(BinaryOperator::Greater, Node::identifier("x", 1), Node::int(0, 1), 1),
            Node::block(vec![Node::assignment("y", Node::int(1, 2), 2)], 1),
            Node::block(vec![], 1),
            1,
        )
    );
}

#[test]
fn test_parse_if_else() {
    let node = single("if (b) { skip; } else { skip; }");
    match node.kind {
        NodeKind::IfExpr { else_block, .. } => {
            assert_eq!(*else_block, Node::block(vec![Node::skip(1)], 1));
        }
        other => panic!("expected an if, got {:?}", other),
    }
}

#[test]
fn test_parse_while_and_nested_blocks() {
    let nodes = statements("int x = 0;\nwhile (x < 10) {\n  { x = x + 1; }\n}\nskip;");

    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[1].tag(), "WhileExpr");
    assert_eq!(nodes[1].line, 2);
    match &nodes[1].kind {
        NodeKind::WhileExpr { body, .. } => match &body.kind {
            NodeKind::Block(inner) => assert_eq!(inner[0].tag(), "Block"),
            other => panic!("expected a block, got {:?}", other),
        },
        other => panic!("expected a while, got {:?}", other),
    }
    assert_eq!(nodes[2], Node::skip(5));
}

#[test]
fn test_parse_comments_and_lines() {
    let nodes = statements("// header\nint a = 1;\n\nint b = a; // trailing");

    assert_eq!(nodes[0].line, 2);
    assert_eq!(nodes[1].line, 4);
}

#[test]
fn test_parse_empty_program() {
    assert!(statements("").is_empty());
}

#[test]
fn test_missing_semicolon() {
    let error = parse_source("int x = 1\nint y = 2;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
    assert_eq!(error.get_line(), 2);
}

#[test]
fn test_guard_requires_parentheses() {
    let error = parse_source("if x { skip; }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_branch_requires_block() {
    let error = parse_source("while (true) skip;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_unclosed_block() {
    let error = parse_source("{ int x = 1;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_assignment_to_non_variable() {
    let error = parse_source("1 = 2;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_number_out_of_range() {
    let error = parse_source("int x = 99999999999999999999;").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}

#[test]
fn test_security_label_without_type() {
    let error = parse_source("high = 1;").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}
