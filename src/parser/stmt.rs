use std::str::FromStr;

use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::SecurityLabel,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expr, lookups::BindingPower, parser::Parser};

pub fn parse_stmt(parser: &mut Parser) -> Result<Node, Error> {
    if let Some(handler) = parser.get_stmt_handler(parser.current_token_kind()) {
        return handler(parser);
    }

    // `int x ...`: an unlabelled declaration starts with two identifiers
    if parser.current_token_kind() == TokenKind::Identifier && parser.peek_kind() == TokenKind::Identifier {
        return parse_var_decl_stmt(parser);
    }

    let line = parser.line();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    match expr.kind {
        NodeKind::Assignment { .. } => Ok(expr),
        _ => Ok(Node::expression_statement(expr, line)),
    }
}

/// `[high|low] type name [= value];`
pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.line();

    let security = match parser.current_token_kind() {
        TokenKind::High | TokenKind::Low => {
            let token = parser.advance();
            let label = SecurityLabel::from_str(&token.value)
                .map_err(|_| parser.unexpected_detailed("expected a security label"))?;
            Some(label)
        }
        _ => None,
    };

    let error = parser.unexpected_detailed("expected a type name in variable declaration");
    let type_name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let error = parser.unexpected_detailed("expected identifier during variable declaration");
    let variable_name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let initializer = if parser.current_token_kind() == TokenKind::Assignment {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::variable_declaration(
        type_name,
        security,
        variable_name,
        initializer,
        line,
    ))
}

/// The guard of `if` and `while`, parenthesised.
fn parse_guard(parser: &mut Parser) -> Result<Node, Error> {
    let error = parser.unexpected_detailed("expected `(` before the guard");
    parser.expect_error(TokenKind::OpenParen, Some(error))?;
    let guard = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(guard)
}

/// A `{ ... }` block where the grammar requires one.
fn parse_required_block(parser: &mut Parser) -> Result<Node, Error> {
    if parser.current_token_kind() != TokenKind::OpenCurly {
        return Err(parser.unexpected_detailed("expected a block"));
    }
    parse_block_stmt(parser)
}

/// `if (guard) { ... } [else { ... }]`. A missing `else` is an empty block
/// on the line of the `if`.
pub fn parse_if_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line;

    let guard = parse_guard(parser)?;
    let then_block = parse_required_block(parser)?;

    let else_block = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        parse_required_block(parser)?
    } else {
        Node::block(vec![], line)
    };

    Ok(Node::if_expr(guard, then_block, else_block, line))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line;

    let guard = parse_guard(parser)?;
    let body = parse_required_block(parser)?;

    Ok(Node::while_expr(guard, body, line))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected_detailed("expected `}` before the end of the file"));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Node::block(statements, line))
}

pub fn parse_skip_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::skip(line))
}
