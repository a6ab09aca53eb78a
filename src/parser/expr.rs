use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::BinaryOperator,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Node, Error> {
    // First parse NUD
    let nud = parser
        .get_nud_handler(parser.current_token_kind())
        .ok_or_else(|| parser.unexpected())?;
    let mut left = nud(parser)?;

    // While the next token binds tighter than `bp`, keep extending the lhs
    while parser.get_binding_power(parser.current_token_kind()) > bp {
        let kind = parser.current_token_kind();
        let led = parser
            .get_led_handler(kind)
            .ok_or_else(|| parser.unexpected())?;
        let led_bp = parser.get_binding_power(kind);

        left = led(parser, left, led_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Node, Error> {
    let token = parser.advance();

    match token.kind {
        TokenKind::Number if token.value.contains('.') => match token.value.parse::<f64>() {
            Ok(value) => Ok(Node::double(value, token.line)),
            Err(_) => Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.line)),
        },
        TokenKind::Number => match token.value.parse::<i64>() {
            Ok(value) => Ok(Node::int(value, token.line)),
            Err(_) => Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.line)),
        },
        TokenKind::True => Ok(Node::boolean(true, token.line)),
        TokenKind::False => Ok(Node::boolean(false, token.line)),
        TokenKind::Identifier => Ok(Node::identifier(token.value, token.line)),
        _ => Err(Error::new(ErrorImpl::UnexpectedToken { token: token.value }, token.line)),
    }
}

pub fn parse_binary_expr(parser: &mut Parser, left: Node, bp: BindingPower) -> Result<Node, Error> {
    let operator_token = parser.advance();
    let op = BinaryOperator::from_symbol(&operator_token.value).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.line,
        )
    })?;

    let right = parse_expr(parser, bp)?;
    let line = left.line;

    Ok(Node::binary(op, left, right, line))
}

/// `target = value`. Binds to the right: the value is parsed below
/// assignment strength, so `a = b = c` is `a = (b = c)`.
pub fn parse_assignment_expr(parser: &mut Parser, left: Node, _bp: BindingPower) -> Result<Node, Error> {
    let target = match left.kind {
        NodeKind::Identifier(name) => name,
        _ => {
            return Err(parser.unexpected_detailed("expected a variable on the left of `=`"));
        }
    };

    parser.advance();
    let value = parse_expr(parser, BindingPower::Comma)?;

    Ok(Node::assignment(target, value, left.line))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Node, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}
