//! Handlers d'expressions (nud / led).

use kite_ast::{BinaryOp, Expr, FunctionBody, FunctionLiteral, Ident, Param, UnaryOp};
use kite_core::Spanned;
use kite_lexer::{Token, TokenKind};

use crate::{stmt, BindingPower, PResult, ParseError, Parser};

/* ────────── nud ────────── */

/// Littéraux et identifiants.
pub(crate) fn primary(p: &mut Parser) -> PResult<Expr> {
    let tok = p.bump();
    let invalid = |tok: &Token| ParseError::InvalidLiteral { spelling: tok.spelling.clone(), pos: tok.pos };
    match tok.kind {
        TokenKind::IntLit => tok.spelling.parse::<i64>().map(Expr::IntLiteral).map_err(|_| invalid(&tok)),
        TokenKind::DoubleLit => tok.spelling.parse::<f64>().map(Expr::DoubleLiteral).map_err(|_| invalid(&tok)),
        TokenKind::StringLit => Ok(Expr::StringLiteral(tok.spelling)),
        TokenKind::BooleanLit => Ok(Expr::BoolLiteral(tok.spelling == "true")),
        TokenKind::Identifier => Ok(Expr::Identifier(Ident::new(tok.spelling, tok.pos))),
        _ => Err(ParseError::Unexpected {
            expected: vec![
                TokenKind::IntLit,
                TokenKind::DoubleLit,
                TokenKind::StringLit,
                TokenKind::BooleanLit,
                TokenKind::Identifier,
            ],
            found: tok,
        }),
    }
}

/// `-x`, `+x`, `!x` ; l'opérande est lu au plus bas niveau.
pub(crate) fn unary(p: &mut Parser) -> PResult<Expr> {
    let tok = p.bump();
    let op = match tok.kind {
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        _ => return Err(ParseError::Unexpected { expected: vec![TokenKind::Minus, TokenKind::Plus, TokenKind::Bang], found: tok }),
    };
    let operand = p.parse_expr(BindingPower::Default)?;
    Ok(Expr::unary(Spanned::new(op, tok.pos), operand))
}

/// `( expr )`
pub(crate) fn grouping(p: &mut Parser) -> PResult<Expr> {
    p.expect(&[TokenKind::LParen])?;
    let inner = p.parse_expr(BindingPower::Default)?;
    p.expect(&[TokenKind::RParen])?;
    Ok(Expr::Grouping(Box::new(inner)))
}

/// `fun ( [name: Type {, name: Type}] ) [: Type] [= expr | { stmt* }]`
pub(crate) fn function_literal(p: &mut Parser) -> PResult<Expr> {
    let fun = p.expect(&[TokenKind::Fun])?;
    p.expect(&[TokenKind::LParen])?;
    let mut params = Vec::new();
    while !p.at(TokenKind::RParen) && !p.at(TokenKind::Eof) {
        let name = p.expect_ident()?;
        p.expect(&[TokenKind::Colon])?;
        let ty = p.parse_type(BindingPower::Default)?;
        params.push(Param { name, ty });
        if !p.at(TokenKind::RParen) {
            p.expect(&[TokenKind::Comma])?;
        }
    }
    p.expect(&[TokenKind::RParen])?;

    let return_type = if p.at(TokenKind::Colon) {
        p.bump();
        Some(p.parse_type(BindingPower::Default)?)
    } else {
        None
    };

    let body = match p.peek_kind() {
        TokenKind::Assign => {
            p.bump();
            FunctionBody::Expr(Box::new(p.parse_expr(BindingPower::Default)?))
        }
        TokenKind::LBrace => FunctionBody::Block(stmt::block_body(p)?),
        _ => FunctionBody::Absent,
    };

    Ok(Expr::FunctionLiteral(FunctionLiteral { params, return_type, body, pos: fun.pos }))
}

/* ────────── led ────────── */

/// Opérateurs binaires, associatifs à gauche.
pub(crate) fn binary(p: &mut Parser, left: Expr, bp: BindingPower) -> PResult<Expr> {
    let tok = p.bump();
    let op = binary_op(tok.kind).ok_or(ParseError::MissingInfix { kind: tok.kind, pos: tok.pos })?;
    let right = p.parse_expr(bp)?;
    Ok(Expr::binary(left, Spanned::new(op, tok.pos), right))
}

/// `callee(args…)` ; l'appelé est un identifiant ou un autre appel.
pub(crate) fn call(p: &mut Parser, left: Expr, _bp: BindingPower) -> PResult<Expr> {
    let open = p.expect(&[TokenKind::LParen])?;
    if !matches!(left, Expr::Identifier(_) | Expr::Call { .. }) {
        return Err(ParseError::NotCallable { callee: left.to_string(), pos: open.pos });
    }
    let mut args = Vec::new();
    while !p.at(TokenKind::RParen) && !p.at(TokenKind::Eof) {
        args.push(p.parse_expr(BindingPower::Default)?);
        if !p.at(TokenKind::RParen) {
            p.expect(&[TokenKind::Comma])?;
        }
    }
    p.expect(&[TokenKind::RParen])?;
    Ok(Expr::Call { callee: Box::new(left), args })
}

/// `x!!`
pub(crate) fn non_null(p: &mut Parser, left: Expr, _bp: BindingPower) -> PResult<Expr> {
    let tok = p.expect(&[TokenKind::BangBang])?;
    if !left.is_identifier() {
        return Err(ParseError::NonNullOperand { found: left.kind_name(), pos: tok.pos });
    }
    Ok(Expr::NonNullable(Box::new(left)))
}

const fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::Elvis => BinaryOp::Elvis,
        _ => return None,
    })
}
