//! Handlers d'instructions. Chacun consomme son terminateur.

use kite_ast::{
    AssignStmt, AssignValue, ClassDecl, ClassParam, ClassPrimaryConstructor, Expr, ExprStmt, Ident, Stmt,
    VariableDecl,
};
use kite_lexer::TokenKind;

use crate::{BindingPower, PResult, ParseError, Parser};

/// Repli du dispatcher : expression puis `;` / `NEWLINE`.
pub(crate) fn expression_statement(p: &mut Parser) -> PResult<Stmt> {
    let pos = p.peek().pos;
    let expr = p.parse_expr(BindingPower::Default)?;
    p.expect_terminator()?;
    Ok(Stmt::Expr(ExprStmt { expr, pos }))
}

/// `var|val name [: Type] [= expr]`
pub(crate) fn variable_decl(p: &mut Parser) -> PResult<Stmt> {
    let read_only = p.expect(&[TokenKind::Var, TokenKind::Val])?.kind == TokenKind::Val;
    let name = p.expect_ident()?;

    let ty = if p.at(TokenKind::Colon) {
        p.bump();
        Some(p.parse_type(BindingPower::Default)?)
    } else {
        None
    };

    let initializer = if p.at_terminator() {
        None
    } else {
        p.expect(&[TokenKind::Assign])?;
        Some(p.parse_expr(BindingPower::Assignment)?)
    };

    let missing = || ParseError::MissingTypeOrInitializer { name: name.name.clone(), pos: name.pos };
    let decl = VariableDecl::new(name.clone(), ty, initializer, read_only).ok_or_else(missing)?;
    p.expect_terminator()?;
    Ok(Stmt::VariableDecl(decl))
}

/// Instruction commençant par un identifiant : affectation ou expression.
pub(crate) fn assignment(p: &mut Parser) -> PResult<Stmt> {
    let pos = p.peek().pos;
    let expr = p.parse_expr(BindingPower::Default)?;
    if !p.at(TokenKind::Assign) {
        p.expect_terminator()?;
        return Ok(Stmt::Expr(ExprStmt { expr, pos }));
    }
    let target = assign_target(p, expr)?;
    let stmt = assignment_tail(p, target)?;
    p.expect_terminator()?;
    Ok(Stmt::Assign(stmt))
}

/// Après `target =` : la valeur, ou une nouvelle affectation imbriquée.
fn assignment_tail(p: &mut Parser, target: Ident) -> PResult<AssignStmt> {
    let value = p.parse_expr(BindingPower::Default)?;
    if !p.at(TokenKind::Assign) {
        return Ok(AssignStmt { target, value: AssignValue::Expr(value) });
    }
    let next = assign_target(p, value)?;
    let inner = assignment_tail(p, next)?;
    Ok(AssignStmt { target, value: AssignValue::Chain(Box::new(inner)) })
}

/// Vérifie le membre gauche et consomme le `=`.
fn assign_target(p: &mut Parser, expr: Expr) -> PResult<Ident> {
    let eq = p.expect(&[TokenKind::Assign])?;
    match expr {
        Expr::Identifier(id) => Ok(id),
        other => Err(ParseError::InvalidAssignTarget { found: other.kind_name(), pos: eq.pos }),
    }
}

/// `class Name [ ( name: Type [= expr] {, …} ) ]`
pub(crate) fn class_decl(p: &mut Parser) -> PResult<Stmt> {
    p.expect(&[TokenKind::Class])?;
    let name = p.expect_ident()?;

    let mut params = Vec::new();
    if p.at(TokenKind::LParen) {
        p.bump();
        while !p.at(TokenKind::RParen) && !p.at(TokenKind::Eof) {
            let pname = p.expect_ident()?;
            p.expect(&[TokenKind::Colon])?;
            let ty = p.parse_type(BindingPower::Default)?;
            let default = if p.at(TokenKind::Assign) {
                p.bump();
                Some(p.parse_expr(BindingPower::Default)?)
            } else {
                None
            };
            params.push(ClassParam { name: pname, ty, default, read_only: true });
            if !p.at(TokenKind::RParen) {
                p.expect(&[TokenKind::Comma])?;
            }
        }
        p.expect(&[TokenKind::RParen])?;
    }

    p.expect_terminator()?;
    Ok(Stmt::ClassDecl(ClassDecl { name, primary_constructor: ClassPrimaryConstructor::new(params) }))
}

/// `{ stmt* }` en position d'instruction.
pub(crate) fn block(p: &mut Parser) -> PResult<Stmt> {
    let body = block_body(p)?;
    p.expect_terminator()?;
    Ok(Stmt::Block(body))
}

/// `{ stmt* }` sans terminateur (aussi corps de fonction).
pub(crate) fn block_body(p: &mut Parser) -> PResult<Vec<Stmt>> {
    p.expect(&[TokenKind::LBrace])?;
    p.enter_block()?;
    let body = block_statements(p);
    p.leave_block();
    let body = body?;
    p.expect(&[TokenKind::RBrace])?;
    Ok(body)
}

fn block_statements(p: &mut Parser) -> PResult<Vec<Stmt>> {
    let mut out = Vec::new();
    p.skip_newlines();
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        out.push(p.parse_stmt()?);
        p.skip_newlines();
    }
    Ok(out)
}
