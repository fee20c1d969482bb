//! Handlers de types : `Name`, `[]T`, `T?`.

use kite_ast::Type;
use kite_lexer::TokenKind;

use crate::{BindingPower, PResult, Parser};

pub(crate) fn name(p: &mut Parser) -> PResult<Type> {
    let tok = p.expect(&[TokenKind::Identifier])?;
    Ok(Type::Name(tok.spelling))
}

/// `[ ]` puis le type des éléments.
pub(crate) fn array(p: &mut Parser) -> PResult<Type> {
    p.expect(&[TokenKind::LBracket])?;
    p.expect(&[TokenKind::RBracket])?;
    let element = p.parse_type(BindingPower::Default)?;
    Ok(Type::Array(Box::new(element)))
}

pub(crate) fn nullable(p: &mut Parser, left: Type, _bp: BindingPower) -> PResult<Type> {
    p.expect(&[TokenKind::Question])?;
    Ok(Type::Nullable(Box::new(left)))
}
