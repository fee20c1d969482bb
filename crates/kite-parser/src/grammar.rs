//! Registre de grammaire : tables `genre de jeton → handler`, figées après construction.
//!
//! Trois familles : instructions, expressions, types. Les tables d'expressions et
//! de types partagent la même forme ([`Table`]) et sont parcourues par le même
//! moteur d'ascension ([`crate::Parser::climb`]).

use indexmap::IndexMap;
use kite_ast::{Expr, Stmt, Type};
use kite_lexer::TokenKind;

use crate::{expr, stmt, ty, PResult, Parser};

/* ─────────────────────────── Puissances de liaison ─────────────────────────── */

/// Puissance de liaison (ordre total, du plus faible au plus fort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BindingPower {
    /// Aucune liaison (genres non enregistrés).
    #[default]
    Default,
    /// `,`
    Comma,
    /// `=`
    Assignment,
    /// `&&`, `||`, `?:`
    Logical,
    /// Comparaisons.
    Relational,
    /// `+`, `-`
    Additive,
    /// `*`, `/`
    Multiplicative,
    /// Préfixes.
    Unary,
    /// Appel, `!!`, `?` de type.
    Call,
    /// Accès membre.
    Member,
    /// Primaires.
    Primary,
}

/* ─────────────────────────── Handlers ─────────────────────────── */

/// Handler préfixe (nud).
pub type NudFn<T> = fn(&mut Parser) -> PResult<T>;
/// Handler infixe/postfixe (led) : reçoit la valeur gauche et la puissance du jeton.
pub type LedFn<T> = fn(&mut Parser, T, BindingPower) -> PResult<T>;
/// Handler d'instruction (consomme son propre terminateur).
pub type StmtFn = fn(&mut Parser) -> PResult<Stmt>;

/// Table nud/led pour une famille de constructions.
pub struct Table<T> {
    what: &'static str,
    nud: IndexMap<TokenKind, NudFn<T>>,
    led: IndexMap<TokenKind, LedFn<T>>,
    bp: IndexMap<TokenKind, BindingPower>,
}

impl<T> Table<T> {
    fn new(what: &'static str) -> Self {
        Self { what, nud: IndexMap::new(), led: IndexMap::new(), bp: IndexMap::new() }
    }

    fn nud(mut self, kind: TokenKind, handler: NudFn<T>) -> Self {
        self.nud.insert(kind, handler);
        self
    }

    fn led(mut self, kind: TokenKind, bp: BindingPower, handler: LedFn<T>) -> Self {
        self.led.insert(kind, handler);
        self.bp.insert(kind, bp);
        self
    }

    /// Handler préfixe pour `kind`.
    pub fn nud_for(&self, kind: TokenKind) -> Option<NudFn<T>> { self.nud.get(&kind).copied() }

    /// Handler infixe pour `kind`.
    pub fn led_for(&self, kind: TokenKind) -> Option<LedFn<T>> { self.led.get(&kind).copied() }

    /// Puissance de `kind` (`Default` si non enregistré).
    pub fn bp_of(&self, kind: TokenKind) -> BindingPower { self.bp.get(&kind).copied().unwrap_or_default() }

    /// Genres pouvant commencer la construction, dans l'ordre d'enregistrement.
    pub fn prefixes(&self) -> Vec<TokenKind> { self.nud.keys().copied().collect() }

    /// `an expression` / `a type` (diagnostics).
    pub const fn what(&self) -> &'static str { self.what }
}

/* ─────────────────────────── Registre ─────────────────────────── */

/// Registre complet, construit une fois par parser.
pub struct Grammar {
    stmt: IndexMap<TokenKind, StmtFn>,
    expr: Table<Expr>,
    ty: Table<Type>,
}

impl Grammar {
    /// Table de référence du langage.
    pub fn new() -> Self {
        use BindingPower as Bp;
        use TokenKind as K;

        let exprs = Table::<Expr>::new("an expression")
            // Littéraux
            .nud(K::IntLit, expr::primary)
            .nud(K::DoubleLit, expr::primary)
            .nud(K::StringLit, expr::primary)
            .nud(K::BooleanLit, expr::primary)
            .nud(K::Identifier, expr::primary)
            .nud(K::Fun, expr::function_literal)
            // Logique
            .led(K::AndAnd, Bp::Logical, expr::binary)
            .led(K::OrOr, Bp::Logical, expr::binary)
            .led(K::Elvis, Bp::Logical, expr::binary)
            .led(K::BangBang, Bp::Call, expr::non_null)
            // Comparaisons
            .led(K::Lt, Bp::Relational, expr::binary)
            .led(K::Le, Bp::Relational, expr::binary)
            .led(K::Gt, Bp::Relational, expr::binary)
            .led(K::Ge, Bp::Relational, expr::binary)
            .led(K::EqEq, Bp::Relational, expr::binary)
            .led(K::NotEq, Bp::Relational, expr::binary)
            // Arithmétique
            .led(K::Plus, Bp::Additive, expr::binary)
            .led(K::Minus, Bp::Additive, expr::binary)
            .led(K::Slash, Bp::Multiplicative, expr::binary)
            .led(K::Star, Bp::Multiplicative, expr::binary)
            // Appel
            .led(K::LParen, Bp::Call, expr::call)
            // Préfixes
            .nud(K::Minus, expr::unary)
            .nud(K::Plus, expr::unary)
            .nud(K::Bang, expr::unary)
            .nud(K::LParen, expr::grouping);

        let types = Table::<Type>::new("a type")
            .nud(K::Identifier, ty::name)
            .nud(K::LBracket, ty::array)
            .led(K::Question, Bp::Call, ty::nullable);

        let mut stmts: IndexMap<TokenKind, StmtFn> = IndexMap::new();
        stmts.insert(K::Var, stmt::variable_decl);
        stmts.insert(K::Val, stmt::variable_decl);
        stmts.insert(K::Identifier, stmt::assignment);
        stmts.insert(K::Class, stmt::class_decl);
        stmts.insert(K::LBrace, stmt::block);

        Self { stmt: stmts, expr: exprs, ty: types }
    }

    /// Handler d'instruction pour `kind`.
    pub fn stmt_for(&self, kind: TokenKind) -> Option<StmtFn> { self.stmt.get(&kind).copied() }

    /// Table des expressions.
    pub const fn expr_table(&self) -> &Table<Expr> { &self.expr }

    /// Table des types.
    pub const fn type_table(&self) -> &Table<Type> { &self.ty }
}

impl Default for Grammar {
    fn default() -> Self { Self::new() }
}
