//! kite-parser: parser Pratt piloté par tables pour Kite
//!
//! - un registre ([`Grammar`]) associe chaque genre de jeton à ses handlers
//!   (nud préfixe, led infixe/postfixe + puissance de liaison, instruction) ;
//! - un seul moteur d'ascension ([`Parser::climb`]) sert aux expressions et aux types ;
//! - les instructions passent par un dispatcher qui retombe sur l'instruction-expression.
//!
//! Exemple :
//! ```
//! let program = kite_parser::parse("val x: Int = 1 + 2 * 3").unwrap();
//! assert_eq!(program.to_string(), "(val x: Int = (+ 1 (* 2 3)))\n");
//! ```

#![warn(missing_docs)]

mod error;
mod expr;
pub mod grammar;
mod stmt;
mod ty;

pub use error::{PResult, ParseError};
pub use grammar::{BindingPower, Grammar, Table};

use kite_ast::{Expr, Ident, Program, Stmt, Type};
use kite_core::Pos;
use kite_lexer::{Token, TokenKind};

/* ─────────────────────────── Parser ─────────────────────────── */

/// Parser sur un flux de jetons terminé par `EOF`.
pub struct Parser {
    tokens: Vec<Token>,
    /// Toujours `< tokens.len()` : on ne dépasse jamais `EOF`.
    cursor: usize,
    grammar: Grammar,
    /// Profondeur de `{ … }` : un `}` y vaut terminateur.
    block_depth: usize,
    /// Imbrication courante (ascensions + blocs), bornée par [`MAX_DEPTH`].
    depth: usize,
}

/// Imbrication maximale avant `ParseError::TooDeep`.
pub const MAX_DEPTH: usize = 256;

impl Parser {
    /// Parser sur des jetons déjà produits ; un `EOF` est ajouté s'il manque.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let pos = tokens.last().map_or(Pos::START, |t| t.pos);
            tokens.push(Token::fixed(TokenKind::Eof, pos));
        }
        Self { tokens, cursor: 0, grammar: Grammar::new(), block_depth: 0, depth: 0 }
    }

    /// Lexe `src` puis construit le parser.
    pub fn from_source(src: &str) -> PResult<Self> {
        Ok(Self::new(kite_lexer::tokenize(src)?))
    }

    /// Registre utilisé par ce parser.
    pub const fn grammar(&self) -> &Grammar { &self.grammar }

    /* ────────── Programme ────────── */

    /// Programme complet ; s'arrête à la première erreur.
    pub fn parse_program(&mut self) -> PResult<Program> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::Eof) {
            statements.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(statements = statements.len(), "program parsed");
        Ok(Program { statements })
    }

    /// Programme complet en collectant toutes les erreurs.
    ///
    /// Après une erreur on reprend derrière le prochain `;` ou `NEWLINE`.
    pub fn parse_program_recovering(&mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::Eof) {
            match self.parse_stmt() {
                Ok(s) => statements.push(s),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %e, "recovering");
                    errors.push(e);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }
        (Program { statements }, errors)
    }

    fn synchronize(&mut self) {
        self.block_depth = 0;
        self.depth = 0;
        while !self.at(TokenKind::Eof) {
            if self.bump().kind.is_terminator() {
                break;
            }
        }
    }

    /* ────────── Dispatch & ascension ────────── */

    /// Une instruction : handler enregistré, sinon instruction-expression.
    pub fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.grammar.stmt_for(self.peek_kind()) {
            Some(handler) => handler(self),
            None => stmt::expression_statement(self),
        }
    }

    /// Expression liée plus fort que `min`.
    pub fn parse_expr(&mut self, min: BindingPower) -> PResult<Expr> {
        self.climb(min, Grammar::expr_table)
    }

    /// Type lié plus fort que `min`.
    pub fn parse_type(&mut self, min: BindingPower) -> PResult<Type> {
        self.climb(min, Grammar::type_table)
    }

    /// Ascension de précédence générique, paramétrée par la table.
    ///
    /// nud du jeton courant, puis tant que `bp(courant) > min`, led avec la
    /// valeur gauche et la puissance du jeton.
    pub fn climb<T>(&mut self, min: BindingPower, table: fn(&Grammar) -> &Table<T>) -> PResult<T> {
        self.descend()?;
        let result = self.climb_at(min, table);
        self.ascend();
        result
    }

    fn climb_at<T>(&mut self, min: BindingPower, table: fn(&Grammar) -> &Table<T>) -> PResult<T> {
        let tok = self.peek();
        let (kind, pos) = (tok.kind, tok.pos);
        let nud = table(&self.grammar).nud_for(kind).ok_or_else(|| {
            let t = table(&self.grammar);
            ParseError::NoPrefix { kind, pos, what: t.what(), accepted: t.prefixes() }
        })?;
        #[cfg(feature = "tracing")]
        tracing::trace!(%kind, ?min, what = table(&self.grammar).what(), "nud");

        let mut left = nud(self)?;
        loop {
            let tok = self.peek();
            let (kind, pos) = (tok.kind, tok.pos);
            let bp = table(&self.grammar).bp_of(kind);
            if bp <= min {
                break;
            }
            let led = table(&self.grammar).led_for(kind).ok_or(ParseError::MissingInfix { kind, pos })?;
            left = led(self, left, bp)?;
        }
        Ok(left)
    }

    /* ────────── Primitives ────────── */

    /// Jeton courant.
    pub fn peek(&self) -> &Token { &self.tokens[self.cursor] }

    /// Genre du jeton courant.
    pub fn peek_kind(&self) -> TokenKind { self.peek().kind }

    /// Le jeton courant est-il de ce genre ?
    pub fn at(&self, kind: TokenKind) -> bool { self.peek_kind() == kind }

    /// Consomme le jeton courant (reste sur `EOF`).
    pub fn bump(&mut self) -> Token {
        let tok = self.tokens[self.cursor].clone();
        if tok.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        tok
    }

    /// Consomme un jeton de l'un des genres donnés.
    pub fn expect(&mut self, kinds: &[TokenKind]) -> PResult<Token> {
        if kinds.contains(&self.peek_kind()) {
            Ok(self.bump())
        } else {
            Err(ParseError::Unexpected { expected: kinds.to_vec(), found: self.peek().clone() })
        }
    }

    /// Consomme un identifiant.
    pub fn expect_ident(&mut self) -> PResult<Ident> {
        let tok = self.expect(&[TokenKind::Identifier])?;
        Ok(Ident::new(tok.spelling, tok.pos))
    }

    /// Fin d'instruction : `;` ou `NEWLINE`, ou `}` laissé en place dans un bloc.
    pub fn expect_terminator(&mut self) -> PResult<()> {
        if self.at_terminator() && self.at(TokenKind::RBrace) {
            return Ok(());
        }
        self.expect(&[TokenKind::Semicolon, TokenKind::Newline]).map(drop)
    }

    /// Vrai si une instruction peut s'arrêter ici.
    pub fn at_terminator(&self) -> bool {
        self.peek_kind().is_terminator() || (self.block_depth > 0 && self.at(TokenKind::RBrace))
    }

    /// Saute les `NEWLINE`.
    pub fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    pub(crate) fn enter_block(&mut self) -> PResult<()> {
        self.descend()?;
        self.block_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_block(&mut self) {
        self.block_depth = self.block_depth.saturating_sub(1);
        self.ascend();
    }

    fn descend(&mut self) -> PResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep { pos: self.peek().pos, max: MAX_DEPTH });
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) { self.depth = self.depth.saturating_sub(1); }
}

/* ─────────────────────────── Points d'entrée ─────────────────────────── */

/// Lexe et parse `src`.
pub fn parse(src: &str) -> PResult<Program> { Parser::from_source(src)?.parse_program() }

/// Lexe et parse `src` en collectant les erreurs syntaxiques.
pub fn parse_recovering(src: &str) -> PResult<(Program, Vec<ParseError>)> {
    Ok(Parser::from_source(src)?.parse_program_recovering())
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use kite_ast::{AssignValue, FunctionBody};
    use pretty_assertions::assert_eq;

    fn sexpr(src: &str) -> String {
        parse(src).unwrap().statements.iter().map(ToString::to_string).collect::<Vec<_>>().join(" | ")
    }

    #[test]
    fn single_expression_statement() {
        let p = parse("4 + 4").unwrap();
        assert_eq!(p.statements.len(), 1);
        match &p.statements[0] {
            Stmt::Expr(s) => {
                assert_eq!(s.expr.to_string(), "(+ 4 4)");
                assert_eq!(s.pos, Pos::new(1, 1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn semicolon_separates_statements() {
        assert_eq!(parse("4 + 4; 2 + 1").unwrap().statements.len(), 2);
    }

    #[test]
    fn declarations_typed_and_uninitialised() {
        let p = parse("val v1: Int = 1; var v2: String").unwrap();
        assert_eq!(p.statements.len(), 2);
        let Stmt::VariableDecl(d) = &p.statements[1] else { panic!("not a declaration") };
        assert_eq!(d.name().name, "v2");
        assert_eq!(d.ty(), Some(&Type::Name("String".into())));
        assert!(d.initializer().is_none());
        assert!(!d.is_read_only());
        assert_eq!(p.statements[0].to_string(), "(val v1: Int = 1)");
    }

    #[test]
    fn chained_assignment_nests() {
        let p = parse("var v1: Int = 1; var v2: Int = 1; v1 = v2 = 2").unwrap();
        assert_eq!(p.statements.len(), 3);
        let Stmt::Assign(a) = &p.statements[2] else { panic!("not an assignment") };
        assert_eq!(a.target.name, "v1");
        assert!(matches!(&a.value, AssignValue::Chain(inner) if inner.target.name == "v2"));
        assert_eq!(a.to_string(), "(= v1 (= v2 2))");
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(sexpr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(sexpr("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(sexpr("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
        assert_eq!(sexpr("a < b && c"), "(&& (< a b) c)");
        assert_eq!(sexpr("a ?: 1.5"), "(?: a 1.5)");
        assert_eq!(sexpr("a == b != c"), "(!= (== a b) c)");
    }

    #[test]
    fn unary_recurses_at_lowest_power() {
        assert_eq!(sexpr("-1 + 2"), "(- (+ 1 2))");
        assert_eq!(sexpr("!true"), "(! true)");
    }

    #[test]
    fn literals() {
        assert_eq!(sexpr("\"hi\"; false; 2.5; 7."), "\"hi\" | false | 2.5 | 7.0");
        assert!(matches!(
            parse("99999999999999999999"),
            Err(ParseError::InvalidLiteral { ref spelling, .. }) if spelling == "99999999999999999999"
        ));
    }

    #[test]
    fn calls() {
        assert_eq!(sexpr("f(1, g(2))(3)"), "(call (call f 1 (call g 2)) 3)");
        assert_eq!(sexpr("f()"), "(call f)");
        assert!(matches!(parse("(f)(1)"), Err(ParseError::NotCallable { .. })));
        assert!(matches!(parse("f(1 2)"), Err(ParseError::Unexpected { .. })));
    }

    #[test]
    fn non_null_assertion() {
        assert_eq!(sexpr("x!!"), "(!! x)");
        assert!(matches!(parse("1!!"), Err(ParseError::NonNullOperand { found: "integer literal", .. })));
    }

    #[test]
    fn type_grammar() {
        assert_eq!(sexpr("var b: Int?"), "(var b: Int?)");
        let p = parse("val a: []Int? = x").unwrap();
        let Stmt::VariableDecl(d) = &p.statements[0] else { panic!() };
        assert_eq!(d.ty(), Some(&Type::Array(Box::new(Type::Nullable(Box::new(Type::Name("Int".into())))))));
        let err = parse("var x: 3").unwrap_err();
        assert!(matches!(err, ParseError::NoPrefix { kind: TokenKind::IntLit, what: "a type", .. }));
    }

    #[test]
    fn declaration_needs_type_or_initializer() {
        let err = parse("var x").unwrap_err();
        assert!(matches!(err, ParseError::MissingTypeOrInitializer { ref name, .. } if name == "x"));
        assert!(err.to_string().contains("must either have a type annotation or be initialized"));
    }

    #[test]
    fn missing_prefix_lists_alternatives() {
        match parse("val x = ;").unwrap_err() {
            ParseError::NoPrefix { kind, accepted, what, pos } => {
                assert_eq!(kind, TokenKind::Semicolon);
                assert_eq!(what, "an expression");
                assert_eq!(pos, Pos::new(1, 9));
                assert!(accepted.contains(&TokenKind::IntLit));
                assert!(accepted.contains(&TokenKind::Fun));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_terminator() {
        match parse("4 4").unwrap_err() {
            ParseError::Unexpected { expected, found } => {
                assert_eq!(expected, vec![TokenKind::Semicolon, TokenKind::Newline]);
                assert_eq!(found.kind, TokenKind::IntLit);
                assert_eq!(found.pos, Pos::new(1, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn assignment_target_must_be_identifier() {
        assert!(matches!(parse("f(1) = 2"), Err(ParseError::InvalidAssignTarget { found: "call", .. })));
        assert!(matches!(parse("a = f(1) = 2"), Err(ParseError::InvalidAssignTarget { .. })));
    }

    #[test]
    fn class_declarations() {
        assert_eq!(
            sexpr("class Point(x: Int, y: Int = 0)"),
            "(class Point (val x: Int) (val y: Int = 0))"
        );
        let p = parse("class Empty()\nclass Bare").unwrap();
        assert_eq!(p.statements.len(), 2);
        for s in &p.statements {
            let Stmt::ClassDecl(c) = s else { panic!() };
            assert!(c.primary_constructor.is_none());
        }
        let Stmt::ClassDecl(c) = &parse("class P(a: Int)").unwrap().statements[0] else { panic!() };
        assert!(c.primary_constructor.as_ref().is_some_and(|k| k.params()[0].read_only));
    }

    #[test]
    fn blocks() {
        assert_eq!(sexpr("{ 1\n 2 }"), "(block 1 2)");
        assert_eq!(sexpr("{\n val x = 1; x\n}\n3"), "(block (val x = 1) x) | 3");
        assert_eq!(sexpr("{ { 1 } }"), "(block (block 1))");
        assert!(matches!(parse("{ 1"), Err(ParseError::Unexpected { .. })));
    }

    #[test]
    fn function_literals() {
        assert_eq!(
            sexpr("val f = fun (a: Int, b: Int): Int = a + b"),
            "(val f = (fun (a: Int b: Int) : Int = (+ a b)))"
        );
        let p = parse("fun () { 1 }").unwrap();
        let Stmt::Expr(s) = &p.statements[0] else { panic!() };
        let Expr::FunctionLiteral(f) = &s.expr else { panic!() };
        assert!(f.params.is_empty());
        assert!(matches!(&f.body, FunctionBody::Block(b) if b.len() == 1));
        assert_eq!(sexpr("fun (s: String?)"), "(fun (s: String?))");
    }

    #[test]
    fn empty_and_blank_programs() {
        assert!(parse("").unwrap().statements.is_empty());
        assert!(parse("\n\n// nothing\n").unwrap().statements.is_empty());
    }

    #[test]
    fn lex_errors_surface() {
        assert!(matches!(parse("val s = \"open"), Err(ParseError::Lex(_))));
    }

    #[test]
    fn recovery_collects_every_error() {
        let (program, errors) = parse_recovering("var x\n1 + 2\nval = 3\n4").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ParseError::MissingTypeOrInitializer { .. }));
        assert!(matches!(errors[1], ParseError::Unexpected { .. }));
    }

    #[test]
    fn nesting_is_bounded() {
        let prefixes = "-".repeat(100_000) + "1";
        assert!(matches!(parse(&prefixes), Err(ParseError::TooDeep { max: MAX_DEPTH, .. })));
        let parens = "(".repeat(100_000);
        assert!(matches!(parse(&parens), Err(ParseError::TooDeep { .. })));
        let blocks = "{".repeat(100_000);
        assert!(matches!(parse(&blocks), Err(ParseError::TooDeep { .. })));
        let types = format!("var x: {}Int", "[]".repeat(100_000));
        assert!(matches!(parse(&types), Err(ParseError::TooDeep { .. })));

        let shallow = "-".repeat(100) + "1";
        assert_eq!(parse(&shallow).unwrap().statements.len(), 1);
        let (_, errors) = parse_recovering(&format!("{prefixes}\n2")).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn eof_is_appended_when_missing() {
        let toks = vec![Token::literal(TokenKind::IntLit, "1", Pos::START), Token::fixed(TokenKind::Newline, Pos::new(1, 2))];
        let program = Parser::new(toks).parse_program().unwrap();
        assert_eq!(program.statements.len(), 1);
    }
}
