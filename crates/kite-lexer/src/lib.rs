//! kite-lexer: analyse lexicale pour Kite
//!
//! Faits saillants :
//! - lecture octet par octet avec deux octets d'avance (`current`, `peek`) ;
//! - positions 1-based (ligne, colonne) du premier octet de chaque jeton ;
//! - `NEWLINE` significatif (les sauts consécutifs fusionnent), un `NEWLINE`
//!   puis un `EOF` synthétisés en fin de flux ;
//! - octet inconnu → jeton `ERROR`, l'analyse continue ; seule une chaîne non
//!   terminée interrompt l'analyse. L'orthographe est l'octet lu comme Latin-1
//!   (`char::from(b)`), donc `spelling.chars().next() as u32` rend l'octet.
//!
//! Exemple éclair :
//! ```
//! use kite_lexer::{tokenize, TokenKind};
//!
//! let toks = tokenize("val x: Int = 4 + 2").unwrap();
//! assert_eq!(toks[0].kind, TokenKind::Val);
//! assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Eof));
//! ```

#![warn(missing_docs)]

use core::fmt;
use std::io::Read;

use kite_core::Pos;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical (énumération fermée).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// Identifiant.
    Identifier,
    /// Fin de ligne significative.
    Newline,
    /// Littéral entier.
    IntLit,
    /// Littéral flottant.
    DoubleLit,
    /// Littéral chaîne (contenu brut, sans guillemets).
    StringLit,
    /// `true` / `false`.
    BooleanLit,

    /// `if`
    If,
    /// `else`
    Else,
    /// `fun`
    Fun,
    /// `class`
    Class,
    /// `while`
    While,
    /// `var`
    Var,
    /// `val`
    Val,
    /// `print`
    Print,
    /// `return`
    Return,

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `?.`
    SafeCall,
    /// `!!`
    BangBang,
    /// `!`
    Bang,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `?`
    Question,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `?:`
    Elvis,

    /// Fin de flux.
    Eof,
    /// Octet non reconnu ; orthographe `char::from(octet)`.
    Error,
}

impl TokenKind {
    /// Orthographe canonique du genre (symbole, mot-clé, ou marqueur `<…>`).
    pub const fn spelling(self) -> &'static str {
        use TokenKind::*;
        match self {
            Identifier => "<identifier>",
            Newline => "<NL>",
            IntLit => "<integer>",
            DoubleLit => "<double>",
            StringLit => "<string>",
            BooleanLit => "<boolean>",
            If => "if",
            Else => "else",
            Fun => "fun",
            Class => "class",
            While => "while",
            Var => "var",
            Val => "val",
            Print => "print",
            Return => "return",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            EqEq => "==",
            NotEq => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            SafeCall => "?.",
            BangBang => "!!",
            Bang => "!",
            AndAnd => "&&",
            OrOr => "||",
            Assign => "=",
            PlusAssign => "+=",
            MinusAssign => "-=",
            Semicolon => ";",
            Colon => ":",
            Dot => ".",
            Comma => ",",
            Question => "?",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Elvis => "?:",
            Eof => "EOF",
            Error => "ERROR",
        }
    }

    /// Genres dont l'orthographe est le texte source (littéraux, identifiants, erreurs).
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::IntLit
                | TokenKind::DoubleLit
                | TokenKind::StringLit
                | TokenKind::BooleanLit
                | TokenKind::Error
        )
    }

    /// Termine une instruction (`;` ou `NEWLINE`).
    pub const fn is_terminator(self) -> bool {
        matches!(self, TokenKind::Semicolon | TokenKind::Newline)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.spelling()) }
}

/// Jeton : genre, orthographe et position du premier octet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    /// Genre.
    pub kind: TokenKind,
    /// Texte source pour les genres textuels, orthographe canonique sinon.
    pub spelling: String,
    /// Position (1-based).
    pub pos: Pos,
}

impl Token {
    /// Jeton à orthographe fixe.
    pub fn fixed(kind: TokenKind, pos: Pos) -> Self {
        Self { kind, spelling: kind.spelling().to_owned(), pos }
    }

    /// Jeton dont l'orthographe vient de la source.
    pub fn literal(kind: TokenKind, spelling: impl Into<String>, pos: Pos) -> Self {
        Self { kind, spelling: spelling.into(), pos }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.spelling) }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreur lexicale. L'analyse s'interrompt et aucun flux n'est produit.
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    /// Fin d'entrée avant le guillemet fermant.
    #[error("unterminated string starting at {pos}")]
    UnterminatedString {
        /// Position du guillemet ouvrant.
        pos: Pos,
    },
    /// Échec de lecture de l'entrée.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/* ─────────────────────────── Lexer ─────────────────────────── */

/// Analyseur lexical (itératif).
pub struct Lexer<'a> {
    bytes: &'a [u8],
    /// Offset de `current`.
    off: usize,
    line: u32,
    col: u32,
    /// Genre du dernier jeton émis (fusion des NEWLINE).
    last: Option<TokenKind>,
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Lexer sur une source texte.
    pub fn new(src: &'a str) -> Self { Self::from_bytes(src.as_bytes()) }

    /// Lexer sur des octets bruts.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes, off: 0, line: 1, col: 1, last: None, done: false }
    }

    /// Prochain jeton ; `Ok(None)` une fois `EOF` émis.
    pub fn next(&mut self) -> Result<Option<Token>, LexError> {
        if self.done {
            return Ok(None);
        }
        loop {
            self.skip_blanks();
            let pos = self.pos();
            let Some(c) = self.current() else {
                if self.last != Some(TokenKind::Newline) {
                    return Ok(Some(self.emit(Token::fixed(TokenKind::Newline, pos))));
                }
                self.done = true;
                return Ok(Some(self.emit(Token::fixed(TokenKind::Eof, pos))));
            };
            if c == b'\n' {
                self.advance();
                if self.last == Some(TokenKind::Newline) {
                    continue;
                }
                return Ok(Some(self.emit(Token::fixed(TokenKind::Newline, pos))));
            }
            let tok = self.scan(c, pos)?;
            return Ok(Some(self.emit(tok)));
        }
    }

    /// Tokenise toute la source (termine par `NEWLINE`, `EOF`).
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        while let Some(t) = self.next()? {
            out.push(t);
        }
        Ok(out)
    }

    /* ────────── Scan d'un jeton ────────── */

    fn scan(&mut self, c: u8, pos: Pos) -> Result<Token, LexError> {
        use TokenKind::*;
        if is_ident_start(c) {
            return Ok(self.lex_identifier(pos));
        }
        if c.is_ascii_digit() {
            return Ok(self.lex_number(pos));
        }
        if c == b'"' {
            return self.lex_string(pos);
        }

        self.advance();
        let kind = match c {
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            b';' => Semicolon,
            b':' => Colon,
            b',' => Comma,
            b'.' => Dot,
            b'*' => Star,
            b'/' => Slash,
            b'+' => if self.eat(b'=') { PlusAssign } else { Plus },
            b'-' => if self.eat(b'=') { MinusAssign } else { Minus },
            b'=' => if self.eat(b'=') { EqEq } else { Assign },
            b'!' => if self.eat(b'=') { NotEq } else if self.eat(b'!') { BangBang } else { Bang },
            b'<' => if self.eat(b'=') { Le } else { Lt },
            b'>' => if self.eat(b'=') { Ge } else { Gt },
            b'?' => if self.eat(b':') { Elvis } else if self.eat(b'.') { SafeCall } else { Question },
            b'&' if self.eat(b'&') => AndAnd,
            b'|' if self.eat(b'|') => OrOr,
            other => return Ok(Token::literal(Error, char::from(other).to_string(), pos)),
        };
        Ok(Token::fixed(kind, pos))
    }

    fn lex_identifier(&mut self, pos: Pos) -> Token {
        let start = self.off;
        while self.current().is_some_and(is_ident_continue) {
            self.advance();
        }
        let text = self.text(start);
        Token::literal(keyword_of(&text).unwrap_or(TokenKind::Identifier), text, pos)
    }

    fn lex_number(&mut self, pos: Pos) -> Token {
        let start = self.off;
        let mut saw_dot = false;
        while let Some(c) = self.current() {
            match c {
                b'0'..=b'9' => {}
                b'.' if !saw_dot => saw_dot = true,
                _ => break,
            }
            self.advance();
        }
        let kind = if saw_dot { TokenKind::DoubleLit } else { TokenKind::IntLit };
        Token::literal(kind, self.text(start), pos)
    }

    fn lex_string(&mut self, pos: Pos) -> Result<Token, LexError> {
        self.advance(); // '"'
        let start = self.off;
        loop {
            match self.current() {
                None => return Err(LexError::UnterminatedString { pos }),
                Some(b'"') => break,
                Some(_) => self.advance(),
            }
        }
        let text = self.text(start);
        self.advance(); // '"'
        Ok(Token::literal(TokenKind::StringLit, text, pos))
    }

    /* ────────── Primitives internes ────────── */

    #[inline] fn current(&self) -> Option<u8> { self.bytes.get(self.off).copied() }
    #[inline] fn peek(&self) -> Option<u8> { self.bytes.get(self.off + 1).copied() }
    #[inline] fn pos(&self) -> Pos { Pos::new(self.line, self.col) }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.off += 1;
            if c == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    #[inline]
    fn eat(&mut self, expected: u8) -> bool {
        if self.current() == Some(expected) { self.advance(); true } else { false }
    }

    /// Espaces, tabulations, CR et commentaires `//` (le `\n` final reste).
    fn skip_blanks(&mut self) {
        loop {
            match self.current() {
                Some(b' ' | b'\t' | b'\r') => self.advance(),
                Some(b'/') if self.peek() == Some(b'/') => {
                    while self.current().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn text(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.bytes[start..self.off]).into_owned()
    }

    fn emit(&mut self, tok: Token) -> Token {
        self.last = Some(tok.kind);
        tok
    }
}

/* ─────────────────────────── Points d'entrée ─────────────────────────── */

/// Tokenise une source texte.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> { Lexer::new(src).tokenize() }

/// Lit `reader` jusqu'au bout puis tokenise.
pub fn tokenize_reader(mut reader: impl Read) -> Result<Vec<Token>, LexError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Lexer::from_bytes(&buf).tokenize()
}

/* ─────────────────────────── Helpers ─────────────────────────── */

#[inline]
fn is_ident_start(c: u8) -> bool { c == b'_' || c.is_ascii_alphabetic() }

#[inline]
fn is_ident_continue(c: u8) -> bool { c == b'_' || c.is_ascii_alphanumeric() }

#[inline]
fn keyword_of(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "if" => If,
        "else" => Else,
        "fun" => Fun,
        "while" => While,
        "var" => Var,
        "val" => Val,
        "print" => Print,
        "return" => Return,
        "class" => Class,
        "true" | "false" => BooleanLit,
        _ => return None,
    })
}

/* ─────────────────────────── Tests ─────────────────────────── */
