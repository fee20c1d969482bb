//! Erreurs syntaxiques.

use kite_core::Pos;
use kite_lexer::{LexError, Token, TokenKind};

/// Résultat du parser.
pub type PResult<T> = Result<T, ParseError>;

/// Erreur de parsing : genre fautif, position et alternatives admises.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Jeton inattendu à la place d'un genre précis.
    #[error("{}", unexpected(.expected, .found))]
    Unexpected {
        /// Genres admis.
        expected: Vec<TokenKind>,
        /// Jeton rencontré.
        found: Token,
    },
    /// Aucun handler préfixe pour ce genre.
    #[error("{pos}: `{kind}` cannot start {what}; expected one of [{}]", kinds(.accepted))]
    NoPrefix {
        /// Genre rencontré.
        kind: TokenKind,
        /// Position.
        pos: Pos,
        /// `an expression` ou `a type`.
        what: &'static str,
        /// Genres qui peuvent commencer la construction.
        accepted: Vec<TokenKind>,
    },
    /// Puissance de liaison enregistrée sans handler infixe (tables incohérentes).
    #[error("{pos}: `{kind}` has a binding power but no infix handler")]
    MissingInfix {
        /// Genre rencontré.
        kind: TokenKind,
        /// Position.
        pos: Pos,
    },
    /// `var x` sans type ni initialiseur.
    #[error("{pos}: variable `{name}` must either have a type annotation or be initialized")]
    MissingTypeOrInitializer {
        /// Nom de la variable.
        name: String,
        /// Position du nom.
        pos: Pos,
    },
    /// Membre gauche de `=` qui n'est pas un identifiant.
    #[error("{pos}: variable expected on the left of `=`, got {found}")]
    InvalidAssignTarget {
        /// Genre de l'expression trouvée.
        found: &'static str,
        /// Position du `=`.
        pos: Pos,
    },
    /// Appel sur une expression non invocable.
    #[error("{pos}: expression `{callee}` cannot be invoked as a function")]
    NotCallable {
        /// Rendu de l'expression appelée.
        callee: String,
        /// Position de `(`.
        pos: Pos,
    },
    /// `!!` appliqué à autre chose qu'un identifiant.
    #[error("{pos}: identifier expected before `!!`, got {found}")]
    NonNullOperand {
        /// Genre de l'expression trouvée.
        found: &'static str,
        /// Position de `!!`.
        pos: Pos,
    },
    /// Littéral numérique mal formé ou hors bornes.
    #[error("{pos}: invalid numeric literal `{spelling}`")]
    InvalidLiteral {
        /// Texte source.
        spelling: String,
        /// Position.
        pos: Pos,
    },
    /// Imbrication au-delà de la borne du parser.
    #[error("{pos}: nesting deeper than {max} levels")]
    TooDeep {
        /// Position du jeton où la borne est atteinte.
        pos: Pos,
        /// Borne.
        max: usize,
    },
    /// Erreur lexicale remontée.
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    /// Position de l'erreur, si elle en porte une.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            ParseError::Unexpected { found, .. } => Some(found.pos),
            ParseError::NoPrefix { pos, .. }
            | ParseError::MissingInfix { pos, .. }
            | ParseError::MissingTypeOrInitializer { pos, .. }
            | ParseError::InvalidAssignTarget { pos, .. }
            | ParseError::NotCallable { pos, .. }
            | ParseError::NonNullOperand { pos, .. }
            | ParseError::InvalidLiteral { pos, .. }
            | ParseError::TooDeep { pos, .. } => Some(*pos),
            ParseError::Lex(LexError::UnterminatedString { pos }) => Some(*pos),
            ParseError::Lex(LexError::Io(_)) => None,
        }
    }
}

fn unexpected(expected: &[TokenKind], found: &Token) -> String {
    format!("{}: expected one of [{}]; got `{}`", found.pos, kinds(expected), found.spelling)
}

fn kinds(list: &[TokenKind]) -> String {
    list.iter().map(|k| format!("`{k}`")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_lists_alternatives() {
        let e = ParseError::Unexpected {
            expected: vec![TokenKind::Semicolon, TokenKind::Newline],
            found: Token::literal(TokenKind::IntLit, "2", Pos::new(1, 7)),
        };
        assert_eq!(e.to_string(), "[1, 7]: expected one of [`;`, `<NL>`]; got `2`");
        assert_eq!(e.pos(), Some(Pos::new(1, 7)));
    }

    #[test]
    fn missing_type_message() {
        let e = ParseError::MissingTypeOrInitializer { name: "v".into(), pos: Pos::new(2, 5) };
        assert!(e.to_string().ends_with("must either have a type annotation or be initialized"));
    }
}
