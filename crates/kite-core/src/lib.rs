//! kite-core: primitives partagées
//!
//! Fournit :
//! - `Pos` (ligne/colonne 1-based) et `Spanned<T>`
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//! - Le module [`bytecode`] : `Chunk`, `OpCode`, désassembleur et mini-assembleur
//!
//! Features :
//! - `serde` : derive (dé)sérialisation sur `Pos` / `Spanned`

#![warn(missing_docs)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (chunk, opcodes, assembleur, désassembleur).
pub mod bytecode;

/// Compatibilité : ré-exporte le désassembleur textuel.
pub use bytecode::disasm;
/// Compatibilité : ré-exporte l'assembleur minimal.
pub use bytecode::asm;

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Positions ─────────────────────────── */

/// Position dans une source : ligne et colonne, toutes deux 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pos {
    /// Ligne (1-based).
    pub line: u32,
    /// Colonne (1-based).
    pub col: u32,
}

impl Pos {
    /// Début de source.
    pub const START: Self = Self { line: 1, col: 1 };

    /// Construit une position.
    pub const fn new(line: u32, col: u32) -> Self { Self { line, col } }
}

impl Default for Pos {
    fn default() -> Self { Self::START }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.line, self.col)
    }
}

/// Wrapper utilitaire « valeur + position ».
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spanned<T> {
    /// La valeur.
    pub value: T,
    /// La position du premier octet.
    pub pos: Pos,
}

impl<T> Spanned<T> {
    /// Construit un `Spanned<T>`.
    pub const fn new(value: T, pos: Pos) -> Self { Self { value, pos } }
    /// Applique une fonction à la valeur et conserve la position.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> { Spanned { value: f(self.value), pos: self.pos } }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs de bas niveau communes (chunk, assembleur).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Un opérande de constante pointe hors du pool.
    #[error("instruction at offset {offset} references constant {index} but the pool holds {len}")]
    ConstantOutOfRange {
        /// Offset de l'instruction fautive.
        offset: usize,
        /// Index lu.
        index: usize,
        /// Taille du pool.
        len: usize,
    },
    /// Instruction coupée en fin de code.
    #[error("truncated instruction at offset {offset}: needs {needed} bytes")]
    Truncated {
        /// Offset de l'instruction.
        offset: usize,
        /// Largeur attendue.
        needed: usize,
    },
    /// Octet qui ne correspond à aucun opcode.
    #[error("unknown opcode {byte} at offset {offset}")]
    UnknownOpcode {
        /// Octet lu.
        byte: u8,
        /// Offset.
        offset: usize,
    },
    /// Erreur de syntaxe dans un listing assembleur.
    #[error("line {line}: {message}")]
    Asm {
        /// Ligne du listing (1-based).
        line: u32,
        /// Message humain.
        message: Cow<'static, str>,
    },
    /// Pool de constantes plein (index sur 24 bits).
    #[error("constant pool overflow: at most {max} constants")]
    PoolOverflow {
        /// Capacité maximale adressable.
        max: usize,
    },
}

impl CoreError {
    /// Construit une erreur d'assemblage.
    pub fn asm(line: u32, message: impl Into<Cow<'static, str>>) -> Self {
        CoreError::Asm { line, message: message.into() }
    }
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types clés du crate.
pub mod prelude {
    pub use super::{
        bytecode::{Chunk, OpCode, Value},
        CoreError, CoreResult, Pos, Spanned,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_display_matches_bracket_form() {
        assert_eq!(Pos::new(3, 14).to_string(), "[3, 14]");
        assert_eq!(Pos::default(), Pos::START);
    }

    #[test]
    fn spanned_map_keeps_position() {
        let s = Spanned::new(21, Pos::new(2, 5)).map(|v| v * 2);
        assert_eq!(s.value, 42);
        assert_eq!(s.pos, Pos::new(2, 5));
    }

    #[test]
    fn asm_error_message() {
        let e = CoreError::asm(4, "unknown mnemonic `PUSH`");
        assert_eq!(e.to_string(), "line 4: unknown mnemonic `PUSH`");
    }
}
