//! Kite AST (Abstract Syntax Tree)
//!
//! Structures produites par `kite-parser`, consommées par `kite-compiler`.
//! Familles fermées : [`Expr`], [`Stmt`], [`Type`], plus [`Program`].
//!
//! Chaque nœud implémente `Display` sous forme d'expression S
//! (`(+ 4 (* 2 3))`), utilisée par les diagnostics et les tests.
//!
//! # Features
//! - `serde` : permet la sérialisation/désérialisation de l’AST
//!
//! # Exemple
//! ```rust
//! use kite_ast::{BinaryOp, Expr};
//! use kite_core::{Pos, Spanned};
//!
//! let e = Expr::binary(Expr::IntLiteral(4), Spanned::new(BinaryOp::Add, Pos::START), Expr::IntLiteral(4));
//! assert_eq!(e.to_string(), "(+ 4 4)");
//! ```

#![warn(missing_docs)]

use core::fmt;

use kite_core::{Pos, Spanned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Programme ─────────────────────────── */

/// Un programme Kite complet.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    /// Instructions top-level, dans l'ordre source.
    pub statements: Vec<Stmt>,
}

/// Identifiant positionné.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ident {
    /// Nom.
    pub name: String,
    /// Position du jeton.
    pub pos: Pos,
}

impl Ident {
    /// Construit un identifiant.
    pub fn new(name: impl Into<String>, pos: Pos) -> Self { Self { name: name.into(), pos } }
}

/* ─────────────────────────── Opérateurs ─────────────────────────── */

/// Opérateurs binaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `?:`
    Elvis,
}

impl BinaryOp {
    /// Symbole source.
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Elvis => "?:",
        }
    }
}

/// Opérateurs unaires préfixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `!`
    Not,
}

impl UnaryOp {
    /// Symbole source.
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
        }
    }
}

/* ─────────────────────────── Expressions ─────────────────────────── */

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// `left op right`
    Binary {
        /// Opérande gauche.
        left: Box<Expr>,
        /// Opérateur et sa position.
        op: Spanned<BinaryOp>,
        /// Opérande droit.
        right: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// Opérateur et sa position.
        op: Spanned<UnaryOp>,
        /// Opérande.
        operand: Box<Expr>,
    },
    /// Littéral entier.
    IntLiteral(i64),
    /// Littéral flottant.
    DoubleLiteral(f64),
    /// `true` / `false`.
    BoolLiteral(bool),
    /// Littéral chaîne (contenu brut).
    StringLiteral(String),
    /// `( expr )`
    Grouping(Box<Expr>),
    /// Référence à un nom.
    Identifier(Ident),
    /// `expr!!`
    NonNullable(Box<Expr>),
    /// `callee(args…)`
    Call {
        /// Appelé (identifiant ou autre appel).
        callee: Box<Expr>,
        /// Arguments, dans l'ordre.
        args: Vec<Expr>,
    },
    /// `fun (params) [: Type] body`
    FunctionLiteral(FunctionLiteral),
}

impl Expr {
    /// Raccourci pour [`Expr::Binary`].
    pub fn binary(left: Expr, op: Spanned<BinaryOp>, right: Expr) -> Self {
        Expr::Binary { left: Box::new(left), op, right: Box::new(right) }
    }

    /// Raccourci pour [`Expr::Unary`].
    pub fn unary(op: Spanned<UnaryOp>, operand: Expr) -> Self {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    /// Vrai pour un identifiant nu.
    pub const fn is_identifier(&self) -> bool { matches!(self, Expr::Identifier(_)) }

    /// Nom court du genre de nœud (diagnostics).
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Expr::Binary { .. } => "binary expression",
            Expr::Unary { .. } => "unary expression",
            Expr::IntLiteral(_) => "integer literal",
            Expr::DoubleLiteral(_) => "double literal",
            Expr::BoolLiteral(_) => "boolean literal",
            Expr::StringLiteral(_) => "string literal",
            Expr::Grouping(_) => "grouping",
            Expr::Identifier(_) => "identifier",
            Expr::NonNullable(_) => "non-null assertion",
            Expr::Call { .. } => "call",
            Expr::FunctionLiteral(_) => "function literal",
        }
    }
}

/// Littéral de fonction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionLiteral {
    /// Paramètres typés.
    pub params: Vec<Param>,
    /// Type de retour explicite.
    pub return_type: Option<Type>,
    /// Corps.
    pub body: FunctionBody,
    /// Position du mot-clé `fun`.
    pub pos: Pos,
}

/// Paramètre `name: Type`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Param {
    /// Nom.
    pub name: Ident,
    /// Type annoté.
    pub ty: Type,
}

/// Corps d'un littéral de fonction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FunctionBody {
    /// `= expr`
    Expr(Box<Expr>),
    /// `{ stmt* }`
    Block(Vec<Stmt>),
    /// Pas de corps.
    Absent,
}

/* ─────────────────────────── Instructions ─────────────────────────── */

/// Instructions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stmt {
    /// `{ stmt* }`
    Block(Vec<Stmt>),
    /// Expression seule.
    Expr(ExprStmt),
    /// `var` / `val`.
    VariableDecl(VariableDecl),
    /// `target = value`
    Assign(AssignStmt),
    /// `class Name(...)`
    ClassDecl(ClassDecl),
}

/// Instruction-expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExprStmt {
    /// L'expression.
    pub expr: Expr,
    /// Position du premier jeton.
    pub pos: Pos,
}

/// Déclaration de variable. Invariant : sans type, l'initialiseur est présent.
///
/// La désérialisation passe par [`VariableDecl::new`] et rejette un
/// enregistrement qui viole l'invariant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "RawVariableDecl"))]
pub struct VariableDecl {
    name: Ident,
    ty: Option<Type>,
    initializer: Option<Expr>,
    read_only: bool,
}

impl VariableDecl {
    /// Construit la déclaration ; `None` si ni type ni initialiseur.
    pub fn new(name: Ident, ty: Option<Type>, initializer: Option<Expr>, read_only: bool) -> Option<Self> {
        if ty.is_none() && initializer.is_none() {
            return None;
        }
        Some(Self { name, ty, initializer, read_only })
    }

    /// Nom déclaré.
    pub const fn name(&self) -> &Ident { &self.name }
    /// Type annoté.
    pub const fn ty(&self) -> Option<&Type> { self.ty.as_ref() }
    /// Valeur initiale.
    pub const fn initializer(&self) -> Option<&Expr> { self.initializer.as_ref() }
    /// `val` (vrai) ou `var` (faux).
    pub const fn is_read_only(&self) -> bool { self.read_only }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawVariableDecl {
    name: Ident,
    ty: Option<Type>,
    initializer: Option<Expr>,
    read_only: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<RawVariableDecl> for VariableDecl {
    type Error = String;

    fn try_from(raw: RawVariableDecl) -> Result<Self, Self::Error> {
        let name = raw.name.name.clone();
        Self::new(raw.name, raw.ty, raw.initializer, raw.read_only)
            .ok_or_else(|| format!("variable `{name}` must either have a type annotation or be initialized"))
    }
}

/// Affectation ; `a = b = 2` s'imbrique à droite.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignStmt {
    /// Cible.
    pub target: Ident,
    /// Valeur affectée.
    pub value: AssignValue,
}

/// Membre droit d'une affectation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssignValue {
    /// Expression simple.
    Expr(Expr),
    /// Affectation chaînée.
    Chain(Box<AssignStmt>),
}

/// Déclaration de classe.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassDecl {
    /// Nom de la classe.
    pub name: Ident,
    /// Constructeur primaire, absent si la liste est vide ou omise.
    pub primary_constructor: Option<ClassPrimaryConstructor>,
}

/// Constructeur primaire (liste non vide, vérifiée aussi à la désérialisation).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "RawClassPrimaryConstructor"))]
pub struct ClassPrimaryConstructor {
    params: Vec<ClassParam>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawClassPrimaryConstructor {
    params: Vec<ClassParam>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawClassPrimaryConstructor> for ClassPrimaryConstructor {
    type Error = &'static str;

    fn try_from(raw: RawClassPrimaryConstructor) -> Result<Self, Self::Error> {
        Self::new(raw.params).ok_or("a primary constructor needs at least one parameter")
    }
}

impl ClassPrimaryConstructor {
    /// `None` pour une liste vide.
    pub fn new(params: Vec<ClassParam>) -> Option<Self> {
        (!params.is_empty()).then_some(Self { params })
    }

    /// Paramètres, dans l'ordre.
    pub fn params(&self) -> &[ClassParam] { &self.params }
}

/// Paramètre de constructeur `name: Type [= default]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassParam {
    /// Nom.
    pub name: Ident,
    /// Type.
    pub ty: Type,
    /// Valeur par défaut.
    pub default: Option<Expr>,
    /// Toujours vrai pour l'instant (propriété implicite `val`).
    pub read_only: bool,
}

/* ─────────────────────────── Types ─────────────────────────── */

/// Types annotés.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// `Int`, `String`, …
    Name(String),
    /// `[]T`
    Array(Box<Type>),
    /// `T?`
    Nullable(Box<Type>),
}

/* ─────────────────────────── Affichage (expressions S) ─────────────────────────── */

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for item in items {
        write!(f, " {item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { left, op, right } => write!(f, "({} {left} {right})", op.value.symbol()),
            Expr::Unary { op, operand } => write!(f, "({} {operand})", op.value.symbol()),
            Expr::IntLiteral(v) => write!(f, "{v}"),
            Expr::DoubleLiteral(v) => write!(f, "{v:?}"),
            Expr::BoolLiteral(v) => write!(f, "{v}"),
            Expr::StringLiteral(s) => write!(f, "{s:?}"),
            Expr::Grouping(e) => write!(f, "(group {e})"),
            Expr::Identifier(id) => f.write_str(&id.name),
            Expr::NonNullable(e) => write!(f, "(!! {e})"),
            Expr::Call { callee, args } => {
                write!(f, "(call {callee}")?;
                join(f, args)?;
                f.write_str(")")
            }
            Expr::FunctionLiteral(fun) => write!(f, "{fun}"),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(fun (")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {}", p.name.name, p.ty)?;
        }
        f.write_str(")")?;
        if let Some(rt) = &self.return_type {
            write!(f, " : {rt}")?;
        }
        match &self.body {
            FunctionBody::Expr(e) => write!(f, " = {e}")?,
            FunctionBody::Block(stmts) => {
                f.write_str(" (block")?;
                join(f, stmts)?;
                f.write_str(")")?;
            }
            FunctionBody::Absent => {}
        }
        f.write_str(")")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Block(stmts) => {
                f.write_str("(block")?;
                join(f, stmts)?;
                f.write_str(")")
            }
            Stmt::Expr(s) => write!(f, "{}", s.expr),
            Stmt::VariableDecl(d) => write!(f, "{d}"),
            Stmt::Assign(a) => write!(f, "{a}"),
            Stmt::ClassDecl(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for VariableDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = if self.read_only { "val" } else { "var" };
        write!(f, "({kw} {}", self.name.name)?;
        if let Some(ty) = &self.ty {
            write!(f, ": {ty}")?;
        }
        if let Some(init) = &self.initializer {
            write!(f, " = {init}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for AssignStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AssignValue::Expr(e) => write!(f, "(= {} {e})", self.target.name),
            AssignValue::Chain(inner) => write!(f, "(= {} {inner})", self.target.name),
        }
    }
}

impl fmt::Display for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(class {}", self.name.name)?;
        if let Some(ctor) = &self.primary_constructor {
            for p in ctor.params() {
                write!(f, " (val {}: {}", p.name.name, p.ty)?;
                if let Some(d) = &p.default {
                    write!(f, " = {d}")?;
                }
                f.write_str(")")?;
            }
        }
        f.write_str(")")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Name(n) => f.write_str(n),
            Type::Array(t) => write!(f, "[]{t}"),
            Type::Nullable(t) => write!(f, "{t}?"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.statements {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
