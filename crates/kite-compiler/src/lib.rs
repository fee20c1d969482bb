//! kite-compiler: AST vers bytecode
//!
//! - Entrée : `kite_ast::Program`
//! - Sortie : `kite_core::bytecode::Chunk`
//! - Couvre les instructions-expressions numériques : littéraux entiers et
//!   flottants, parenthèses, `-`/`+` unaires, `+ - * /` binaires.
//!
//! Chaque instruction est émise dans l'ordre ; un `RETURN` suit la dernière,
//! sur sa ligne, si bien que la VM rapporte la valeur de la dernière instruction.
//!
//! ```
//! let program = kite_parser::parse("1 + 2 * 3").unwrap();
//! let chunk = kite_compiler::compile(&program).unwrap();
//! assert!(chunk.validate().is_ok());
//! ```

#![warn(missing_docs)]

use kite_ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use kite_core::bytecode::{Chunk, OpCode};
use kite_core::CoreError;

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Résultat de compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Erreur de compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Aucune instruction à compiler.
    #[error("nothing to compile: the program is empty")]
    EmptyProgram,
    /// Construction hors du sous-ensemble compilable.
    #[error("line {line}: {construct} is not supported by the bytecode compiler")]
    Unsupported {
        /// Construction rencontrée.
        construct: String,
        /// Ligne source.
        line: u32,
    },
    /// Expression imbriquée au-delà de [`MAX_DEPTH`] niveaux.
    #[error("line {line}: expression nested deeper than {max} levels")]
    TooDeep {
        /// Ligne source.
        line: u32,
        /// Borne.
        max: usize,
    },
    /// Erreur du chunk (pool de constantes plein).
    #[error(transparent)]
    Chunk(#[from] CoreError),
}

/* ─────────────────────────── Compilateur ─────────────────────────── */

/// Profondeur d'expression maximale acceptée par l'émetteur.
pub const MAX_DEPTH: usize = 1024;

/// Compile un programme en chunk.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len())))]
pub fn compile(program: &Program) -> CompileResult<Chunk> {
    let mut compiler = Compiler::new();
    compiler.program(program)?;
    Ok(compiler.finish())
}

/// Émetteur : accumule le code d'un programme dans un chunk.
#[derive(Debug, Default)]
pub struct Compiler {
    chunk: Chunk,
    depth: usize,
}

impl Compiler {
    /// Compilateur vide.
    pub fn new() -> Self { Self::default() }

    /// Émet toutes les instructions puis le `RETURN` final.
    pub fn program(&mut self, program: &Program) -> CompileResult<()> {
        let mut last_line = None;
        for stmt in &program.statements {
            last_line = Some(self.stmt(stmt)?);
        }
        let line = last_line.ok_or(CompileError::EmptyProgram)?;
        self.chunk.write_op(OpCode::Return, line);
        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = self.chunk.len(), constants = self.chunk.constants().len(), "chunk emitted");
        Ok(())
    }

    /// Chunk produit.
    pub fn finish(self) -> Chunk { self.chunk }

    /// Émet une instruction et renvoie sa ligne.
    fn stmt(&mut self, stmt: &Stmt) -> CompileResult<u32> {
        match stmt {
            Stmt::Expr(s) => {
                self.expr(&s.expr, s.pos.line)?;
                Ok(s.pos.line)
            }
            other => Err(CompileError::Unsupported { construct: stmt_name(other).into(), line: stmt_line(other) }),
        }
    }

    fn expr(&mut self, expr: &Expr, line: u32) -> CompileResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(CompileError::TooDeep { line, max: MAX_DEPTH });
        }
        self.depth += 1;
        let result = self.expr_at(expr, line);
        self.depth -= 1;
        result
    }

    #[allow(clippy::cast_precision_loss)]
    fn expr_at(&mut self, expr: &Expr, line: u32) -> CompileResult<()> {
        match expr {
            Expr::IntLiteral(v) => {
                self.chunk.write_constant(*v as f64, line)?;
            }
            Expr::DoubleLiteral(v) => {
                self.chunk.write_constant(*v, line)?;
            }
            Expr::Grouping(inner) => self.expr(inner, line)?,
            Expr::Unary { op, operand } => {
                let op_line = op.pos.line;
                match op.value {
                    UnaryOp::Neg => {
                        self.expr(operand, line)?;
                        self.chunk.write_op(OpCode::Negate, op_line);
                    }
                    UnaryOp::Plus => self.expr(operand, line)?,
                    UnaryOp::Not => return Err(unsupported("operator `!`", op_line)),
                }
            }
            Expr::Binary { left, op, right } => {
                let code = match op.value {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Subtract,
                    BinaryOp::Mul => OpCode::Multiply,
                    BinaryOp::Div => OpCode::Divide,
                    other => return Err(unsupported(&format!("operator `{}`", other.symbol()), op.pos.line)),
                };
                self.expr(left, line)?;
                self.expr(right, line)?;
                self.chunk.write_op(code, op.pos.line);
            }
            Expr::Identifier(id) => return Err(unsupported(&format!("identifier `{}`", id.name), id.pos.line)),
            Expr::FunctionLiteral(f) => return Err(unsupported(expr.kind_name(), f.pos.line)),
            other => return Err(unsupported(other.kind_name(), line)),
        }
        Ok(())
    }
}

fn unsupported(construct: &str, line: u32) -> CompileError {
    CompileError::Unsupported { construct: construct.to_owned(), line }
}

const fn stmt_name(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Block(_) => "block",
        Stmt::Expr(_) => "expression statement",
        Stmt::VariableDecl(_) => "variable declaration",
        Stmt::Assign(_) => "assignment",
        Stmt::ClassDecl(_) => "class declaration",
    }
}

fn stmt_line(stmt: &Stmt) -> u32 {
    match stmt {
        Stmt::Block(body) => body.first().map_or(0, stmt_line),
        Stmt::Expr(s) => s.pos.line,
        Stmt::VariableDecl(d) => d.name().pos.line,
        Stmt::Assign(a) => a.target.pos.line,
        Stmt::ClassDecl(c) => c.name.pos.line,
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use kite_core::disasm::disassemble;
    use pretty_assertions::assert_eq;

    fn compile_src(src: &str) -> CompileResult<Chunk> {
        compile(&kite_parser::parse(src).unwrap())
    }

    #[test]
    fn subtraction_layout() {
        let chunk = compile_src("10 - 3").unwrap();
        assert_eq!(
            chunk.code(),
            &[OpCode::Constant as u8, 0, OpCode::Constant as u8, 1, OpCode::Subtract as u8, OpCode::Return as u8]
        );
        assert_eq!(chunk.constants(), &[10.0, 3.0]);
    }

    #[test]
    fn operands_before_operator() {
        let chunk = compile_src("-(1 + 2) * 4.5").unwrap();
        let listing = disassemble(&chunk, "t");
        let names: Vec<_> = listing.lines().skip(1).map(|l| l.split_whitespace().nth(2).unwrap_or("").to_owned()).collect();
        assert_eq!(
            names,
            vec!["OP_CONSTANT", "OP_CONSTANT", "OP_ADD", "OP_CONSTANT", "OP_MULTIPLY", "OP_NEGATE", "OP_RETURN"]
        );
    }

    #[test]
    fn return_sits_on_last_statement_line() {
        let chunk = compile_src("1 + 1\n\n2 * 2").unwrap();
        let last = chunk.len() - 1;
        assert_eq!(chunk.code()[last], OpCode::Return as u8);
        assert_eq!(chunk.line_at(last), 3);
        assert_eq!(chunk.line_at(0), 1);
    }

    #[test]
    fn unary_plus_is_a_no_op() {
        let chunk = compile_src("+5").unwrap();
        assert_eq!(chunk.code(), &[OpCode::Constant as u8, 0, OpCode::Return as u8]);
    }

    #[test]
    fn empty_program_is_rejected() {
        assert_eq!(compile_src("").unwrap_err(), CompileError::EmptyProgram);
    }

    #[test]
    fn unsupported_constructs_name_line() {
        assert_eq!(
            compile_src("1\nval x = 2").unwrap_err(),
            CompileError::Unsupported { construct: "variable declaration".into(), line: 2 }
        );
        assert_eq!(
            compile_src("1 == 2").unwrap_err(),
            CompileError::Unsupported { construct: "operator `==`".into(), line: 1 }
        );
        assert_eq!(
            compile_src("\n\"s\"").unwrap_err(),
            CompileError::Unsupported { construct: "string literal".into(), line: 2 }
        );
        assert!(matches!(compile_src("x + 1"), Err(CompileError::Unsupported { .. })));
        assert!(matches!(compile_src("!true"), Err(CompileError::Unsupported { .. })));
    }

    #[test]
    fn deep_expressions_are_rejected() {
        let src = vec!["1"; 2000].join(" + ");
        assert_eq!(
            compile_src(&src).unwrap_err(),
            CompileError::TooDeep { line: 1, max: MAX_DEPTH }
        );

        let mut deep = Expr::IntLiteral(1);
        for _ in 0..5000 {
            deep = Expr::Grouping(Box::new(deep));
        }
        let program = Program { statements: vec![Stmt::Expr(kite_ast::ExprStmt { expr: deep, pos: kite_core::Pos::START })] };
        assert!(matches!(compile(&program), Err(CompileError::TooDeep { .. })));

        let src = vec!["1"; 500].join(" + ");
        assert!(compile_src(&src).is_ok());
    }

    #[test]
    fn many_literals_use_long_constants() {
        let src = (0..300).map(|i| i.to_string()).collect::<Vec<_>>().join(" + ");
        let chunk = compile_src(&src).unwrap();
        assert_eq!(chunk.constants().len(), 300);
        assert!(chunk.validate().is_ok());
        assert!(chunk.code().contains(&(OpCode::ConstantLong as u8)));
    }
}
