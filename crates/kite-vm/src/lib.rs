//! kite-vm: machine virtuelle à pile pour les chunks Kite
//!
//! - Entrée : un [`Chunk`] (compilé ou assemblé)
//! - État : pointeur d'instruction + pile de [`STACK_MAX`] valeurs
//! - Sortie : la valeur au sommet lors du `RETURN`, écrite sur le sink
//!
//! ```
//! use kite_core::asm::assemble;
//! use kite_vm::{InterpretResult, Vm};
//!
//! let chunk = assemble("CONSTANT 10\nCONSTANT 3\nSUBTRACT\nRETURN").unwrap();
//! let mut vm = Vm::with_output(Vec::new());
//! assert_eq!(vm.interpret(chunk), InterpretResult::Ok);
//! assert_eq!(vm.output(), b"7\n");
//! ```

#![warn(missing_docs)]

use std::io::{self, Write};

use kite_core::bytecode::{Chunk, OpCode, Value};
use kite_core::CoreError;

mod stack;

pub use stack::{Stack, STACK_MAX};

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs d'exécution.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Plus de place sur la pile.
    #[error("stack overflow: more than {max} values")]
    StackOverflow {
        /// Capacité de la pile.
        max: usize,
    },
    /// Lecture sur pile vide.
    #[error("stack underflow")]
    StackUnderflow,
    /// Fin du code atteinte sans `RETURN` (ou instruction tronquée).
    #[error("offset {offset}: end of code reached without OP_RETURN")]
    UnexpectedEnd {
        /// Offset de lecture.
        offset: usize,
    },
    /// Octet ne correspondant à aucun opcode.
    #[error("offset {offset}: unknown opcode {byte}")]
    UnknownOpcode {
        /// Octet lu.
        byte: u8,
        /// Offset de l'octet.
        offset: usize,
    },
    /// Index de constante hors du pool.
    #[error("offset {offset}: constant index {index} is out of range")]
    BadConstant {
        /// Index demandé.
        index: usize,
        /// Offset de l'instruction.
        offset: usize,
    },
    /// Écriture du résultat impossible.
    #[error("io: {0}")]
    Io(#[from] io::Error),
    /// Autre erreur du chunk, hors décodage.
    #[error(transparent)]
    Chunk(CoreError),
}

/// Résultat de la VM.
pub type VmResult<T> = Result<T, VmError>;

impl From<CoreError> for VmError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownOpcode { byte, offset } => Self::UnknownOpcode { byte, offset },
            CoreError::ConstantOutOfRange { offset, index, .. } => Self::BadConstant { index, offset },
            CoreError::Truncated { offset, .. } => Self::UnexpectedEnd { offset },
            other @ (CoreError::Asm { .. } | CoreError::PoolOverflow { .. }) => Self::Chunk(other),
        }
    }
}

/// Issue d'une interprétation complète.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpretResult {
    /// Exécution terminée par `RETURN`.
    Ok,
    /// Le source n'a pas pu être compilé.
    CompileError,
    /// Erreur pendant l'exécution.
    RuntimeError,
}

impl InterpretResult {
    /// Code de sortie processus (0 / 65 / 70).
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CompileError => 65,
            Self::RuntimeError => 70,
        }
    }
}

/* ─────────────────────────── VM ─────────────────────────── */

/// Machine virtuelle ; `W` reçoit la valeur rapportée par `RETURN`.
#[derive(Debug)]
pub struct Vm<W: Write = io::Stdout> {
    stack: Stack,
    ip: usize,
    out: W,
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self { Self::new() }
}

impl Vm<io::Stdout> {
    /// VM écrivant sur la sortie standard.
    pub fn new() -> Self { Self::with_output(io::stdout()) }
}

impl<W: Write> Vm<W> {
    /// VM écrivant vers un writer quelconque (buffer de test, fichier…).
    pub const fn with_output(out: W) -> Self { Self { stack: Stack::new(), ip: 0, out } }

    /// Pile courante.
    pub const fn stack(&self) -> &Stack { &self.stack }

    /// Pointeur d'instruction (offset du prochain opcode).
    pub const fn ip(&self) -> usize { self.ip }

    /// Sink de sortie.
    pub const fn output_ref(&self) -> &W { &self.out }

    /// Sink de sortie, mutable (prompt du REPL).
    pub fn output_mut(&mut self) -> &mut W { &mut self.out }

    /// Rend le sink.
    pub fn into_output(self) -> W { self.out }

    /// Exécute `chunk` et libère ses ressources, quelle que soit l'issue.
    pub fn interpret(&mut self, chunk: Chunk) -> InterpretResult {
        match self.run(chunk) {
            Ok(_) => InterpretResult::Ok,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, ip = self.ip, "runtime error");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                InterpretResult::RuntimeError
            }
        }
    }

    /// Comme [`Vm::interpret`] mais rend l'erreur détaillée.
    pub fn run(&mut self, mut chunk: Chunk) -> VmResult<Value> {
        let outcome = self.execute(&chunk).and_then(|value| self.report(value).map(|()| value));
        chunk.destroy();
        outcome
    }

    /// Boucle d'exécution : renvoie la valeur dépilée par `RETURN`.
    pub fn execute(&mut self, chunk: &Chunk) -> VmResult<Value> {
        self.stack.reset();
        self.ip = 0;
        loop {
            if self.ip >= chunk.len() {
                return Err(VmError::UnexpectedEnd { offset: self.ip });
            }
            let decoded = chunk.decode_at(self.ip)?;

            #[cfg(feature = "tracing")]
            tracing::trace!(
                stack = ?self.stack.as_slice(),
                "{}",
                kite_core::disasm::disassemble_instruction(chunk, self.ip).0
            );

            self.ip = decoded.next_offset();
            match decoded.op {
                OpCode::Constant | OpCode::ConstantLong => {
                    let index = decoded.operand.unwrap_or_default();
                    let value =
                        chunk.constant(index).ok_or(VmError::BadConstant { index, offset: decoded.offset })?;
                    self.stack.push(value)?;
                }
                OpCode::Negate => {
                    let v = self.stack.pop()?;
                    self.stack.push(-v)?;
                }
                OpCode::Add => self.binary(|a, b| a + b)?,
                OpCode::Subtract => self.binary(|a, b| a - b)?,
                OpCode::Multiply => self.binary(|a, b| a * b)?,
                OpCode::Divide => self.binary(|a, b| a / b)?,
                OpCode::Return => return self.stack.pop(),
            }
        }
    }

    /// Dépile la droite puis la gauche, empile `left OP right`.
    fn binary(&mut self, op: fn(Value, Value) -> Value) -> VmResult<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;
        self.stack.push(op(left, right))
    }

    fn report(&mut self, value: Value) -> VmResult<()> {
        writeln!(self.out, "{value}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl Vm<Vec<u8>> {
    /// Octets écrits jusqu'ici.
    pub fn output(&self) -> &[u8] { &self.out }
}

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Prelude pratique pour importer d'un coup.
pub mod prelude {
    pub use crate::{InterpretResult, Stack, Vm, VmError, VmResult, STACK_MAX};
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use kite_core::asm::assemble;
    use pretty_assertions::assert_eq;

    fn run(chunk: &Chunk) -> VmResult<Value> { Vm::with_output(Vec::new()).execute(chunk) }

    #[test]
    fn subtraction_from_assembly() {
        let chunk = assemble("CONSTANT 10\nCONSTANT 3\nSUBTRACT\nRETURN").unwrap();
        let mut vm = Vm::with_output(Vec::new());
        assert_eq!(vm.interpret(chunk), InterpretResult::Ok);
        assert_eq!(vm.output(), b"7\n");
    }

    #[test]
    fn subtraction_from_source() {
        let program = kite_parser::parse("10 - 3").unwrap();
        let chunk = kite_compiler::compile(&program).unwrap();
        assert_eq!(run(&chunk).unwrap(), 7.0);
    }

    #[test]
    fn operand_order_and_negate() {
        let program = kite_parser::parse("-(8 / 2) * 3").unwrap();
        let chunk = kite_compiler::compile(&program).unwrap();
        assert_eq!(run(&chunk).unwrap(), -12.0);
    }

    #[test]
    fn last_statement_value_is_reported() {
        let program = kite_parser::parse("1 + 1\n2.5 * 2").unwrap();
        let chunk = kite_compiler::compile(&program).unwrap();
        let mut vm = Vm::with_output(Vec::new());
        assert_eq!(vm.interpret(chunk), InterpretResult::Ok);
        assert_eq!(vm.output(), b"5\n");
    }

    #[test]
    fn long_constants_execute() {
        let mut chunk = Chunk::new();
        for _ in 0..300 {
            chunk.add_constant(0.0).unwrap();
        }
        chunk.write_long_constant(42.0, 1).unwrap();
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(run(&chunk).unwrap(), 42.0);
    }

    #[test]
    fn overflow_past_256_values() {
        let mut chunk = Chunk::new();
        let index = chunk.add_constant(1.0).unwrap();
        for _ in 0..=STACK_MAX {
            chunk.write_op(OpCode::Constant, 1);
            chunk.write(index as u8, 1);
        }
        chunk.write_op(OpCode::Return, 1);
        assert!(matches!(run(&chunk), Err(VmError::StackOverflow { max: STACK_MAX })));
        assert_eq!(Vm::with_output(Vec::new()).interpret(chunk), InterpretResult::RuntimeError);
    }

    #[test]
    fn underflow_on_lone_add() {
        let chunk = assemble("ADD\nRETURN").unwrap();
        assert!(matches!(run(&chunk), Err(VmError::StackUnderflow)));
    }

    #[test]
    fn malformed_code() {
        let chunk = assemble("CONSTANT 1").unwrap();
        assert!(matches!(run(&chunk), Err(VmError::UnexpectedEnd { offset: 2 })));

        let mut chunk = Chunk::new();
        chunk.write(0xee, 1);
        assert!(matches!(run(&chunk), Err(VmError::UnknownOpcode { byte: 0xee, offset: 0 })));

        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(5, 1);
        chunk.write_op(OpCode::Return, 1);
        assert!(matches!(run(&chunk), Err(VmError::BadConstant { index: 5, offset: 0 })));

        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::ConstantLong, 1);
        chunk.write(0, 1);
        assert!(matches!(run(&chunk), Err(VmError::UnexpectedEnd { offset: 0 })));
    }

    #[test]
    fn core_errors_keep_their_meaning() {
        let e = VmError::from(CoreError::UnknownOpcode { byte: 9, offset: 3 });
        assert!(matches!(e, VmError::UnknownOpcode { byte: 9, offset: 3 }));
        let e = VmError::from(CoreError::Truncated { offset: 4, needed: 2 });
        assert!(matches!(e, VmError::UnexpectedEnd { offset: 4 }));
        let e = VmError::from(CoreError::PoolOverflow { max: 8 });
        assert!(matches!(e, VmError::Chunk(CoreError::PoolOverflow { max: 8 })));
        assert_eq!(e.to_string(), CoreError::PoolOverflow { max: 8 }.to_string());
        let e = VmError::from(CoreError::asm(2, "bad"));
        assert!(matches!(e, VmError::Chunk(CoreError::Asm { line: 2, .. })));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(InterpretResult::Ok.exit_code(), 0);
        assert_eq!(InterpretResult::CompileError.exit_code(), 65);
        assert_eq!(InterpretResult::RuntimeError.exit_code(), 70);
    }

    #[test]
    fn vm_is_reusable() {
        let mut vm = Vm::with_output(Vec::new());
        assert_eq!(vm.interpret(assemble("CONSTANT 1\nRETURN").unwrap()), InterpretResult::Ok);
        assert_eq!(vm.interpret(assemble("CONSTANT 2\nNEGATE\nRETURN").unwrap()), InterpretResult::Ok);
        assert_eq!(vm.output(), b"1\n-2\n");
        assert!(vm.stack().is_empty());
    }
}
