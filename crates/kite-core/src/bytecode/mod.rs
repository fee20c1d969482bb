//! Bytecode primitives: the chunk format, its opcodes, a textual disassembler
//! and a tiny assembler used by tooling and tests.

/// Chunk representation (code bytes, line table, constant pool).
pub mod chunk;
pub mod disasm;
pub mod asm;

pub use chunk::{Chunk, Decoded, LineTable, OpCode, Value, MAX_CONSTANTS, SHORT_CONSTANT_LIMIT};
