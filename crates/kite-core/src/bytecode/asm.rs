//! Tiny assembler: turns a text listing into a [`Chunk`].
//!
//! ```text
//! ; 10 - 3
//! CONSTANT 10
//! CONSTANT 3
//! SUBTRACT
//! RETURN
//! ```
//!
//! - one instruction per line, `;` starts a comment;
//! - mnemonics are opcode names, case-insensitive, `OP_` prefix optional;
//! - `CONSTANT <number>` picks the short or long form from the pool index,
//!   `CONSTANT_LONG <number>` always emits the long form;
//! - the source line of an instruction is its line in the listing.

use crate::{
    bytecode::chunk::{Chunk, OpCode},
    CoreError, CoreResult,
};

/// Assemble `source` into a chunk.
pub fn assemble(source: &str) -> CoreResult<Chunk> {
    let mut chunk = Chunk::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let line = raw_line.split_once(';').map_or(raw_line, |(code, _)| code).trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let mnemonic = parts.next().unwrap_or_default();
        let operand = parts.next();
        if let Some(extra) = parts.next() {
            return Err(CoreError::asm(line_no, format!("unexpected token `{extra}`")));
        }

        let op = OpCode::from_mnemonic(mnemonic)
            .ok_or_else(|| CoreError::asm(line_no, format!("unknown mnemonic `{mnemonic}`")))?;

        match (op, operand) {
            (OpCode::Constant | OpCode::ConstantLong, None) => {
                return Err(CoreError::asm(line_no, format!("{} expects a number", op.name())));
            }
            (OpCode::Constant | OpCode::ConstantLong, Some(text)) => {
                let value = parse_number(text, line_no)?;
                if op == OpCode::Constant {
                    chunk.write_constant(value, line_no)?;
                } else {
                    chunk.write_long_constant(value, line_no)?;
                }
            }
            (_, Some(text)) => {
                return Err(CoreError::asm(line_no, format!("{} takes no operand, got `{text}`", op.name())));
            }
            (_, None) => chunk.write_op(op, line_no),
        }
    }

    Ok(chunk)
}

fn parse_number(text: &str, line: u32) -> CoreResult<f64> {
    text.parse::<f64>()
        .map_err(|_| CoreError::asm(line, format!("invalid number `{text}`")))
}
