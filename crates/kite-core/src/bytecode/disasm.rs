//! Textual disassembly of a [`Chunk`], one line per instruction.
//!
//! ```text
//! ==== demo ====
//! 0000    1 OP_CONSTANT         0 '10'
//! 0002    | OP_CONSTANT         1 '3'
//! 0004    | OP_SUBTRACT
//! 0005    2 OP_RETURN
//! ```

use core::fmt::Write;

use crate::bytecode::chunk::{Chunk, OpCode};
use crate::CoreError;

/// Full listing with a `==== name ====` header.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==== {name} ====");
    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Render the instruction at `offset` and return it with the next offset.
///
/// The line column shows `   |` when the byte before shares the same source line.
/// Unknown opcodes are rendered and skipped one byte at a time; a truncated
/// trailing instruction ends the listing.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut out = String::new();
    let _ = write!(out, "{offset:04} ");
    let line = chunk.line_at(offset);
    if offset > 0 && line == chunk.line_at(offset - 1) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{line:4} ");
    }

    match chunk.decode_at(offset) {
        Ok(d) => {
            match d.operand {
                Some(index) => {
                    let _ = write!(out, "{:<16} {index:4} '", d.op.name());
                    match chunk.constant(index) {
                        Some(v) => { let _ = write!(out, "{v}'"); }
                        None => out.push_str("?' ; out of range"),
                    }
                }
                None => out.push_str(d.op.name()),
            }
            (out, d.next_offset())
        }
        Err(CoreError::UnknownOpcode { byte, .. }) => {
            let _ = write!(out, "Unknown opcode {byte}");
            (out, offset + 1)
        }
        Err(_) => {
            let name = chunk
                .code()
                .get(offset)
                .and_then(|b| OpCode::try_from(*b).ok())
                .map_or("?", OpCode::name);
            let _ = write!(out, "{name} <truncated>");
            (out, chunk.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Chunk {
        let mut c = Chunk::new();
        c.write_constant(10.0, 1).unwrap();
        c.write_constant(3.0, 1).unwrap();
        c.write_op(OpCode::Subtract, 1);
        c.write_op(OpCode::Return, 2);
        c
    }

    #[test]
    fn listing_format() {
        let text = disassemble(&sample(), "demo");
        let expected = "\
==== demo ====
0000    1 OP_CONSTANT         0 '10'
0002    | OP_CONSTANT         1 '3'
0004    | OP_SUBTRACT
0005    2 OP_RETURN
";
        assert_eq!(text, expected);
    }

    #[test]
    fn one_line_per_logical_instruction() {
        let mut c = Chunk::new();
        for i in 0..300 {
            c.write_constant(f64::from(i), 1).unwrap();
        }
        c.write_op(OpCode::Return, 1);
        let text = disassemble(&c, "big");
        // header + 300 constants + return
        assert_eq!(text.lines().count(), 1 + 300 + 1);
        assert!(text.contains("OP_CONSTANT_LONG  256 '256'"));
    }

    #[test]
    fn unknown_opcode_advances_by_one() {
        let mut c = Chunk::new();
        c.write(42, 3);
        c.write_op(OpCode::Return, 3);
        let (line, next) = disassemble_instruction(&c, 0);
        assert_eq!(line, "0000    3 Unknown opcode 42");
        assert_eq!(next, 1);
        let (line, _) = disassemble_instruction(&c, 1);
        assert_eq!(line, "0001    | OP_RETURN");
    }

    #[test]
    fn truncated_tail_ends_listing() {
        let mut c = Chunk::new();
        c.write_op(OpCode::ConstantLong, 1);
        c.write(1, 1);
        let (line, next) = disassemble_instruction(&c, 0);
        assert_eq!(line, "0000    1 OP_CONSTANT_LONG <truncated>");
        assert_eq!(next, c.len());
    }
}
