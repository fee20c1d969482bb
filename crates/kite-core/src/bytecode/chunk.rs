//! Core bytecode structures: opcodes, the per-byte line table and the chunk.
//!
//! A chunk is a flat byte sequence in which opcodes and their operand bytes are
//! interleaved, plus a pool of numeric constants. Every byte carries the source
//! line it was emitted for.

use core::fmt;

use crate::{CoreError, CoreResult};

/// Runtime value: every stack slot and constant is an `f64`.
pub type Value = f64;

/// Pool indices below this bound use the 1-byte `CONSTANT` form.
pub const SHORT_CONSTANT_LIMIT: usize = 256;

/// Number of constants addressable by the 3-byte `CONSTANT_LONG` operand.
pub const MAX_CONSTANTS: usize = 1 << 24;

/// Single-byte instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Push `constants[u8]`.
    Constant = 0,
    /// Push `constants[u24 little-endian]`.
    ConstantLong = 1,
    /// `push(-pop())`
    Negate = 2,
    /// `push(left + right)`
    Add = 3,
    /// `push(left - right)`
    Subtract = 4,
    /// `push(left * right)`
    Multiply = 5,
    /// `push(left / right)`
    Divide = 6,
    /// Report `pop()` and halt.
    Return = 7,
}

impl OpCode {
    /// Every opcode, in byte order.
    pub const ALL: [OpCode; 8] = [
        OpCode::Constant,
        OpCode::ConstantLong,
        OpCode::Negate,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Return,
    ];

    /// Encoded width in bytes, opcode included.
    pub const fn width(self) -> usize {
        match self {
            OpCode::Constant => 2,
            OpCode::ConstantLong => 4,
            _ => 1,
        }
    }

    /// Listing name (`OP_ADD`, …).
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Resolve an assembler mnemonic, with or without the `OP_` prefix.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        let bare = upper.strip_prefix("OP_").unwrap_or(&upper);
        Self::ALL.into_iter().find(|op| &op.name()[3..] == bare)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Line table: one source line per code byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<u32>,
}

impl LineTable {
    /// Create an empty line table.
    pub fn new() -> Self { Self { lines: Vec::new() } }
    /// Append the line of the next code byte.
    pub fn push(&mut self, line: u32) { self.lines.push(line); }
    /// Number of recorded bytes.
    pub fn len(&self) -> usize { self.lines.len() }
    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    /// Source line of the byte at `offset` (0 when out of range).
    pub fn line_at(&self, offset: usize) -> u32 { self.lines.get(offset).copied().unwrap_or_default() }
    /// Release the storage.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.shrink_to_fit();
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Offset of the opcode byte.
    pub offset: usize,
    /// The opcode.
    pub op: OpCode,
    /// Constant index for the two constant forms.
    pub operand: Option<usize>,
}

impl Decoded {
    /// Offset of the following instruction.
    pub const fn next_offset(&self) -> usize { self.offset + self.op.width() }
}

/// Bytecode chunk: code bytes, their lines, and the constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: LineTable,
    constants: Vec<Value>,
}

impl Chunk {
    /// Create an empty chunk.
    pub fn new() -> Self { Self::default() }

    /// Append one byte (opcode or operand) for `line`.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode for `line`.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.into(), line); }

    /// Append `value` to the pool and return its index.
    pub fn add_constant(&mut self, value: Value) -> CoreResult<usize> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(CoreError::PoolOverflow { max: MAX_CONSTANTS });
        }
        self.constants.push(value);
        Ok(self.constants.len() - 1)
    }

    /// Add `value` to the pool and emit the instruction loading it.
    ///
    /// The short form is chosen when the assigned index fits in one byte,
    /// otherwise the long form with three little-endian index bytes.
    pub fn write_constant(&mut self, value: Value, line: u32) -> CoreResult<usize> {
        let index = self.add_constant(value)?;
        if index < SHORT_CONSTANT_LIMIT {
            self.write_op(OpCode::Constant, line);
            self.write(index as u8, line);
        } else {
            self.write_long_index(index, line);
        }
        Ok(index)
    }

    /// Like [`Chunk::write_constant`] but always emits `CONSTANT_LONG`.
    pub fn write_long_constant(&mut self, value: Value, line: u32) -> CoreResult<usize> {
        let index = self.add_constant(value)?;
        self.write_long_index(index, line);
        Ok(index)
    }

    fn write_long_index(&mut self, index: usize, line: u32) {
        self.write_op(OpCode::ConstantLong, line);
        self.write((index & 0xff) as u8, line);
        self.write(((index >> 8) & 0xff) as u8, line);
        self.write(((index >> 16) & 0xff) as u8, line);
    }

    /// Raw code bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Constant pool.
    pub fn constants(&self) -> &[Value] { &self.constants }

    /// Constant at `index`, if any.
    pub fn constant(&self, index: usize) -> Option<Value> { self.constants.get(index).copied() }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> u32 { self.lines.line_at(offset) }

    /// Number of code bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// Whether no byte has been written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Decode the instruction starting at `offset`.
    pub fn decode_at(&self, offset: usize) -> CoreResult<Decoded> {
        let byte = *self.code.get(offset).ok_or(CoreError::Truncated { offset, needed: 1 })?;
        let op = OpCode::try_from(byte).map_err(|byte| CoreError::UnknownOpcode { byte, offset })?;
        if offset + op.width() > self.code.len() {
            return Err(CoreError::Truncated { offset, needed: op.width() });
        }
        let operand = match op {
            OpCode::Constant => Some(self.code[offset + 1] as usize),
            OpCode::ConstantLong => Some(
                self.code[offset + 1] as usize
                    | (self.code[offset + 2] as usize) << 8
                    | (self.code[offset + 3] as usize) << 16,
            ),
            _ => None,
        };
        Ok(Decoded { offset, op, operand })
    }

    /// Iterate over decoded instructions, stopping at the first malformed one.
    pub fn instructions(&self) -> impl Iterator<Item = CoreResult<Decoded>> + '_ {
        let mut offset = 0;
        let mut failed = false;
        core::iter::from_fn(move || {
            if failed || offset >= self.code.len() {
                return None;
            }
            let decoded = self.decode_at(offset);
            match &decoded {
                Ok(d) => offset = d.next_offset(),
                Err(_) => failed = true,
            }
            Some(decoded)
        })
    }

    /// Structural validation: complete instructions, known opcodes and
    /// constant operands inside the pool.
    pub fn validate(&self) -> CoreResult<()> {
        for decoded in self.instructions() {
            let d = decoded?;
            if let Some(index) = d.operand {
                if index >= self.constants.len() {
                    return Err(CoreError::ConstantOutOfRange {
                        offset: d.offset,
                        index,
                        len: self.constants.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Release code, lines and constants. The chunk is empty afterwards.
    pub fn destroy(&mut self) {
        self.code.clear();
        self.code.shrink_to_fit();
        self.lines.clear();
        self.constants.clear();
        self.constants.shrink_to_fit();
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
