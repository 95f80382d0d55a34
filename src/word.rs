use std::fmt;

use crate::error::DecodeError;
use crate::symbol::{Opcode, Register};
use crate::{ADDRESS_BITS, INDIRECT_ADDRESS, LITERAL_BITS, REGISTER_BITS, WORD_BITS};

/// One fixed-width machine instruction.
///
/// Packed most-significant field first:
///
/// ```text
///  34      27 26            11 10       3 2   0
/// +----------+----------------+----------+-----+
/// |  opcode  |    literal     | address  | reg |
/// +----------+----------------+----------+-----+
/// ```
///
/// Unused fields are zero. An address of all ones together with a register means the
/// operand lives in memory at the address held by that register.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Word {
    pub opcode: Opcode,
    pub literal: u16,
    pub address: u8,
    pub register: Option<Register>,
}

const REGISTER_SHIFT: u32 = 0;
const ADDRESS_SHIFT: u32 = REGISTER_SHIFT + REGISTER_BITS;
const LITERAL_SHIFT: u32 = ADDRESS_SHIFT + ADDRESS_BITS;
const OPCODE_SHIFT: u32 = LITERAL_SHIFT + LITERAL_BITS;

impl Word {
    /// Instruction with every operand field zeroed.
    pub fn bare(opcode: Opcode) -> Self {
        Word {
            opcode,
            literal: 0,
            address: 0,
            register: None,
        }
    }

    pub fn with_literal(opcode: Opcode, literal: u16) -> Self {
        Word {
            literal,
            ..Word::bare(opcode)
        }
    }

    pub fn with_address(opcode: Opcode, address: u8) -> Self {
        Word {
            address,
            ..Word::bare(opcode)
        }
    }

    pub fn with_register(opcode: Opcode, register: Register) -> Self {
        Word {
            register: Some(register),
            ..Word::bare(opcode)
        }
    }

    pub fn with_indirect(opcode: Opcode, register: Register) -> Self {
        Word {
            address: INDIRECT_ADDRESS,
            register: Some(register),
            ..Word::bare(opcode)
        }
    }

    /// Operand is memory addressed through a register.
    pub fn is_indirect(&self) -> bool {
        self.register.is_some() && self.address == INDIRECT_ADDRESS
    }

    fn register_bits(&self) -> u64 {
        self.register.map_or(0, |reg| reg.number() as u64)
    }

    pub fn pack(&self) -> u64 {
        (self.opcode.code() as u64) << OPCODE_SHIFT
            | (self.literal as u64) << LITERAL_SHIFT
            | (self.address as u64) << ADDRESS_SHIFT
            | self.register_bits() << REGISTER_SHIFT
    }

    pub fn unpack(raw: u64) -> Result<Word, DecodeError> {
        if raw >> WORD_BITS != 0 {
            return Err(DecodeError::TooWide(raw));
        }
        let field = |shift: u32, bits: u32| (raw >> shift) & ((1 << bits) - 1);

        let code = field(OPCODE_SHIFT, crate::OPCODE_BITS) as u8;
        let opcode = Opcode::try_from(code).map_err(DecodeError::UnknownOpcode)?;
        Ok(Word {
            opcode,
            literal: field(LITERAL_SHIFT, LITERAL_BITS) as u16,
            address: field(ADDRESS_SHIFT, ADDRESS_BITS) as u8,
            // Zero is "no register", every other 3-bit value names one
            register: Register::from_number(field(REGISTER_SHIFT, REGISTER_BITS) as u8),
        })
    }

    /// Textual form used in compiled listings.
    pub fn to_bits(&self) -> String {
        format!("{:0width$b}", self.pack(), width = WORD_BITS as usize)
    }

    pub fn from_bits(bits: &str) -> Result<Word, DecodeError> {
        let bits = bits.trim();
        if bits.len() != WORD_BITS as usize || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(DecodeError::BadBitString);
        }
        let raw = u64::from_str_radix(bits, 2).map_err(|_| DecodeError::BadBitString)?;
        Word::unpack(raw)
    }
}

/// Disassembly, e.g. `PUSH #1F`, `POP @R2`, `JZ @3`.
impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match self.opcode {
            Opcode::Push | Opcode::Pop => match (self.literal, self.address, self.register) {
                (_, _, Some(reg)) if self.is_indirect() => write!(f, " @{reg}"),
                (0, 0, Some(reg)) => write!(f, " {reg}"),
                (lit, 0, None) if self.opcode == Opcode::Push => write!(f, " #{lit:X}"),
                (_, addr, _) => write!(f, " @{addr:X}"),
            },
            op if op.is_jump() => write!(f, " @{:X}", self.address),
            _ => Ok(()),
        }
    }
}
