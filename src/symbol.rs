use std::fmt;
use std::str::FromStr;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Every operation the machine understands, with its numeric code.
///
/// Codes are part of the binary format and must never be reordered.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Add = 1,
    Sub = 2,
    Inc = 3,
    Dec = 4,
    Push = 5,
    Pop = 6,
    Cmp = 7,
    Not = 8,
    Or = 9,
    And = 10,
    Xor = 11,
    Nor = 12,
    Shl = 13,
    Shr = 14,
    Jmp = 15,
    Jc = 16,
    Jz = 17,
    Jp = 18,
    Js = 19,
    Jo = 20,
    Njc = 21,
    Njz = 22,
    Njp = 23,
    Njs = 24,
    Njo = 25,
    Nope = 26,
    Mul = 27,
    Adc = 28,
}

/// Grammar families, used by the parser to pick a production.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpFamily {
    /// `PUSH`, `POP`, `NOPE`
    Common,
    Arithmetic,
    Logical,
    Jump,
}

impl Opcode {
    pub const ALL: [Opcode; 28] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Cmp,
        Opcode::Not,
        Opcode::Or,
        Opcode::And,
        Opcode::Xor,
        Opcode::Nor,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Jmp,
        Opcode::Jc,
        Opcode::Jz,
        Opcode::Jp,
        Opcode::Js,
        Opcode::Jo,
        Opcode::Njc,
        Opcode::Njz,
        Opcode::Njp,
        Opcode::Njs,
        Opcode::Njo,
        Opcode::Nope,
        Opcode::Mul,
        Opcode::Adc,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Cmp => "CMP",
            Opcode::Not => "NOT",
            Opcode::Or => "OR",
            Opcode::And => "AND",
            Opcode::Xor => "XOR",
            Opcode::Nor => "NOR",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Jmp => "JMP",
            Opcode::Jc => "JC",
            Opcode::Jz => "JZ",
            Opcode::Jp => "JP",
            Opcode::Js => "JS",
            Opcode::Jo => "JO",
            Opcode::Njc => "NJC",
            Opcode::Njz => "NJZ",
            Opcode::Njp => "NJP",
            Opcode::Njs => "NJS",
            Opcode::Njo => "NJO",
            Opcode::Nope => "NOPE",
            Opcode::Mul => "MUL",
            Opcode::Adc => "ADC",
        }
    }

    pub fn family(self) -> OpFamily {
        use Opcode::*;
        match self {
            Push | Pop | Nope => OpFamily::Common,
            Add | Sub | Inc | Dec | Mul | Adc => OpFamily::Arithmetic,
            Cmp | Not | Or | And | Xor | Nor | Shl | Shr => OpFamily::Logical,
            Jmp | Jc | Jz | Jp | Js | Jo | Njc | Njz | Njp | Njs | Njo => OpFamily::Jump,
        }
    }

    pub fn is_jump(self) -> bool {
        self.family() == OpFamily::Jump
    }

    /// Flag tested by a conditional jump, and whether the test is negated.
    pub fn condition(self) -> Option<(Flag, bool)> {
        match self {
            Opcode::Jc => Some((Flag::Carry, false)),
            Opcode::Jz => Some((Flag::Zero, false)),
            Opcode::Jp => Some((Flag::Parity, false)),
            Opcode::Js => Some((Flag::Sign, false)),
            Opcode::Jo => Some((Flag::Overflow, false)),
            Opcode::Njc => Some((Flag::Carry, true)),
            Opcode::Njz => Some((Flag::Zero, true)),
            Opcode::Njp => Some((Flag::Parity, true)),
            Opcode::Njs => Some((Flag::Sign, true)),
            Opcode::Njo => Some((Flag::Overflow, true)),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.code() == code)
            .ok_or(code)
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == s)
            .ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// General purpose registers. Number 0 is reserved for "no register" in the binary format.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    R1 = 1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub const ALL: [Register; 7] = [
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Index into the register file.
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_number(num: u8) -> Option<Register> {
        match num {
            1 => Some(Register::R1),
            2 => Some(Register::R2),
            3 => Some(Register::R3),
            4 => Some(Register::R4),
            5 => Some(Register::R5),
            6 => Some(Register::R6),
            7 => Some(Register::R7),
            _ => None,
        }
    }
}

impl FromStr for Register {
    type Err = ();

    /// Accepts `R1`..`R7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.strip_prefix('R').ok_or(())?;
        let num = num.parse::<u8>().map_err(|_| ())?;
        Register::from_number(num).ok_or(())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.number())
    }
}

/// Condition flags, recomputed from every arithmetic, logical or shift result.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Flag {
    Zero,
    Sign,
    Parity,
    Carry,
    Overflow,
}

impl Flag {
    pub const ALL: [Flag; 5] = [
        Flag::Zero,
        Flag::Sign,
        Flag::Parity,
        Flag::Carry,
        Flag::Overflow,
    ];

    pub fn letter(self) -> char {
        match self {
            Flag::Zero => 'Z',
            Flag::Sign => 'S',
            Flag::Parity => 'P',
            Flag::Carry => 'C',
            Flag::Overflow => 'O',
        }
    }
}

/// Label name -> instruction address, in declaration order.
#[derive(Clone, Default, Debug)]
pub struct LabelTable {
    table: FxMap<String, u8>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable {
            table: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Bind a label. Returns the previous address if the label was already declared.
    pub fn insert(&mut self, name: &str, addr: u8) -> Option<u8> {
        self.table.insert(name.to_string(), addr)
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.table.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Labels bound to `addr`, in declaration order
    pub fn at(&self, addr: u8) -> impl Iterator<Item = &str> {
        self.table
            .iter()
            .filter(move |(_, a)| **a == addr)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.table.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}
