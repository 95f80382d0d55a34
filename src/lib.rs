// Assembling
pub mod lexer;
mod parser;
pub use parser::AsmParser;
mod air;
pub use air::{Air, AirLine};
mod compiler;
pub use compiler::{compile, Program};
mod word;
pub use word::Word;

// Running
mod runtime;
pub use runtime::{Fault, Flags, RunEnvironment, RunState};
mod output;
pub use output::Output;

mod symbol;
pub use symbol::{Flag, LabelTable, OpFamily, Opcode, Register};

pub mod error;
mod span;
pub use span::Span;

pub mod env;

/// Value held by registers, stack slots and memory cells.
pub type Value = i64;

pub const OPCODE_BITS: u32 = 8;
pub const LITERAL_BITS: u32 = 16;
pub const ADDRESS_BITS: u32 = 8;
pub const REGISTER_BITS: u32 = 3;
pub const WORD_BITS: u32 = OPCODE_BITS + LITERAL_BITS + ADDRESS_BITS + REGISTER_BITS;

/// Numeric operands in source text are hexadecimal.
pub const INPUT_RADIX: u32 = 16;

pub const MEMORY_SIZE: usize = 1 << ADDRESS_BITS;
/// Share of memory reserved for code, as a divisor.
pub const MEMORY_RATIO: usize = 4;
/// First data address; code lives below it.
pub const DATA_START: usize = MEMORY_SIZE / MEMORY_RATIO;

pub const REGISTER_COUNT: usize = (1 << REGISTER_BITS) - 1;
/// Address field value marking register-indirect access.
pub const INDIRECT_ADDRESS: u8 = u8::MAX;
pub const DEFAULT_STACK_SIZE: usize = 16;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;

/// Run the whole front half of the pipeline: lex, parse, then encode.
///
/// `src` should already be uppercase, see [`lexer::normalize`]. Every failure comes back as a
/// diagnostic pointing into `src`.
pub fn assemble(src: &str) -> miette::Result<Program> {
    let toks = lexer::tokenize(src).map_err(|err| err.report(src))?;
    let air = AsmParser::new(toks).parse().map_err(|err| err.report(src))?;
    compile(&air).map_err(|err| err.report(src))
}
