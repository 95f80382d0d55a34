use std::fmt;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::compiler::Program;
use crate::lexer::Token;
use crate::span::Span;

// Lexer errors

/// No lexical pattern matched at some position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub found: char,
    pub span: Span,
    /// Tokens classified before the failure
    pub partial: Vec<Token>,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrong character '{}' at line {}",
            self.found.escape_default(),
            self.line
        )
    }
}

impl std::error::Error for LexError {}

impl LexError {
    pub fn report(&self, src: &str) -> Report {
        miette!(
            severity = Severity::Error,
            code = "lex::unknown",
            help = "literals start with #, addresses with @ and comments with ;",
            labels = vec![LabeledSpan::at(self.span, "unknown character")],
            "{}",
            self
        )
        .with_source_code(src.to_string())
    }
}

// Parser errors

/// Token sequence broke the grammar. Parsing stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    /// Source text of the offending token
    pub found: String,
    /// Categories that would have been accepted
    pub expected: Vec<String>,
    pub span: Span,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}: found '{}', but expected {}",
            self.line,
            self.found.escape_default(),
            self.expected.join(" or ")
        )
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn report(&self, src: &str) -> Report {
        miette!(
            severity = Severity::Error,
            code = "parse::unexpected_token",
            help = "check the operands allowed for this instruction",
            labels = vec![LabeledSpan::at(self.span, "unexpected token")],
            "{}",
            self
        )
        .with_source_code(src.to_string())
    }
}

// Compiler errors

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    UndefinedLabel {
        line: usize,
        label: String,
        span: Span,
    },
    DuplicateLabel {
        line: usize,
        label: String,
        span: Span,
    },
    LiteralOutOfRange {
        line: usize,
        value: String,
        span: Span,
    },
    AddressOutOfRange {
        line: usize,
        value: String,
        span: Span,
    },
    /// Jump targets must be fixed addresses
    IndirectJump {
        line: usize,
        span: Span,
    },
    ProgramTooLong {
        len: usize,
        max: usize,
    },
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UndefinedLabel { span, .. }
            | Self::DuplicateLabel { span, .. }
            | Self::LiteralOutOfRange { span, .. }
            | Self::AddressOutOfRange { span, .. }
            | Self::IndirectJump { span, .. } => Some(*span),
            Self::ProgramTooLong { .. } => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UndefinedLabel { .. } => "compile::undefined_label",
            Self::DuplicateLabel { .. } => "compile::duplicate_label",
            Self::LiteralOutOfRange { .. } => "compile::literal_range",
            Self::AddressOutOfRange { .. } => "compile::address_range",
            Self::IndirectJump { .. } => "compile::indirect_jump",
            Self::ProgramTooLong { .. } => "compile::too_long",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Self::UndefinedLabel { .. } => "labels are declared as `NAME:` on a line of their own",
            Self::DuplicateLabel { .. } => "each label may only be declared once per program",
            Self::LiteralOutOfRange { .. } => "literals range from #0 to #FFFF",
            Self::AddressOutOfRange { .. } => "addresses range from @0 to @FF",
            Self::IndirectJump { .. } => "jump to a label or a fixed @address instead",
            Self::ProgramTooLong { .. } => "split the program or move data above the code region",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::UndefinedLabel { .. } => "undefined label",
            Self::DuplicateLabel { .. } => "duplicate label",
            Self::LiteralOutOfRange { .. } => "literal does not fit in 16 bits",
            Self::AddressOutOfRange { .. } => "address does not fit in 8 bits",
            Self::IndirectJump { .. } => "register-indirect jump target",
            Self::ProgramTooLong { .. } => "program too long",
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedLabel { line, label, .. } => {
                write!(f, "Undefined label '{label}' at line {line}")
            }
            Self::DuplicateLabel { line, label, .. } => {
                write!(f, "Label '{label}' declared twice, again at line {line}")
            }
            Self::LiteralOutOfRange { line, value, .. } => {
                write!(f, "Literal #{value} out of range at line {line}")
            }
            Self::AddressOutOfRange { line, value, .. } => {
                write!(f, "Address @{value} out of range at line {line}")
            }
            Self::IndirectJump { line, .. } => {
                write!(f, "Jump through a register is not supported at line {line}")
            }
            Self::ProgramTooLong { len, max } => {
                write!(
                    f,
                    "Program has {len} instructions, but the code region holds {max}"
                )
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Every error found while encoding, plus whatever could still be encoded.
#[derive(Debug)]
pub struct CompileFailure {
    pub errors: Vec<CompileError>,
    pub partial: Program,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for CompileFailure {}

impl CompileFailure {
    pub fn report(&self, src: &str) -> Report {
        let labels = self
            .errors
            .iter()
            .filter_map(|err| err.span().map(|span| LabeledSpan::at(span, err.label())))
            .collect::<Vec<_>>();
        let code = self.errors.first().map_or("compile", CompileError::code);
        let help = match self.errors.as_slice() {
            [only] => only.help().to_string(),
            errors => format!("{} errors found while encoding", errors.len()),
        };
        miette!(
            severity = Severity::Error,
            code = code,
            help = help,
            labels = labels,
            "{}",
            self
        )
        .with_source_code(src.to_string())
    }
}

// Decode errors

/// Raw value is not a valid instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    UnknownOpcode(u8),
    TooWide(u64),
    BadBitString,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(code) => write!(f, "unknown opcode {code}"),
            Self::TooWide(raw) => write!(f, "value {raw:#x} is wider than an instruction word"),
            Self::BadBitString => write!(f, "expected a string of 35 binary digits"),
        }
    }
}

impl std::error::Error for DecodeError {}

pub fn decode_failed(line: usize, err: DecodeError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "decode::bad_word",
        help = "compiled listings hold one 35-digit bit string per line",
        "Invalid instruction word on line {line}: {err}",
    )
}
