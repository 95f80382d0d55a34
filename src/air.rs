use crate::lexer::{Token, TokenKind};
use crate::symbol::Opcode;

/// Assembly intermediate representation: the validated program, one entry per statement.
#[derive(Clone, Default, Debug)]
pub struct Air {
    lines: Vec<AirLine>,
}

impl Air {
    pub fn new() -> Self {
        Air { lines: Vec::new() }
    }

    pub fn add_line(&mut self, line: AirLine) {
        self.lines.push(line)
    }

    pub fn get(&self, idx: usize) -> &AirLine {
        &self.lines[idx]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AirLine> {
        self.lines.iter()
    }

    /// Statements that become instructions, i.e. everything except label declarations.
    pub fn instructions(&self) -> impl Iterator<Item = &AirLine> {
        self.lines.iter().filter(|line| !line.is_label())
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirLine;
    type IntoIter = std::slice::Iter<'a, AirLine>;
    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// A single statement: an operator with at most one operand, or a label declaration.
///
/// Line-break tokens are not stored.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AirLine {
    toks: Vec<Token>,
}

impl AirLine {
    /// Panics on an empty token list; the parser never flushes an empty line.
    pub fn new(toks: Vec<Token>) -> Self {
        assert!(!toks.is_empty(), "instruction lines must not be empty");
        AirLine { toks }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.toks
    }

    pub fn head(&self) -> &Token {
        &self.toks[0]
    }

    pub fn operand(&self) -> Option<&Token> {
        self.toks.get(1)
    }

    /// Source line of the statement.
    pub fn line(&self) -> usize {
        self.head().line
    }

    pub fn is_label(&self) -> bool {
        self.head().kind == TokenKind::Label
    }

    /// Declared label name, for label lines.
    pub fn label(&self) -> Option<&str> {
        self.is_label().then(|| self.head().val.as_str())
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self.head().kind {
            TokenKind::Op(op) => Some(op),
            _ => None,
        }
    }

    /// Source form, e.g. `PUSH #5` or `LOOP:`
    pub fn text(&self) -> String {
        if let Some(label) = self.label() {
            return format!("{label}:");
        }
        self.toks
            .iter()
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
