use crate::{
    air::{Air, AirLine},
    error::ParseError,
    lexer::{Token, TokenKind},
    span::Span,
    symbol::{OpFamily, Opcode},
};

/// Validates a token stream against the grammar and groups it into instruction lines.
///
/// ```text
/// program    -> statement*
/// statement  -> LINE-BREAK | common | arithmetic | logical | jump | label
/// common     -> (pop | push | 'NOPE') LINE-BREAK
/// arithmetic -> arith-op LINE-BREAK
/// logical    -> (bitwise-op | compare-op | shift-op) LINE-BREAK
/// jump       -> jump-op (ADDRESS | LABEL) LINE-BREAK
/// label      -> LABEL COLON LINE-BREAK
/// pop        -> 'POP' (ADDRESS | REGISTER)
/// push       -> 'PUSH' (ADDRESS | LITERAL | REGISTER)
/// ```
///
/// Stops at the first violation; there is no error recovery.
pub struct AsmParser {
    toks: Vec<Token>,
    /// Index of the current token
    pos: usize,
    /// Tokens of the statement being read
    pending: Vec<Token>,
    air: Air,
}

type Result<T> = std::result::Result<T, ParseError>;

impl AsmParser {
    pub fn new(toks: Vec<Token>) -> Self {
        AsmParser {
            toks,
            pos: 0,
            pending: Vec::new(),
            air: Air::new(),
        }
    }

    /// Create AIR out of token stream
    pub fn parse(mut self) -> Result<Air> {
        while self.pos < self.toks.len() {
            if !self.statement()? {
                return Err(self.unexpected(&["LINE-BREAK", "mnemonic", "LABEL"]));
            }
        }
        log::debug!("parsed {} instruction lines", self.air.len());
        Ok(self.air)
    }

    fn statement(&mut self) -> Result<bool> {
        Ok(self.eat(|kind| kind == TokenKind::LineBreak)
            || self.common()?
            || self.arithmetic()?
            || self.logical()?
            || self.jump()?
            || self.label()?)
    }

    fn common(&mut self) -> Result<bool> {
        if !(self.pop()? || self.push()? || self.eat_op(|op| op == Opcode::Nope)) {
            return Ok(false);
        }
        self.expect_line_break()?;
        Ok(true)
    }

    fn arithmetic(&mut self) -> Result<bool> {
        if !self.eat_op(|op| op.family() == OpFamily::Arithmetic) {
            return Ok(false);
        }
        self.expect_line_break()?;
        Ok(true)
    }

    fn logical(&mut self) -> Result<bool> {
        if !self.eat_op(|op| op.family() == OpFamily::Logical) {
            return Ok(false);
        }
        self.expect_line_break()?;
        Ok(true)
    }

    fn jump(&mut self) -> Result<bool> {
        if !self.eat_op(Opcode::is_jump) {
            return Ok(false);
        }
        if !self.eat(|kind| matches!(kind, TokenKind::Addr | TokenKind::Label)) {
            return Err(self.unexpected(&["ADDRESS", "LABEL"]));
        }
        self.expect_line_break()?;
        Ok(true)
    }

    fn label(&mut self) -> Result<bool> {
        if !self.eat(|kind| kind == TokenKind::Label) {
            return Ok(false);
        }
        if !self.eat(|kind| kind == TokenKind::Colon) {
            return Err(self.unexpected(&["COLON"]));
        }
        self.expect_line_break()?;
        Ok(true)
    }

    fn pop(&mut self) -> Result<bool> {
        if !self.eat_op(|op| op == Opcode::Pop) {
            return Ok(false);
        }
        if !self.eat(|kind| matches!(kind, TokenKind::Addr | TokenKind::Reg(_))) {
            return Err(self.unexpected(&["ADDRESS", "REGISTER"]));
        }
        Ok(true)
    }

    fn push(&mut self) -> Result<bool> {
        if !self.eat_op(|op| op == Opcode::Push) {
            return Ok(false);
        }
        if !self.eat(|kind| matches!(kind, TokenKind::Addr | TokenKind::Lit | TokenKind::Reg(_))) {
            return Err(self.unexpected(&["ADDRESS", "LITERAL", "REGISTER"]));
        }
        Ok(true)
    }

    fn expect_line_break(&mut self) -> Result<()> {
        if self.eat(|kind| kind == TokenKind::LineBreak) {
            Ok(())
        } else {
            Err(self.unexpected(&["LINE-BREAK"]))
        }
    }

    fn eat_op(&mut self, check: impl FnOnce(Opcode) -> bool) -> bool {
        self.eat(|kind| matches!(kind, TokenKind::Op(op) if check(op)))
    }

    /// Consume the current token if it satisfies `check`.
    ///
    /// A consumed line break closes the pending statement.
    fn eat(&mut self, check: impl FnOnce(TokenKind) -> bool) -> bool {
        match self.toks.get(self.pos) {
            Some(tok) if check(tok.kind) => {
                if tok.kind == TokenKind::LineBreak {
                    if !self.pending.is_empty() {
                        let toks = std::mem::take(&mut self.pending);
                        self.air.add_line(AirLine::new(toks));
                    }
                } else {
                    self.pending.push(tok.clone());
                }
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        let expected = expected.iter().map(|e| e.to_string()).collect();
        match self.toks.get(self.pos) {
            Some(tok) => ParseError {
                line: tok.line,
                found: tok.text(),
                expected,
                span: tok.span,
            },
            None => {
                let (line, span) = match self.toks.last() {
                    Some(last) => (last.line, Span::empty_at(last.span.as_range().end)),
                    None => (1, Span::empty_at(0)),
                };
                ParseError {
                    line,
                    found: "end of input".to_string(),
                    expected,
                    span,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AsmParser;
    use crate::{
        air::Air,
        error::ParseError,
        lexer::{tokenize, TokenKind},
        symbol::{Opcode, Register},
    };

    fn parse(src: &str) -> Result<Air, ParseError> {
        AsmParser::new(tokenize(src).unwrap()).parse()
    }

    #[test]
    fn groups_lines() {
        let air = parse("PUSH #5\nPUSH R1\n\n\nADD\nPOP @10\n").unwrap();
        assert_eq!(air.len(), 4);
        assert_eq!(air.get(0).opcode(), Some(Opcode::Push));
        assert_eq!(air.get(0).operand().unwrap().val, "5");
        assert_eq!(
            air.get(1).operand().unwrap().kind,
            TokenKind::Reg(Register::R1)
        );
        assert_eq!(air.get(2).tokens().len(), 1);
        assert_eq!(air.get(3).text(), "POP @10");
    }

    #[test]
    fn label_lines() {
        let air = parse("START:\nLOOP:\nNOPE\nJMP LOOP\n").unwrap();
        assert_eq!(air.len(), 4);
        assert_eq!(air.get(0).label(), Some("START"));
        assert_eq!(air.get(1).label(), Some("LOOP"));
        assert!(!air.get(2).is_label());
        assert_eq!(air.get(3).operand().unwrap().kind, TokenKind::Label);
        assert_eq!(air.instructions().count(), 2);
    }

    #[test]
    fn every_family() {
        let src = "INC\nDEC\nSUB\nMUL\nADC\nAND\nOR\nXOR\nNOR\nNOT\nCMP\nSHL\nSHR\n\
                   JC @1\nJZ @1\nJP @1\nJS @1\nJO @1\nNJC @1\nNJZ @1\nNJP @1\nNJS @1\nNJO @1\n";
        assert_eq!(parse(src).unwrap().len(), 23);
    }

    #[test]
    fn push_without_operand() {
        let err = parse("PUSH #1\nPUSH\nADD\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.found, "new line");
        assert_eq!(err.expected, vec!["ADDRESS", "LITERAL", "REGISTER"]);
    }

    #[test]
    fn pop_rejects_literal() {
        let err = parse("POP #3\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.found, "#3");
        assert_eq!(err.expected, vec!["ADDRESS", "REGISTER"]);
    }

    #[test]
    fn operand_on_nullary_op() {
        let err = parse("NOPE\nADD R1\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.found, "R1");
        assert_eq!(err.expected, vec!["LINE-BREAK"]);
    }

    #[test]
    fn jump_needs_target() {
        let err = parse("JMP #4\n").unwrap_err();
        assert_eq!(err.expected, vec!["ADDRESS", "LABEL"]);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn label_needs_colon() {
        let err = parse("NOPE\n\nLOOP\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.expected, vec!["COLON"]);
    }

    #[test]
    fn stray_operand_starts_statement() {
        let err = parse("#4\n").unwrap_err();
        assert_eq!(err.found, "#4");
        assert_eq!(err.expected.len(), 3);
    }

    #[test]
    fn empty_program() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n; nothing here\n").unwrap().is_empty());
    }
}
