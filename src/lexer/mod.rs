use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::LexError;
use crate::lexer::cursor::Cursor;
use crate::span::{Idx, Span};
use crate::symbol::{Opcode, Register};

pub mod cursor;

/// A classified piece of source text.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    /// Lexeme with any leading sigil (`#`, `@`) removed
    pub val: String,
    /// 1-based line the token starts on
    pub line: usize,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Op(Opcode),
    Reg(Register),
    /// `#1F`, stored as `1F`
    Lit,
    /// `@1F` or `@R2`, stored as `1F` or `R2`
    Addr,
    Label,
    Colon,
    LineBreak,
}

impl Token {
    pub fn new(kind: TokenKind, val: impl Into<String>, line: usize, span: Span) -> Self {
        Token {
            kind,
            val: val.into(),
            line,
            span,
        }
    }

    /// Source form of the token, with its sigil restored.
    pub fn text(&self) -> String {
        match self.kind {
            TokenKind::Lit => format!("#{}", self.val),
            TokenKind::Addr => format!("@{}", self.val),
            TokenKind::LineBreak => "new line".to_string(),
            _ => self.val.clone(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Op(op) => write!(f, "{op}"),
            TokenKind::Reg(_) => f.write_str("REGISTER"),
            TokenKind::Lit => f.write_str("LITERAL"),
            TokenKind::Addr => f.write_str("ADDRESS"),
            TokenKind::Label => f.write_str("LABEL"),
            TokenKind::Colon => f.write_str("COLON"),
            TokenKind::LineBreak => f.write_str("LINE-BREAK"),
        }
    }
}

/// What a matched pattern produces.
#[derive(Clone, Copy, Debug)]
enum Pattern {
    Skip,
    LineBreak,
    Op(Opcode),
    Reg,
    Lit,
    Addr,
    Colon,
    Label,
}

lazy_static! {
    /// Tried in order; the first pattern matching at the cursor wins.
    /// Mnemonics come before the generic label pattern.
    static ref PATTERNS: Vec<(Regex, Pattern)> = {
        let mut patterns = vec![
            (r"^[ \t\r]+", Pattern::Skip),
            (r"^;[^\n]*", Pattern::Skip),
            (r"^\n(?:[ \t\r]*(?:;[^\n]*)?\n)*", Pattern::LineBreak),
        ]
        .into_iter()
        .map(|(re, pat)| (Regex::new(re).unwrap(), pat))
        .collect::<Vec<_>>();

        for op in Opcode::ALL {
            let re = Regex::new(&format!(r"^{}\b", op.mnemonic())).unwrap();
            patterns.push((re, Pattern::Op(op)));
        }

        patterns.extend(
            [
                (r"^R[1-7]\b", Pattern::Reg),
                (r"^#[0-9A-F]+\b", Pattern::Lit),
                (r"^@(?:R[1-7]|[0-9A-F]+)\b", Pattern::Addr),
                (r"^:", Pattern::Colon),
                (r"^[A-Za-z_][A-Za-z0-9_]*", Pattern::Label),
            ]
            .into_iter()
            .map(|(re, pat)| (Regex::new(re).unwrap(), pat)),
        );
        patterns
    };
}

/// Mnemonics are matched in uppercase only; front ends pass source through this first.
pub fn normalize(src: &str) -> String {
    src.to_ascii_uppercase()
}

/// Classify the whole source in one pass.
///
/// Every statement in the result is terminated by a line break, even when the source does not
/// end with one.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut cur = Cursor::new(src);
    let mut toks: Vec<Token> = Vec::new();

    while !cur.is_eof() {
        let line = cur.line();
        let start = cur.curr_pt();
        let rest = cur.at_curr_pt();

        let Some((len, pattern)) = PATTERNS
            .iter()
            .find_map(|(re, pat)| re.find(rest).map(|m| (m.end(), *pat)))
        else {
            // Unwrap is fine, the cursor is not at eof
            let found = cur.first().unwrap();
            return Err(LexError {
                line,
                found,
                span: Span::new(Idx(start as u32), found.len_utf8() as u32),
                partial: toks,
            });
        };

        let lexeme = &rest[..len];
        let span = Span::new(Idx(start as u32), len as u32);
        let token = match pattern {
            Pattern::Skip => None,
            Pattern::LineBreak => Some(Token::new(TokenKind::LineBreak, "\n", line, span)),
            Pattern::Op(op) => Some(Token::new(TokenKind::Op(op), lexeme, line, span)),
            Pattern::Reg => {
                // Regex guarantees a valid register
                let reg = lexeme.parse().unwrap();
                Some(Token::new(TokenKind::Reg(reg), lexeme, line, span))
            }
            Pattern::Lit => Some(Token::new(TokenKind::Lit, &lexeme[1..], line, span)),
            Pattern::Addr => Some(Token::new(TokenKind::Addr, &lexeme[1..], line, span)),
            Pattern::Colon => Some(Token::new(TokenKind::Colon, lexeme, line, span)),
            Pattern::Label => Some(Token::new(TokenKind::Label, lexeme, line, span)),
        };
        toks.extend(token);
        cur.advance(len);
    }

    if let Some(last) = toks.last() {
        if last.kind != TokenKind::LineBreak {
            let line = cur.line();
            toks.push(Token::new(
                TokenKind::LineBreak,
                "\n",
                line,
                Span::empty_at(src.len()),
            ));
        }
    }

    log::debug!("lexed {} tokens over {} lines", toks.len(), cur.line());
    Ok(toks)
}
