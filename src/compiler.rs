use crate::air::{Air, AirLine};
use crate::error::{CompileError, CompileFailure};
use crate::lexer::{Token, TokenKind};
use crate::symbol::{LabelTable, Register};
use crate::word::Word;
use crate::{DATA_START, INPUT_RADIX};

/// Encoded program, ready to be loaded into memory.
#[derive(Clone, Default, Debug)]
pub struct Program {
    words: Vec<Word>,
    labels: LabelTable,
    /// Source form of each instruction, labels folded in front. Trailing labels get a line of
    /// their own after the last instruction.
    listing: Vec<String>,
}

impl Program {
    /// Program without source information, e.g. read back from a compiled listing.
    pub fn from_words(words: Vec<Word>) -> Self {
        let listing = words.iter().map(ToString::to_string).collect();
        Program {
            words,
            labels: LabelTable::new(),
            listing,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn listing(&self) -> &[String] {
        &self.listing
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// One 35-digit bit string per line.
    pub fn to_bits(&self) -> String {
        self.words
            .iter()
            .map(|word| word.to_bits() + "\n")
            .collect()
    }
}

/// Resolve labels and encode every instruction line.
///
/// Encoding is best-effort: a bad operand is reported but later lines are still encoded, and
/// the partial program is returned alongside every error.
pub fn compile(air: &Air) -> Result<Program, CompileFailure> {
    let mut errors = Vec::new();
    let labels = collect_labels(air, &mut errors);

    let mut words = Vec::new();
    let mut listing = Vec::new();
    let mut pending_labels: Vec<String> = Vec::new();
    for line in air {
        if let Some(label) = line.label() {
            pending_labels.push(format!("{label}:"));
            continue;
        }
        words.push(encode_line(line, &labels, &mut errors));
        pending_labels.push(line.text());
        listing.push(pending_labels.join(" "));
        pending_labels.clear();
    }
    // Labels after the last instruction name the address PC halts at
    if !pending_labels.is_empty() {
        listing.push(pending_labels.join(" "));
    }

    if words.len() > DATA_START {
        errors.push(CompileError::ProgramTooLong {
            len: words.len(),
            max: DATA_START,
        });
    }

    log::debug!(
        "compiled {} words, {} labels: {:?}",
        words.len(),
        labels.len(),
        labels.iter().collect::<Vec<_>>()
    );

    let program = Program {
        words,
        labels,
        listing,
    };
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(CompileFailure {
            errors,
            partial: program,
        })
    }
}

/// First pass. A label names the address of the next real instruction.
fn collect_labels(air: &Air, errors: &mut Vec<CompileError>) -> LabelTable {
    let mut labels = LabelTable::new();
    let mut addr: usize = 0;
    for line in air {
        match line.label() {
            Some(name) => {
                if labels.get(name).is_some() {
                    errors.push(CompileError::DuplicateLabel {
                        line: line.line(),
                        label: name.to_string(),
                        span: line.head().span,
                    });
                    continue;
                }
                // Addresses past the address field are reported as a too-long program
                labels.insert(name, addr.min(u8::MAX as usize) as u8);
            }
            None => addr += 1,
        }
    }
    labels
}

/// Second pass, for a single non-label line.
fn encode_line(line: &AirLine, labels: &LabelTable, errors: &mut Vec<CompileError>) -> Word {
    // Parser guarantees that non-label lines start with an operator
    let Some(opcode) = line.opcode() else {
        unreachable!("label lines are skipped before encoding")
    };
    let Some(operand) = line.operand() else {
        return Word::bare(opcode);
    };

    if opcode.is_jump() {
        let address = match operand.kind {
            TokenKind::Label => labels.get(&operand.val).unwrap_or_else(|| {
                errors.push(CompileError::UndefinedLabel {
                    line: operand.line,
                    label: operand.val.clone(),
                    span: operand.span,
                });
                0
            }),
            _ if indirect_register(operand).is_some() => {
                errors.push(CompileError::IndirectJump {
                    line: operand.line,
                    span: operand.span,
                });
                0
            }
            _ => parse_address(operand, errors),
        };
        return Word::with_address(opcode, address);
    }

    match operand.kind {
        TokenKind::Lit => {
            let literal = u16::from_str_radix(&operand.val, INPUT_RADIX).unwrap_or_else(|_| {
                errors.push(CompileError::LiteralOutOfRange {
                    line: operand.line,
                    value: operand.val.clone(),
                    span: operand.span,
                });
                0
            });
            Word::with_literal(opcode, literal)
        }
        TokenKind::Addr => match indirect_register(operand) {
            Some(reg) => Word::with_indirect(opcode, reg),
            None => Word::with_address(opcode, parse_address(operand, errors)),
        },
        TokenKind::Reg(reg) => Word::with_register(opcode, reg),
        TokenKind::Op(_) | TokenKind::Label | TokenKind::Colon | TokenKind::LineBreak => {
            unreachable!("parser only accepts literal, address or register operands here")
        }
    }
}

/// Register named by an `@Rn` operand.
fn indirect_register(operand: &Token) -> Option<Register> {
    match operand.kind {
        TokenKind::Addr => operand.val.parse().ok(),
        _ => None,
    }
}

fn parse_address(operand: &Token, errors: &mut Vec<CompileError>) -> u8 {
    u8::from_str_radix(&operand.val, INPUT_RADIX).unwrap_or_else(|_| {
        errors.push(CompileError::AddressOutOfRange {
            line: operand.line,
            value: operand.val.clone(),
            span: operand.span,
        });
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::AsmParser;
    use crate::symbol::Opcode;

    fn compile_src(src: &str) -> Result<Program, CompileFailure> {
        let air = AsmParser::new(tokenize(src).unwrap()).parse().unwrap();
        compile(&air)
    }

    #[test]
    fn encodes_operands() {
        let program = compile_src("PUSH #1F\nPUSH @40\nPUSH R2\nPOP @R3\nADD\n").unwrap();
        assert_eq!(
            program.words(),
            &[
                Word::with_literal(Opcode::Push, 0x1F),
                Word::with_address(Opcode::Push, 0x40),
                Word::with_register(Opcode::Push, Register::R2),
                Word::with_indirect(Opcode::Pop, Register::R3),
                Word::bare(Opcode::Add),
            ]
        );
    }

    #[test]
    fn scenario_a_bits() {
        let program = compile_src("PUSH #5\nPUSH #3\nADD\n").unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(
            program.to_bits(),
            "00000101000000000000010100000000000\n\
             00000101000000000000001100000000000\n\
             00000001000000000000000000000000000\n"
        );
    }

    #[test]
    fn forward_and_stacked_labels() {
        let program = compile_src("JMP END\nNOPE\nA:\nB:\nNOPE\nEND:\nNJZ A\n").unwrap();
        assert_eq!(program.labels().get("A"), Some(2));
        assert_eq!(program.labels().get("B"), Some(2));
        assert_eq!(program.labels().get("END"), Some(3));
        assert_eq!(program.words()[0], Word::with_address(Opcode::Jmp, 3));
        assert_eq!(program.words()[3], Word::with_address(Opcode::Njz, 2));
    }

    #[test]
    fn jump_to_fixed_address() {
        let program = compile_src("JC @1A\nJMP @10\n").unwrap();
        assert_eq!(program.words()[0], Word::with_address(Opcode::Jc, 0x1A));
        // Fixed targets are hexadecimal like every other operand
        assert_eq!(program.words()[1], Word::with_address(Opcode::Jmp, 0x10));
    }

    #[test]
    fn listing_folds_labels() {
        let program = compile_src("START:\nPUSH #0\nJZ START\n").unwrap();
        assert_eq!(program.listing(), &["START: PUSH #0", "JZ START"]);

        let program = compile_src("NOPE\nEND:\nDONE:\n").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program.listing(), &["NOPE", "END: DONE:"]);
    }

    #[test]
    fn undefined_label_is_best_effort() {
        let failure = compile_src("JMP NOWHERE\nPUSH #2\nJZ ALSO_MISSING\n").unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        assert_eq!(
            failure.errors[0],
            CompileError::UndefinedLabel {
                line: 1,
                label: "NOWHERE".to_string(),
                span: failure.errors[0].span().unwrap(),
            }
        );
        assert!(failure.to_string().contains("ALSO_MISSING"));
        assert_eq!(failure.partial.len(), 3);
        assert_eq!(
            failure.partial.words()[1],
            Word::with_literal(Opcode::Push, 2)
        );
    }

    #[test]
    fn operand_ranges() {
        let failure = compile_src("PUSH #10000\nPOP @100\nPUSH #FFFF\n").unwrap_err();
        assert!(matches!(
            failure.errors[0],
            CompileError::LiteralOutOfRange { line: 1, .. }
        ));
        assert!(matches!(
            failure.errors[1],
            CompileError::AddressOutOfRange { line: 2, .. }
        ));
        assert_eq!(failure.errors.len(), 2);
    }

    #[test]
    fn indirect_jump_rejected() {
        let failure = compile_src("JMP @R1\n").unwrap_err();
        assert!(matches!(
            failure.errors[0],
            CompileError::IndirectJump { line: 1, .. }
        ));
    }

    #[test]
    fn duplicate_label() {
        let failure = compile_src("A:\nNOPE\nA:\nNOPE\n").unwrap_err();
        assert!(matches!(
            failure.errors[0],
            CompileError::DuplicateLabel { line: 3, .. }
        ));
        assert_eq!(failure.partial.labels().get("A"), Some(0));
    }

    #[test]
    fn too_long() {
        let src = "NOPE\n".repeat(DATA_START + 1);
        let failure = compile_src(&src).unwrap_err();
        assert_eq!(
            failure.errors,
            vec![CompileError::ProgramTooLong {
                len: DATA_START + 1,
                max: DATA_START
            }]
        );
        assert!(compile_src(&"NOPE\n".repeat(DATA_START)).is_ok());
    }
}
