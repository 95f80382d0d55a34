use std::fmt;

use miette::Result;

use crate::compiler::Program;
use crate::error::{self, DecodeError};
use crate::symbol::{Flag, Opcode};
use crate::word::Word;
use crate::{Value, DEFAULT_STACK_SIZE, LITERAL_BITS, MEMORY_SIZE, REGISTER_COUNT};

/// Condition flags.
///
/// These are range tests on the raw result, not a model of carry circuitry.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct Flags {
    pub zero: bool,
    pub sign: bool,
    pub parity: bool,
    pub carry: bool,
    pub overflow: bool,
}

impl Flags {
    /// Flags for a result, taken before any truncation.
    pub fn from_result(res: Value) -> Flags {
        let half = 1 << LITERAL_BITS;
        Flags {
            zero: res == 0,
            sign: res < 0,
            parity: res % 2 == 0,
            carry: (half..half << 1).contains(&res),
            overflow: res >= half,
        }
    }

    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Zero => self.zero,
            Flag::Sign => self.sign,
            Flag::Parity => self.parity,
            Flag::Carry => self.carry,
            Flag::Overflow => self.overflow,
        }
    }

    fn get_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Zero => &mut self.zero,
            Flag::Sign => &mut self.sign,
            Flag::Parity => &mut self.parity,
            Flag::Carry => &mut self.carry,
            Flag::Overflow => &mut self.overflow,
        }
    }

    fn toggle(&mut self, flag: Flag) {
        let value = self.get_mut(flag);
        *value = !*value;
    }
}

/// Why execution stopped before PC ran off the end of the program.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    StackOverflow { pc: usize },
    StackUnderflow { pc: usize },
    MemoryOutOfRange { pc: usize, addr: Value },
    BadInstruction { pc: usize, err: DecodeError },
    /// Operand fields combine in a way no addressing mode uses
    BadOperands { pc: usize },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow { pc } => write!(f, "stack overflow at PC {pc}"),
            Self::StackUnderflow { pc } => write!(f, "pop from empty stack at PC {pc}"),
            Self::MemoryOutOfRange { pc, addr } => {
                write!(f, "memory address {addr} out of range at PC {pc}")
            }
            Self::BadInstruction { pc, err } => write!(f, "bad instruction at PC {pc}: {err}"),
            Self::BadOperands { pc } => write!(f, "malformed operand fields at PC {pc}"),
        }
    }
}

/// Represents complete machine state during runtime.
#[derive(Clone)]
pub struct RunState {
    /// Code in the low addresses, data above it
    mem: Box<[Value; MEMORY_SIZE]>,
    /// Amount of words loaded at address 0
    program_len: usize,
    /// Program counter
    pc: usize,
    /// Stack pointer, one past the top value
    sp: usize,
    /// R1..R7
    reg: [Value; REGISTER_COUNT],
    flags: Flags,
    stack: Vec<Value>,
    fault: Option<Fault>,
}

type Step = std::result::Result<(), Fault>;

impl RunState {
    pub fn new(program: &Program, stack_size: usize) -> RunState {
        let mut mem = Box::new([0; MEMORY_SIZE]);
        for (slot, word) in mem.iter_mut().zip(program.words()) {
            *slot = word.pack() as Value;
        }
        RunState {
            mem,
            program_len: program.len().min(MEMORY_SIZE),
            pc: 0,
            sp: 0,
            reg: [0; REGISTER_COUNT],
            flags: Flags::default(),
            stack: vec![0; stack_size],
            fault: None,
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn reg(&self) -> &[Value; REGISTER_COUNT] {
        &self.reg
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Every stack slot, including the zeroed ones above SP.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn mem(&self) -> &[Value; MEMORY_SIZE] {
        &self.mem
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn is_halted(&self) -> bool {
        self.pc >= self.program_len || self.fault.is_some()
    }

    /// Fetch, decode and execute the instruction at PC. Does nothing once halted.
    pub fn step(&mut self) {
        if self.is_halted() {
            return;
        }
        let result = self.fetch().and_then(|word| {
            log::trace!("PC {:>3}  {:<10} sp={} {:?}", self.pc, word, self.sp, self.flags);
            self.execute(word)
        });
        if let Err(fault) = result {
            log::warn!("execution stopped: {fault}");
            self.fault = Some(fault);
        }
    }

    /// Step until halted. A program that loops forever never returns.
    pub fn run(&mut self) {
        while !self.is_halted() {
            self.step();
        }
        log::debug!("halted at PC {}", self.pc);
    }

    fn fetch(&self) -> std::result::Result<Word, Fault> {
        let raw = self.mem[self.pc];
        let raw = u64::try_from(raw).map_err(|_| DecodeError::TooWide(raw as u64));
        raw.and_then(Word::unpack)
            .map_err(|err| Fault::BadInstruction { pc: self.pc, err })
    }

    fn execute(&mut self, word: Word) -> Step {
        let addr = word.address as usize;
        match word.opcode {
            Opcode::Add => self.add(),
            Opcode::Sub => self.sub(),
            Opcode::Inc => self.inc(),
            Opcode::Dec => self.dec(),
            Opcode::Mul => self.mul(),
            Opcode::Adc => self.adc(),
            Opcode::Push => self.push(word),
            Opcode::Pop => self.pop(word),
            Opcode::Cmp => self.cmp(),
            Opcode::Not => self.unary(|op| !op),
            Opcode::Shl => self.unary(|op| op << 1),
            Opcode::Shr => self.unary(|op| op >> 1),
            Opcode::Or => self.binary(|a, b| a | b),
            Opcode::And => self.binary(|a, b| a & b),
            Opcode::Xor => self.binary(|a, b| a ^ b),
            Opcode::Nor => self.binary(|a, b| !(a | b)),
            Opcode::Jmp => {
                self.pc = addr;
                Ok(())
            }
            Opcode::Jc => self.jump_if(Flag::Carry, addr),
            Opcode::Jz => self.jump_if(Flag::Zero, addr),
            Opcode::Jp => self.jump_if(Flag::Parity, addr),
            Opcode::Js => self.jump_if(Flag::Sign, addr),
            Opcode::Jo => self.jump_if(Flag::Overflow, addr),
            Opcode::Njc => self.jump_unless(Flag::Carry, addr),
            Opcode::Njz => self.jump_unless(Flag::Zero, addr),
            Opcode::Njp => self.jump_unless(Flag::Parity, addr),
            Opcode::Njs => self.jump_unless(Flag::Sign, addr),
            Opcode::Njo => self.jump_unless(Flag::Overflow, addr),
            Opcode::Nope => {
                self.pc += 1;
                Ok(())
            }
        }
    }

    fn push_val(&mut self, val: Value) -> Step {
        let pc = self.pc;
        let slot = self
            .stack
            .get_mut(self.sp)
            .ok_or(Fault::StackOverflow { pc })?;
        *slot = val;
        self.sp += 1;
        Ok(())
    }

    /// Vacated slot is zeroed.
    fn pop_val(&mut self) -> std::result::Result<Value, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        Ok(std::mem::take(&mut self.stack[self.sp]))
    }

    /// Push an operation result. Pushing a result moves PC on by one.
    fn push_result(&mut self, val: Value) -> Step {
        self.push_val(val)?;
        self.pc += 1;
        Ok(())
    }

    fn set_flags(&mut self, res: Value) {
        self.flags = Flags::from_result(res);
    }

    fn mem_slot(&mut self, addr: Value) -> std::result::Result<&mut Value, Fault> {
        let pc = self.pc;
        usize::try_from(addr)
            .ok()
            .and_then(|idx| self.mem.get_mut(idx))
            .ok_or(Fault::MemoryOutOfRange { pc, addr })
    }

    fn add(&mut self) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        let res = second.wrapping_add(first);
        self.set_flags(res);
        self.push_result(res)
    }

    fn sub(&mut self) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        let res = second.wrapping_sub(first);
        self.set_flags(res);
        self.push_result(res.wrapping_abs())
    }

    fn inc(&mut self) -> Step {
        let res = self.pop_val()?.wrapping_add(1);
        self.push_val(res)?;
        self.set_flags(res);
        self.pc += 1;
        Ok(())
    }

    fn dec(&mut self) -> Step {
        let res = self.pop_val()?.wrapping_sub(1);
        self.push_val(res.wrapping_abs())?;
        self.set_flags(res);
        self.pc += 1;
        Ok(())
    }

    /// Pushes the high half, then the low half. Each half keeps only the literal width.
    fn mul(&mut self) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        let res = second.wrapping_mul(first);
        self.set_flags(res);
        let (high, low) = if self.flags.overflow {
            ((res >> LITERAL_BITS) & low_mask(), res & low_mask())
        } else {
            (0, res)
        };
        self.push_result(high)?;
        self.push_result(low)?;
        // Two pushes, one instruction
        self.pc -= 1;
        Ok(())
    }

    fn adc(&mut self) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        let carry_in = self.flags.carry as Value;
        let mut res = second.wrapping_add(first).wrapping_add(carry_in);
        self.set_flags(res);
        if self.flags.carry {
            res &= low_mask();
        }
        self.push_result(res)
    }

    fn cmp(&mut self) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        self.set_flags(second.wrapping_sub(first));
        self.pc += 1;
        Ok(())
    }

    fn unary(&mut self, op: impl FnOnce(Value) -> Value) -> Step {
        let res = op(self.pop_val()?);
        self.set_flags(res);
        self.push_result(res)
    }

    fn binary(&mut self, op: impl FnOnce(Value, Value) -> Value) -> Step {
        let first = self.pop_val()?;
        let second = self.pop_val()?;
        let res = op(first, second);
        self.set_flags(res);
        self.push_result(res)
    }

    /// Source chosen by which operand fields are set.
    fn push(&mut self, word: Word) -> Step {
        let val = if word.is_indirect() {
            let ptr = self.reg_val(word);
            *self.mem_slot(ptr)?
        } else {
            match (word.literal, word.address, word.register) {
                (lit, 0, None) => lit as Value,
                (0, addr, None) => self.mem[addr as usize],
                (0, 0, Some(reg)) => self.reg[reg.index()],
                _ => return Err(Fault::BadOperands { pc: self.pc }),
            }
        };
        self.push_val(val)?;
        self.pc += 1;
        Ok(())
    }

    fn pop(&mut self, word: Word) -> Step {
        if word.is_indirect() {
            let ptr = self.reg_val(word);
            // Check the destination before touching the stack
            self.mem_slot(ptr)?;
            let val = self.pop_val()?;
            *self.mem_slot(ptr)? = val;
        } else {
            match (word.address, word.register) {
                (addr, None) => self.mem[addr as usize] = self.pop_val()?,
                (0, Some(reg)) => self.reg[reg.index()] = self.pop_val()?,
                _ => return Err(Fault::BadOperands { pc: self.pc }),
            }
        }
        self.pc += 1;
        Ok(())
    }

    fn reg_val(&self, word: Word) -> Value {
        word.register.map_or(0, |reg| self.reg[reg.index()])
    }

    fn jump_if(&mut self, flag: Flag, addr: usize) -> Step {
        if self.flags.get(flag) {
            self.pc = addr;
        } else {
            self.pc += 1;
        }
        Ok(())
    }

    /// The jump is decided against the inverted flag, which is restored afterwards.
    fn jump_unless(&mut self, flag: Flag, addr: usize) -> Step {
        self.flags.toggle(flag);
        let res = self.jump_if(flag, addr);
        self.flags.toggle(flag);
        res
    }
}

fn low_mask() -> Value {
    (1 << LITERAL_BITS) - 1
}

/// Owns a loaded program and the machine executing it.
///
/// This is the surface front ends drive: load, step or run, reset, and read-only views of the
/// machine state.
pub struct RunEnvironment {
    program: Program,
    state: RunState,
    stack_size: usize,
}

impl Default for RunEnvironment {
    fn default() -> Self {
        Self::with_stack_size(DEFAULT_STACK_SIZE)
    }
}

impl RunEnvironment {
    /// Environment with an empty program, halted until something is loaded.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_size(stack_size: usize) -> Self {
        let program = Program::default();
        let state = RunState::new(&program, stack_size);
        RunEnvironment {
            program,
            state,
            stack_size,
        }
    }

    /// Assemble source text and load it. On failure the previous program stays loaded.
    pub fn load(&mut self, src: &str) -> Result<()> {
        let program = crate::assemble(src)?;
        self.load_program(program);
        Ok(())
    }

    pub fn load_program(&mut self, program: Program) {
        self.program = program;
        self.reset();
    }

    /// Load a compiled listing: one 35-digit bit string per line, blank lines ignored.
    pub fn load_bits(&mut self, listing: &str) -> Result<()> {
        let words = listing
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| Word::from_bits(line).map_err(|err| error::decode_failed(i + 1, err)))
            .collect::<Result<Vec<_>>>()?;
        self.load_program(Program::from_words(words));
        Ok(())
    }

    /// Back to the just-loaded state.
    pub fn reset(&mut self) {
        self.state = RunState::new(&self.program, self.stack_size);
    }

    /// Execute exactly one instruction, unless halted.
    pub fn step(&mut self) {
        self.state.step()
    }

    pub fn run(&mut self) {
        self.state.run()
    }

    /// Run at most `limit` instructions. Returns whether the machine halted.
    pub fn run_for(&mut self, limit: u64) -> bool {
        for _ in 0..limit {
            if self.state.is_halted() {
                break;
            }
            self.state.step();
        }
        self.state.is_halted()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registers(&self) -> &[Value; REGISTER_COUNT] {
        self.state.reg()
    }

    pub fn flags(&self) -> Flags {
        self.state.flags()
    }

    pub fn stack(&self) -> &[Value] {
        self.state.stack()
    }

    /// Values currently on the stack, bottom first.
    pub fn stack_values(&self) -> &[Value] {
        &self.state.stack()[..self.state.sp()]
    }

    pub fn memory(&self) -> &[Value; MEMORY_SIZE] {
        self.state.mem()
    }

    pub fn pc(&self) -> usize {
        self.state.pc()
    }

    pub fn sp(&self) -> usize {
        self.state.sp()
    }

    pub fn fault(&self) -> Option<Fault> {
        self.state.fault()
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    /// Listing line of the instruction at PC, if any.
    pub fn current_line(&self) -> Option<&str> {
        self.program.listing().get(self.pc()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Register;

    fn env(src: &str) -> RunEnvironment {
        let mut env = RunEnvironment::new();
        env.load(src).unwrap();
        env
    }

    fn ran(src: &str) -> RunEnvironment {
        let mut env = env(src);
        env.run();
        env
    }

    #[test]
    fn flag_rules() {
        let flags = Flags::from_result(0);
        assert!(flags.zero && flags.parity && !flags.sign && !flags.carry && !flags.overflow);

        let flags = Flags::from_result(-3);
        assert!(flags.sign && !flags.parity && !flags.zero);

        let flags = Flags::from_result(0xFFFF);
        assert!(!flags.carry && !flags.overflow);

        let flags = Flags::from_result(0x10000);
        assert!(flags.carry && flags.overflow);

        let flags = Flags::from_result(0x1FFFF);
        assert!(flags.carry && flags.overflow);

        // Carry band ends where overflow keeps going
        let flags = Flags::from_result(0x20000);
        assert!(!flags.carry && flags.overflow);
    }

    #[test]
    fn sub_pushes_magnitude() {
        let env = ran("PUSH #3\nPUSH #5\nSUB\n");
        assert_eq!(env.stack_values(), &[2]);
        assert!(env.flags().sign);
        assert_eq!(env.pc(), 3);
    }

    #[test]
    fn inc_dec() {
        let env = ran("PUSH #0\nDEC\n");
        assert_eq!(env.stack_values(), &[1]);
        assert!(env.flags().sign);
        assert_eq!(env.pc(), 2);

        let env = ran("PUSH #FFFF\nINC\n");
        assert_eq!(env.stack_values(), &[0x10000]);
        assert!(env.flags().overflow && env.flags().carry);
    }

    #[test]
    fn cmp_does_not_push() {
        let env = ran("PUSH #7\nPUSH #7\nCMP\n");
        assert!(env.stack_values().is_empty());
        assert!(env.flags().zero);
        assert_eq!(env.sp(), 0);
    }

    #[test]
    fn bitwise_and_shifts() {
        assert_eq!(ran("PUSH #C\nPUSH #A\nAND\n").stack_values(), &[8]);
        assert_eq!(ran("PUSH #C\nPUSH #A\nOR\n").stack_values(), &[14]);
        assert_eq!(ran("PUSH #C\nPUSH #A\nXOR\n").stack_values(), &[6]);
        assert_eq!(ran("PUSH #C\nPUSH #A\nNOR\n").stack_values(), &[!14]);
        assert_eq!(ran("PUSH #0\nNOT\n").stack_values(), &[-1]);
        assert_eq!(ran("PUSH #3\nSHL\n").stack_values(), &[6]);
        assert_eq!(ran("PUSH #3\nSHR\n").stack_values(), &[1]);
        let env = ran("PUSH #0\nNOT\n");
        assert!(env.flags().sign && !env.flags().parity);
    }

    #[test]
    fn mul_splits_on_overflow() {
        let env = ran("PUSH #300\nPUSH #100\nMUL\n");
        // 0x300 * 0x100 = 0x30000
        assert_eq!(env.stack_values(), &[3, 0]);
        assert!(env.flags().overflow);
        assert_eq!(env.pc(), 3);

        let env = ran("PUSH #6\nPUSH #7\nMUL\n");
        assert_eq!(env.stack_values(), &[0, 42]);
        assert!(!env.flags().overflow);
        assert_eq!(env.pc(), 3);

        // 0x2FFFD * 0xFFFF = 0x2FFFA0003, high half wider than a literal
        let env = ran("PUSH #FFFF\nPUSH #FFFF\nADD\nPUSH #FFFF\nADD\nPUSH #FFFF\nMUL\n");
        assert_eq!(env.stack_values(), &[0xFFFA, 3]);
        assert!(env.flags().overflow);
    }

    #[test]
    fn adc_uses_and_truncates_carry() {
        let env = ran("PUSH #FFFF\nPUSH #1\nADC\n");
        assert_eq!(env.stack_values(), &[0]);
        assert!(env.flags().carry);

        // Carry from the previous ADC feeds the next one
        let env = ran("PUSH #FFFF\nPUSH #1\nADC\nPUSH #2\nADC\n");
        assert_eq!(env.stack_values(), &[3]);
        assert!(!env.flags().carry);
    }

    #[test]
    fn registers_and_memory() {
        let env = ran("PUSH #2A\nPOP R1\nPUSH R1\nPOP @50\nPUSH @50\n");
        assert_eq!(env.registers()[Register::R1.index()], 0x2A);
        assert_eq!(env.memory()[0x50], 0x2A);
        assert_eq!(env.stack_values(), &[0x2A]);
    }

    #[test]
    fn indirect_addressing() {
        let env = ran("PUSH #60\nPOP R2\nPUSH #9\nPOP @R2\nPUSH @R2\nPUSH @60\n");
        assert_eq!(env.memory()[0x60], 9);
        assert_eq!(env.stack_values(), &[9, 9]);
    }

    #[test]
    fn indirect_out_of_range_faults() {
        let mut env = env("PUSH #100\nPOP R3\nPUSH #1\nPOP @R3\nNOPE\n");
        env.run();
        assert_eq!(
            env.fault(),
            Some(Fault::MemoryOutOfRange { pc: 3, addr: 0x100 })
        );
        // Stack left intact
        assert_eq!(env.stack_values(), &[1]);
        assert!(env.is_halted());
    }

    #[test]
    fn push_then_pop_restores_sp() {
        let env = ran("PUSH #4\nPOP R1\n");
        assert_eq!(env.sp(), 0);
        assert_eq!(env.registers()[0], 4);
        assert!(env.stack().iter().all(|v| *v == 0));
    }

    #[test]
    fn underflow_halts() {
        let env = ran("ADD\nNOPE\n");
        assert_eq!(env.fault(), Some(Fault::StackUnderflow { pc: 0 }));
        assert_eq!(env.pc(), 0);
        assert_eq!(env.sp(), 0);
    }

    #[test]
    fn overflow_halts() {
        let mut env = RunEnvironment::with_stack_size(2);
        env.load("PUSH #1\nPUSH #2\nPUSH #3\n").unwrap();
        env.run();
        assert_eq!(env.fault(), Some(Fault::StackOverflow { pc: 2 }));
        assert_eq!(env.stack(), &[1, 2]);
    }

    #[test]
    fn conditional_jumps() {
        // Z set: JZ taken, NJZ falls through
        let env = ran("PUSH #0\nPUSH #0\nCMP\nJZ @5\nPUSH #1\nNJZ @7\nPUSH #2\n");
        assert_eq!(env.stack_values(), &[2]);
        assert!(env.flags().zero);
    }

    #[test]
    fn negated_jump_restores_flag() {
        let mut env = env("PUSH #1\nPUSH #0\nCMP\nNJZ @5\nNOPE\nNOPE\n");
        env.run_for(4);
        assert_eq!(env.pc(), 5);
        assert!(!env.flags().zero);
    }

    #[test]
    fn jump_pairs_are_exclusive() {
        let pairs = [
            (Opcode::Jc, Opcode::Njc),
            (Opcode::Jz, Opcode::Njz),
            (Opcode::Jp, Opcode::Njp),
            (Opcode::Js, Opcode::Njs),
            (Opcode::Jo, Opcode::Njo),
        ];
        for res in [-2, -1, 0, 1, 2, 0x10000, 0x20001] {
            for (pos, neg) in pairs {
                let mut taken = 0;
                for op in [pos, neg] {
                    let program = Program::from_words(vec![Word::with_address(op, 9)]);
                    let mut state = RunState::new(&program, 4);
                    state.flags = Flags::from_result(res);
                    state.step();
                    if state.pc() == 9 {
                        taken += 1;
                    }
                    assert_eq!(state.flags(), Flags::from_result(res));
                }
                assert_eq!(taken, 1, "{pos}/{neg} with result {res}");
            }
        }
    }

    #[test]
    fn self_modified_code_faults() {
        // Overwrites instruction 3 with a word that has no opcode
        let env = ran("PUSH #1\nPOP @3\nNOPE\nNOPE\n");
        assert_eq!(
            env.fault(),
            Some(Fault::BadInstruction {
                pc: 3,
                err: DecodeError::UnknownOpcode(0)
            })
        );
    }

    #[test]
    fn malformed_push_faults() {
        let word = Word {
            literal: 1,
            address: 2,
            ..Word::bare(Opcode::Push)
        };
        let mut state = RunState::new(&Program::from_words(vec![word]), 4);
        state.step();
        assert_eq!(state.fault(), Some(Fault::BadOperands { pc: 0 }));
    }

    #[test]
    fn step_after_halt_is_noop() {
        let mut env = env("NOPE\n");
        env.step();
        assert!(env.is_halted());
        env.step();
        assert_eq!(env.pc(), 1);
    }

    #[test]
    fn reset_restores_loaded_state() {
        let mut env = env("PUSH #5\nPOP @40\n");
        env.run();
        assert_eq!(env.memory()[0x40], 5);
        env.reset();
        assert_eq!(env.memory()[0x40], 0);
        assert_eq!(env.pc(), 0);
        assert_eq!(env.memory()[0], Word::with_literal(Opcode::Push, 5).pack() as Value);
    }

    #[test]
    fn failed_load_keeps_program() {
        let mut env = env("NOPE\n");
        assert!(env.load("JMP NOWHERE\n").is_err());
        assert_eq!(env.program().len(), 1);
    }

    #[test]
    fn load_bits_listing() {
        let mut env = RunEnvironment::new();
        let program = crate::assemble("PUSH #5\nPUSH #3\nADD\n").unwrap();
        env.load_bits(&program.to_bits()).unwrap();
        env.run();
        assert_eq!(env.stack_values(), &[8]);
        assert_eq!(env.current_line(), None);

        assert!(env.load_bits("0101\n").is_err());
    }
}
