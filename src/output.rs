use std::fmt;

use colored::Colorize;

use crate::runtime::RunEnvironment;
use crate::symbol::{Flag, Register};
use crate::{Value, DATA_START, MEMORY_SIZE};

/// How machine state is shown on the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    /// Boxed table with colour
    Pretty,
    /// One `KEY value` line per item, suited for blackbox tests
    Minimal,
}

impl Output {
    pub fn new(minimal: bool) -> Self {
        if minimal {
            Output::Minimal
        } else {
            Output::Pretty
        }
    }

    pub fn print_state(&self, env: &RunEnvironment) {
        print!("{}", self.state(env));
    }

    /// Displayable view of registers, flags, stack and data memory.
    pub fn state<'a>(&self, env: &'a RunEnvironment) -> StateView<'a> {
        StateView { env, out: *self }
    }

    /// Trace line for the instruction about to run.
    pub fn print_step(&self, env: &RunEnvironment) {
        let Some(line) = env.current_line() else {
            return;
        };
        match self {
            Self::Minimal => println!("{:>3} {}", env.pc(), line),
            Self::Pretty => println!(
                "{} {}",
                format!("{:>3} │", env.pc()).dimmed(),
                line.bold()
            ),
        }
    }
}

pub struct StateView<'a> {
    env: &'a RunEnvironment,
    out: Output,
}

impl fmt::Display for StateView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.out {
            Output::Minimal => self.minimal(f),
            Output::Pretty => self.pretty(f),
        }
    }
}

impl StateView<'_> {
    /// Non-zero cells of the data region.
    fn data_cells(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.env.memory()[DATA_START..MEMORY_SIZE]
            .iter()
            .enumerate()
            .filter(|(_, val)| **val != 0)
            .map(|(i, val)| (DATA_START + i, *val))
    }

    fn minimal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        writeln!(f, "PC {}", env.pc())?;
        writeln!(f, "SP {}", env.sp())?;
        for (reg, val) in Register::ALL.iter().zip(env.registers()) {
            writeln!(f, "{reg} {val}")?;
        }
        write!(f, "FLAGS")?;
        for flag in Flag::ALL {
            write!(f, " {}={}", flag.letter(), env.flags().get(flag) as u8)?;
        }
        writeln!(f)?;
        write!(f, "STACK")?;
        for val in env.stack_values() {
            write!(f, " {val}")?;
        }
        writeln!(f)?;
        write!(f, "MEM")?;
        for (addr, val) in self.data_cells() {
            write!(f, " {addr:02X}={val}")?;
        }
        writeln!(f)?;
        if let Some(fault) = env.fault() {
            writeln!(f, "FAULT {fault}")?;
        }
        Ok(())
    }

    fn pretty(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.env;
        let rule = "─".repeat(30);
        writeln!(f, "{}", format!("┌{rule}┐").dimmed())?;
        writeln!(
            f,
            "{} {:<6}{:>10}{:>12} {}",
            "│".dimmed(),
            "",
            "hex".italic(),
            "int".italic(),
            "│".dimmed()
        )?;
        for (reg, val) in Register::ALL.iter().zip(env.registers()) {
            let name = reg.to_string();
            writeln!(
                f,
                "{} {:<6}{:>10}{:>12} {}",
                "│".dimmed(),
                name.bold(),
                hex(*val),
                val,
                "│".dimmed()
            )?;
        }
        writeln!(
            f,
            "{} {:<6}{:>10}{:>12} {}",
            "│".dimmed(),
            "PC".bold(),
            format!("0x{:02x}", env.pc()),
            format!("SP {}", env.sp()),
            "│".dimmed()
        )?;

        let mut flags = String::new();
        for flag in Flag::ALL {
            let letter = flag.letter().to_string();
            let shown = if env.flags().get(flag) {
                letter.green().bold()
            } else {
                letter.dimmed()
            };
            flags.push_str(&format!("{shown} "));
        }
        // Five letters plus separators take ten columns
        writeln!(
            f,
            "{} {:<6}{}{:>12} {}",
            "│".dimmed(),
            "FLAGS".bold(),
            flags,
            "",
            "│".dimmed()
        )?;
        writeln!(f, "{}", format!("└{rule}┘").dimmed())?;

        let stack = env
            .stack_values()
            .iter()
            .map(|val| val.to_string())
            .collect::<Vec<_>>();
        if stack.is_empty() {
            writeln!(f, "{:>8} {}", "stack".cyan(), "empty".dimmed())?;
        } else {
            writeln!(f, "{:>8} {} {}", "stack".cyan(), stack.join(" "), "← top".dimmed())?;
        }
        for (addr, val) in self.data_cells() {
            writeln!(f, "{:>8} {}", format!("@{addr:02X}").cyan(), val)?;
        }
        if let Some(fault) = env.fault() {
            writeln!(f, "{:>8} {}", "fault".red().bold(), fault)?;
        }
        Ok(())
    }
}

fn hex(val: Value) -> String {
    if val < 0 {
        format!("-0x{:04x}", val.unsigned_abs())
    } else {
        format!("0x{val:04x}")
    }
}
