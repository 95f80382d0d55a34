use std::{cell::RefCell, ffi::OsStr};

use crate::DEFAULT_STACK_SIZE;

/// Variable overriding the operand stack depth.
pub const STACK_SIZE_VAR: &str = "STACKASM_STACK_SIZE";

#[derive(Clone, Copy)]
struct Env {
    stack_size: Option<usize>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        stack_size: var_parsed(STACK_SIZE_VAR),
    };
    set_env(value);
}

/// Stack depth from the environment, or the default.
pub fn stack_size() -> usize {
    with_env(|env| env.stack_size).unwrap_or(DEFAULT_STACK_SIZE)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

/// Positive integer value of a variable. Unusable values are ignored with a warning.
fn var_parsed(name: impl AsRef<OsStr>) -> Option<usize> {
    let name = name.as_ref();
    let value = std::env::var(name).ok()?;
    match parse_size(&value) {
        Some(size) => Some(size),
        None => {
            log::warn!("ignoring {}={value:?}: expected a positive integer", name.to_string_lossy());
            None
        }
    }
}

fn parse_size(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|size| *size > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(parse_size("32"), Some(32));
        assert_eq!(parse_size(" 8\n"), Some(8));
        assert_eq!(parse_size("0"), None);
        assert_eq!(parse_size("-4"), None);
        assert_eq!(parse_size("many"), None);
    }

    #[test]
    #[should_panic(expected = "before initialization")]
    fn read_before_init() {
        // Test threads start with fresh thread-locals
        stack_size();
    }
}
