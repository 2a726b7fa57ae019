//! # Error handling
//!
//! Compile errors and runtime errors are kept deliberately separate, the
//! same split the VM itself makes:
//!
//! - A [`CompileError`] means the parser already printed one or more
//!   `[line N] Error ...: ...` diagnostics to stderr while scanning and
//!   parsing; it carries no payload because there is nothing left to add.
//! - A [`RuntimeError`] is returned from the VM's execution loop, and is
//!   printed together with a call-stack trace by the caller before being
//!   folded into an [`InterpretResult`].
//!
//! Both are plain enums with a hand-written [`fmt::Display`] and
//! [`std::error::Error`] impl, matching how this codebase reports errors
//! elsewhere: no `thiserror`, no error-context crate.

use std::fmt;

/// Signals that the parser reported one or more diagnostics and compilation
/// did not produce a function. The diagnostics themselves were already
/// written to stderr at the point of failure (`[line N] Error ...`).
#[derive(Debug)]
pub struct CompileError;

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compilation failed")
    }
}

impl std::error::Error for CompileError {}

/// Errors raised while executing bytecode.
#[derive(Debug, PartialEq)]
pub enum RuntimeError {
    /// A binary arithmetic/comparison op received the wrong operand types.
    TypeError(String),
    /// `OP_GET_GLOBAL`/`OP_SET_GLOBAL` referenced a name with no binding.
    UndefinedVariable(String),
    /// A call site passed a different number of arguments than the callee
    /// declares.
    ArityMismatch { expected: u8, got: u8 },
    /// `OP_CALL` targeted a value that isn't a function.
    NotCallable,
    /// The call-frame stack exceeded its fixed capacity.
    StackOverflow,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError(msg) => write!(f, "{}", msg),
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable {}", name),
            RuntimeError::ArityMismatch { expected, got } => {
                write!(f, "Expected {} arguments but got {}", expected, got)
            }
            RuntimeError::NotCallable => write!(f, "Can only call functions and classes"),
            RuntimeError::StackOverflow => write!(f, "Stackoverflow"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Outcome of `interpret()`, mirroring `InterpretResult` from the reference
/// design: compile errors and runtime errors are reported (to stderr) before
/// this value is returned, so callers only need it to pick an exit code.
#[derive(Debug, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_variable_message_matches_expected_wording() {
        let err = RuntimeError::UndefinedVariable("x".to_string());
        assert_eq!(err.to_string(), "Undefined variable x");
    }

    #[test]
    fn arity_mismatch_message_matches_expected_wording() {
        let err = RuntimeError::ArityMismatch {
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "Expected 2 arguments but got 1");
    }
}
