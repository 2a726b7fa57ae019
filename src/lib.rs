pub mod chunk;
pub mod compiler;
pub mod error;
pub mod object;
pub mod repl;
pub mod scanner;
pub mod value;
pub mod vm;

use error::InterpretResult;
use vm::Vm;

/// Compile and run `source` in a fresh [`Vm`]. Compile and runtime
/// diagnostics are printed to stderr as they occur; the returned
/// [`InterpretResult`] only tells the caller which exit code to use.
pub fn interpret(source: &str) -> InterpretResult {
    Vm::new().interpret(source)
}
