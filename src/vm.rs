//! # Stack-based virtual machine
//!
//! Executes the bytecode [`compiler::compile`] produces. The VM owns the
//! heap, the operand stack, a stack of call frames (one per in-flight
//! function call), and the global variable table.
//!
//! ## High-level model
//! - **Operand stack (`stack`)**: holds `Value`s consumed/produced by ops.
//!   Shared across all call frames; a callee's locals simply live at the
//!   top of the same stack, addressed relative to its frame's `slot_base`.
//! - **Call frames (`frames`)**: one per active function invocation, each
//!   with its own instruction pointer into its function's `Chunk`.
//! - **Globals (`globals`)**: a plain name → `Value` table, visible from
//!   every frame.
//!
//! The fetch-decode-execute loop lives in [`Vm::run`]; arithmetic/logical
//! opcodes delegate to [`ops_arith`], global-variable opcodes to
//! [`ops_control`]. Everything touching the call-frame stack (locals,
//! jumps, calls, returns) is handled inline since it needs direct access to
//! `frames` and `stack` together.

use std::collections::HashMap;

use crate::chunk::OpCode;
use crate::compiler;
use crate::error::{InterpretResult, RuntimeError};
use crate::object::{Heap, ObjHandle};
use crate::value::{format_value, Value};

mod ops_arith;
mod ops_control;

/// Maximum depth of nested function calls, matching the reference design's
/// fixed-size frame array.
const FRAMES_MAX: usize = 64;

struct CallFrame {
    function: ObjHandle,
    ip: usize,
    /// Index into the VM's operand stack where this frame's slot 0 (the
    /// callee itself) lives; locals are addressed relative to this.
    slot_base: usize,
}

/// Owns everything a running program needs: the heap, the operand stack,
/// the call-frame stack, and globals. A fresh `Vm` starts with empty
/// globals; the REPL keeps one `Vm` alive across lines so that variables
/// and functions persist between them.
pub struct Vm {
    heap: Heap,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: HashMap<String, Value>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            heap: Heap::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            globals: HashMap::new(),
        }
    }

    /// Compile and run `source`, printing any compile or runtime diagnostics
    /// to stderr before returning. Operand stack and call frames are reset
    /// before each call so a REPL error on one line can't corrupt the next.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        self.stack.clear();
        self.frames.clear();

        let function = match compiler::compile(source, &mut self.heap) {
            Ok(function) => function,
            Err(_) => return InterpretResult::CompileError,
        };

        self.stack.push(Value::Obj(function));
        self.frames.push(CallFrame {
            function,
            ip: 0,
            slot_base: 0,
        });

        match self.run() {
            Ok(()) => InterpretResult::Ok,
            Err(err) => {
                self.print_stack_trace(&err);
                InterpretResult::RuntimeError
            }
        }
    }

    fn read_byte(&mut self) -> u8 {
        let function = self.frames.last().unwrap().function;
        let ip = self.frames.last().unwrap().ip;
        let byte = self.heap.function(function).chunk.code[ip];
        self.frames.last_mut().unwrap().ip += 1;
        byte
    }

    fn read_short(&mut self) -> u16 {
        let hi = self.read_byte() as u16;
        let lo = self.read_byte() as u16;
        (hi << 8) | lo
    }

    fn read_constant(&mut self) -> Value {
        let idx = self.read_byte();
        let function = self.frames.last().unwrap().function;
        self.heap.function(function).chunk.constants[idx as usize]
    }

    /// Reads a one-byte constant index and resolves it to an owned `String`
    /// key, for globals opcodes. Globals are keyed by `String` rather than
    /// `ObjHandle` (see [`crate::object`]'s interning docs): the hash table
    /// backing them is treated as an opaque mapping primitive.
    fn read_global_name(&mut self) -> String {
        match self.read_constant() {
            Value::Obj(handle) => self.heap.string(handle).chars.to_string(),
            _ => unreachable!("global name constant must be a string"),
        }
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            let byte = self.read_byte();
            let op = OpCode::from_u8(byte).expect("compiler only emits valid opcodes");

            match op {
                OpCode::Constant => {
                    let value = self.read_constant();
                    self.stack.push(value);
                }
                OpCode::Nil => self.stack.push(Value::Nil),
                OpCode::True => self.stack.push(Value::Bool(true)),
                OpCode::False => self.stack.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.stack.pop();
                }
                OpCode::GetLocal => {
                    let slot = self.read_byte() as usize;
                    let base = self.frames.last().unwrap().slot_base;
                    self.stack.push(self.stack[base + slot]);
                }
                OpCode::SetLocal => {
                    let slot = self.read_byte() as usize;
                    let base = self.frames.last().unwrap().slot_base;
                    self.stack[base + slot] = *self.stack.last().unwrap();
                }
                OpCode::GetGlobal => {
                    let name = self.read_global_name();
                    ops_control::handle_get_global(&name, &self.globals, &mut self.stack)?;
                }
                OpCode::DefineGlobal => {
                    let name = self.read_global_name();
                    ops_control::handle_define_global(name, &mut self.globals, &mut self.stack);
                }
                OpCode::SetGlobal => {
                    let name = self.read_global_name();
                    ops_control::handle_set_global(&name, &mut self.globals, &self.stack)?;
                }
                OpCode::Equal => ops_arith::handle_equal(&mut self.stack)?,
                OpCode::Greater => ops_arith::handle_greater(&mut self.stack)?,
                OpCode::Less => ops_arith::handle_less(&mut self.stack)?,
                OpCode::Add => ops_arith::handle_add(&mut self.stack, &mut self.heap)?,
                OpCode::Subtract => ops_arith::handle_subtract(&mut self.stack)?,
                OpCode::Multiply => ops_arith::handle_multiply(&mut self.stack)?,
                OpCode::Divide => ops_arith::handle_divide(&mut self.stack)?,
                OpCode::Not => ops_arith::handle_not(&mut self.stack)?,
                OpCode::Negate => ops_arith::handle_negate(&mut self.stack)?,
                OpCode::Print => {
                    let value = self.stack.pop().unwrap();
                    println!("{}", format_value(value, &self.heap));
                }
                OpCode::Jump => {
                    let offset = self.read_short();
                    self.frames.last_mut().unwrap().ip += offset as usize;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_short();
                    if self.stack.last().unwrap().is_falsey() {
                        self.frames.last_mut().unwrap().ip += offset as usize;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_short();
                    self.frames.last_mut().unwrap().ip -= offset as usize;
                }
                OpCode::Call => {
                    let arg_count = self.read_byte();
                    let callee = self.stack[self.stack.len() - 1 - arg_count as usize];
                    self.call_value(callee, arg_count)?;
                }
                OpCode::Return => {
                    let result = self.stack.pop().unwrap();
                    let frame = self.frames.pop().unwrap();
                    if self.frames.is_empty() {
                        self.stack.pop();
                        return Ok(());
                    }
                    self.stack.truncate(frame.slot_base);
                    self.stack.push(result);
                }
            }
        }
    }

    fn call_value(&mut self, callee: Value, arg_count: u8) -> Result<(), RuntimeError> {
        match callee {
            Value::Obj(handle) if self.heap.is_function(handle) => self.call(handle, arg_count),
            _ => Err(RuntimeError::NotCallable),
        }
    }

    fn call(&mut self, function: ObjHandle, arg_count: u8) -> Result<(), RuntimeError> {
        let arity = self.heap.function(function).arity;
        if arg_count != arity {
            return Err(RuntimeError::ArityMismatch {
                expected: arity,
                got: arg_count,
            });
        }
        if self.frames.len() == FRAMES_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        let slot_base = self.stack.len() - arg_count as usize - 1;
        self.frames.push(CallFrame {
            function,
            ip: 0,
            slot_base,
        });
        Ok(())
    }

    /// Prints the error followed by one line per active frame, innermost
    /// first, in the reference design's exact format: `[line N] in name()`
    /// for a named function, `[line N] in script` for the top-level frame.
    fn print_stack_trace(&self, err: &RuntimeError) {
        eprintln!("{}", err);
        for frame in self.frames.iter().rev() {
            let function = self.heap.function(frame.function);
            let line = function
                .chunk
                .lines
                .get(frame.ip.saturating_sub(1))
                .copied()
                .unwrap_or(0);
            match function.name {
                Some(name) => eprintln!("[line {}] in {}()", line, self.heap.string(name).chars),
                None => eprintln!("[line {}] in script", line),
            }
        }
    }
}

impl Vm {
    /// Marks GC roots 1-4 from spec §4.5: every value on the operand stack,
    /// every function referenced by an active call frame, every interned
    /// string, and every value in the globals table. This core never
    /// schedules an automatic sweep, so nothing calls this outside tests;
    /// it exists to keep the mark phase itself exercised and correct.
    pub fn mark_roots(&mut self) {
        for frame in &self.frames {
            self.heap.mark(frame.function);
        }
        for value in &self.stack {
            if let Value::Obj(handle) = value {
                self.heap.mark(*handle);
            }
        }
        for value in self.globals.values() {
            if let Value::Obj(handle) = value {
                self.heap.mark(*handle);
            }
        }
        self.heap.mark_interned_strings();
    }
}

#[cfg(test)]
impl Vm {
    pub(crate) fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    pub(crate) fn is_object_marked_by_name(&self, name: &str) -> bool {
        match self.globals.get(name) {
            Some(Value::Obj(handle)) => self.heap.is_marked(*handle),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests;
