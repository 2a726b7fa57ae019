//! # Single-pass compiler
//!
//! Parses and emits bytecode in the same pass — there is no intermediate
//! AST. Expressions are parsed with a Pratt/precedence-climbing table
//! ([`Precedence`], [`Parser::prefix_rule`]/[`Parser::infix_rule`]); each
//! rule both consumes tokens and calls straight through to
//! [`Parser::emit_byte`] and friends. Local variables are resolved to
//! runtime stack slots at compile time; everything else falls back to named
//! globals resolved at runtime.
//!
//! The parse table is expressed as three `match`-driven functions
//! (`prefix_rule`, `infix_rule`, `rule_precedence`) rather than a table of
//! function pointers: the lifetimes a fn-pointer table would need to carry
//! (`Parser<'src, 'h>`) make a literal array of pointers awkward, and a
//! `match` compiles down to the same jump table without the ceremony.

use crate::chunk::OpCode;
use crate::error::CompileError;
use crate::object::{Heap, ObjHandle};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;

/// `Local.depth` sentinel for "declared but not yet initialized" — forbids
/// a variable's initializer from referring to itself.
const UNINITIALIZED: i32 = -1;

/// A local variable's compile-time slot capacity; a local's runtime slot
/// index is encoded as one byte.
const MAX_LOCALS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FunctionKind {
    Script,
    Function,
}

struct Local<'src> {
    name: Token<'src>,
    depth: i32,
}

/// One function's compile-time state: its in-progress `ObjFunction`, locals,
/// and scope depth. Chained through `frames` (innermost last) the way the
/// reference design chains compiler frames through `enclosing`.
struct FunctionState<'src> {
    function: ObjHandle,
    kind: FunctionKind,
    locals: Vec<Local<'src>>,
    scope_depth: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call | Primary => Primary,
        }
    }
}

struct Parser<'src, 'h> {
    scanner: Scanner<'src>,
    heap: &'h mut Heap,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    frames: Vec<FunctionState<'src>>,
}

impl<'src, 'h> Parser<'src, 'h> {
    fn new(source: &'src str, heap: &'h mut Heap) -> Self {
        let dummy = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 0,
        };
        let mut parser = Parser {
            scanner: Scanner::new(source),
            heap,
            previous: dummy,
            current: dummy,
            had_error: false,
            panic_mode: false,
            frames: Vec::new(),
        };
        parser.push_frame(FunctionKind::Script);
        parser
    }

    fn push_frame(&mut self, kind: FunctionKind) {
        let name = match kind {
            FunctionKind::Script => None,
            FunctionKind::Function => Some(self.heap.intern(self.previous.lexeme)),
        };
        let function = self.heap.alloc_function(name);
        // Slot 0 of every frame is reserved for the callee itself.
        let slot_zero = Local {
            name: Token {
                kind: TokenKind::Identifier,
                lexeme: "",
                line: 0,
            },
            depth: 0,
        };
        self.frames.push(FunctionState {
            function,
            kind,
            locals: vec![slot_zero],
            scope_depth: 0,
        });
    }

    // ---- token stream -----------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let tok = self.current;
            self.error_at(tok, tok.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        let tok = self.current;
        self.error_at(tok, message);
    }

    // ---- error reporting ----------------------------------------------

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        eprint!("[line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", token.lexeme),
        }
        eprintln!(": {}", message);
        self.had_error = true;
    }

    fn error(&mut self, message: &str) {
        let tok = self.previous;
        self.error_at(tok, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let tok = self.current;
        self.error_at(tok, message);
    }

    // ---- emission ------------------------------------------------------

    fn current_chunk(&mut self) -> &mut crate::chunk::Chunk {
        let handle = self.frames.last().unwrap().function;
        &mut self.heap.function_mut(handle).chunk
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.current_chunk().write_byte(byte, line);
    }

    fn emit_bytes(&mut self, b1: u8, b2: u8) {
        self.emit_byte(b1);
        self.emit_byte(b2);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_byte(OpCode::Loop as u8);
        let offset = self.current_chunk().len() + 2 - loop_start;
        if offset > u16::MAX as usize {
            self.error("Too much code to jump over");
        }
        self.emit_byte(((offset >> 8) & 0xff) as u8);
        self.emit_byte((offset & 0xff) as u8);
    }

    fn emit_return(&mut self) {
        self.emit_byte(OpCode::Nil as u8);
        self.emit_byte(OpCode::Return as u8);
    }

    /// Emits `op` followed by a two-byte placeholder, returning the offset
    /// of the placeholder's first byte for [`Parser::patch_jump`].
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_byte(op as u8);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.current_chunk().len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.current_chunk().len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over");
        }
        let chunk = self.current_chunk();
        chunk.code[offset] = ((jump >> 8) & 0xff) as u8;
        chunk.code[offset + 1] = (jump & 0xff) as u8;
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        match self.current_chunk().add_constant(value) {
            Some(idx) => idx,
            None => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let idx = self.make_constant(value);
        self.emit_bytes(OpCode::Constant as u8, idx);
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let handle = self.heap.intern(name);
        self.make_constant(Value::Obj(handle))
    }

    fn end_compiler(&mut self) -> ObjHandle {
        self.emit_return();
        self.frames.pop().unwrap().function
    }

    // ---- scope & locals -------------------------------------------------

    fn begin_scope(&mut self) {
        self.frames.last_mut().unwrap().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        let scope_depth = self.frames.last().unwrap().scope_depth;
        loop {
            let should_pop = matches!(
                self.frames.last().unwrap().locals.last(),
                Some(local) if local.depth >= scope_depth
            );
            if !should_pop {
                break;
            }
            self.frames.last_mut().unwrap().locals.pop();
            self.emit_byte(OpCode::Pop as u8);
        }
        self.frames.last_mut().unwrap().scope_depth -= 1;
    }

    fn add_local(&mut self, name: Token<'src>) {
        if self.frames.last().unwrap().locals.len() >= MAX_LOCALS {
            self.error("Too many local variables in function.");
            return;
        }
        self.frames.last_mut().unwrap().locals.push(Local {
            name,
            depth: UNINITIALIZED,
        });
    }

    fn declare_variable(&mut self) {
        if self.frames.last().unwrap().scope_depth == 0 {
            return;
        }
        let name = self.previous;
        let scope_depth = self.frames.last().unwrap().scope_depth;
        let mut conflict = false;
        {
            let frame = self.frames.last().unwrap();
            for i in (0..frame.locals.len()).rev() {
                let local = &frame.locals[i];
                if local.depth != UNINITIALIZED && local.depth < scope_depth {
                    break;
                }
                if local.name.lexeme == name.lexeme {
                    conflict = true;
                    break;
                }
            }
        }
        if conflict {
            self.error("Already a variable with this name in this scope.");
        }
        self.add_local(name);
    }

    fn mark_initialized(&mut self) {
        let frame = self.frames.last_mut().unwrap();
        if frame.scope_depth == 0 {
            return;
        }
        let depth = frame.scope_depth;
        let last = frame.locals.len() - 1;
        frame.locals[last].depth = depth;
    }

    fn resolve_local(&mut self, name: &str) -> Option<u8> {
        let frame = self.frames.last().unwrap();
        let mut found: Option<(usize, i32)> = None;
        for i in (0..frame.locals.len()).rev() {
            if frame.locals[i].name.lexeme == name {
                found = Some((i, frame.locals[i].depth));
                break;
            }
        }
        match found {
            Some((i, depth)) => {
                if depth == UNINITIALIZED {
                    self.error("Can't read local variable in it's own initializer");
                }
                Some(i as u8)
            }
            None => None,
        }
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.frames.last().unwrap().scope_depth > 0 {
            return 0;
        }
        let name = self.previous;
        self.identifier_constant(name.lexeme)
    }

    fn define_variable(&mut self, global: u8) {
        if self.frames.last().unwrap().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_bytes(OpCode::DefineGlobal as u8, global);
    }

    // ---- Pratt parser ----------------------------------------------------

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let can_assign = precedence <= Precedence::Assignment;
        if !self.prefix_rule(self.previous.kind, can_assign) {
            self.error("Expect expression.");
            return;
        }
        while precedence <= Self::rule_precedence(self.current.kind) {
            self.advance();
            self.infix_rule(self.previous.kind, can_assign);
        }
        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn rule_precedence(kind: TokenKind) -> Precedence {
        use TokenKind::*;
        match kind {
            LeftParen => Precedence::Call,
            Minus | Plus => Precedence::Term,
            Slash | Star => Precedence::Factor,
            BangEqual | EqualEqual => Precedence::Equality,
            Greater | GreaterEqual | Less | LessEqual => Precedence::Comparison,
            And => Precedence::And,
            Or => Precedence::Or,
            _ => Precedence::None,
        }
    }

    fn prefix_rule(&mut self, kind: TokenKind, can_assign: bool) -> bool {
        use TokenKind::*;
        match kind {
            LeftParen => self.grouping(can_assign),
            Minus | Bang => self.unary(can_assign),
            Number => self.number(can_assign),
            String => self.string_literal(can_assign),
            False | True | Nil => self.literal(can_assign),
            Identifier => self.variable(can_assign),
            _ => return false,
        }
        true
    }

    fn infix_rule(&mut self, kind: TokenKind, can_assign: bool) {
        use TokenKind::*;
        match kind {
            Minus | Plus | Slash | Star | BangEqual | EqualEqual | Greater | GreaterEqual
            | Less | LessEqual => self.binary(can_assign),
            LeftParen => self.call(can_assign),
            And => self.and_(can_assign),
            Or => self.or_(can_assign),
            _ => {}
        }
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self.previous.lexeme.parse().unwrap_or(0.0);
        self.emit_constant(Value::Number(value));
    }

    fn string_literal(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let unquoted = &lexeme[1..lexeme.len() - 1];
        let handle = self.heap.intern(unquoted);
        self.emit_constant(Value::Obj(handle));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::True => self.emit_byte(OpCode::True as u8),
            TokenKind::False => self.emit_byte(OpCode::False as u8),
            TokenKind::Nil => self.emit_byte(OpCode::Nil as u8),
            _ => unreachable!("literal rule invoked for non-literal token"),
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator_kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator_kind {
            TokenKind::Minus => self.emit_byte(OpCode::Negate as u8),
            TokenKind::Bang => self.emit_byte(OpCode::Not as u8),
            _ => {}
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator_kind = self.previous.kind;
        let rule_prec = Self::rule_precedence(operator_kind);
        self.parse_precedence(rule_prec.next());
        match operator_kind {
            TokenKind::Plus => self.emit_byte(OpCode::Add as u8),
            TokenKind::Minus => self.emit_byte(OpCode::Subtract as u8),
            TokenKind::Star => self.emit_byte(OpCode::Multiply as u8),
            TokenKind::Slash => self.emit_byte(OpCode::Divide as u8),
            TokenKind::BangEqual => self.emit_bytes(OpCode::Equal as u8, OpCode::Not as u8),
            TokenKind::EqualEqual => self.emit_byte(OpCode::Equal as u8),
            TokenKind::Greater => self.emit_byte(OpCode::Greater as u8),
            TokenKind::GreaterEqual => self.emit_bytes(OpCode::Less as u8, OpCode::Not as u8),
            TokenKind::Less => self.emit_byte(OpCode::Less as u8),
            TokenKind::LessEqual => self.emit_bytes(OpCode::Greater as u8, OpCode::Not as u8),
            _ => unreachable!("binary rule invoked for non-operator token"),
        }
    }

    fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_byte(OpCode::Pop as u8);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_byte(OpCode::Pop as u8);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let (get_op, set_op, arg) = match self.resolve_local(name.lexeme) {
            Some(slot) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            None => {
                let idx = self.identifier_constant(name.lexeme);
                (OpCode::GetGlobal, OpCode::SetGlobal, idx)
            }
        };
        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_bytes(set_op as u8, arg);
        } else {
            self.emit_bytes(get_op as u8, arg);
        }
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous;
        self.named_variable(name, can_assign);
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: u8 = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == 255 {
                    self.error("Can't have more than 255 arguments.");
                }
                count = count.wrapping_add(1);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count
    }

    fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_bytes(OpCode::Call as u8, arg_count);
    }

    // ---- statements & declarations --------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else if self.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_byte(OpCode::Nil as u8);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );
        self.define_variable(global);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn function(&mut self, kind: FunctionKind) {
        self.push_frame(kind);
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                {
                    let handle = self.frames.last().unwrap().function;
                    let arity = {
                        let f = self.heap.function_mut(handle);
                        f.arity += 1;
                        f.arity
                    };
                    if arity > 255 {
                        self.error_at_current("Can't have more than 255 parameters.");
                    }
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let function = self.end_compiler();
        self.emit_constant(Value::Obj(function));
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_byte(OpCode::Print as u8);
    }

    fn return_statement(&mut self) {
        if self.frames.last().unwrap().kind == FunctionKind::Script {
            self.error("Can't return from top-level code");
        }
        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_byte(OpCode::Return as u8);
        }
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_byte(OpCode::Pop as u8);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_byte(OpCode::Pop as u8);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_chunk().len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_byte(OpCode::Pop as u8);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_byte(OpCode::Pop as u8);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_byte(OpCode::Pop as u8);
    }

    /// GC root 5 from spec §4.5: every in-progress function on the compiler
    /// frame stack, plus every constant its chunk has accumulated so far.
    /// Relevant only while compilation and execution can interleave (not
    /// the case for `compile`'s single top-level call, but kept so a
    /// future incremental/REPL-aware compiler has a correct hook to call).
    fn mark_compiler_roots(&mut self) {
        for i in 0..self.frames.len() {
            let handle = self.frames[i].function;
            self.heap.mark(handle);
            let constants = self.heap.function(handle).chunk.constants.clone();
            for value in constants {
                if let Value::Obj(obj) = value {
                    self.heap.mark(obj);
                }
            }
        }
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}

/// Compile `source` into the top-level script function, or fail if the
/// parser reported any error. Diagnostics are printed to stderr as they are
/// found; on failure there is nothing further to report.
pub fn compile(source: &str, heap: &mut Heap) -> Result<ObjHandle, CompileError> {
    let mut parser = Parser::new(source, heap);
    parser.advance();
    while !parser.match_token(TokenKind::Eof) {
        parser.declaration();
    }
    let function = parser.end_compiler();
    if parser.had_error {
        Err(CompileError)
    } else {
        Ok(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::OpCode;

    fn compiled(source: &str) -> (ObjHandle, Heap) {
        let mut heap = Heap::new();
        let function = compile(source, &mut heap).expect("expected successful compile");
        (function, heap)
    }

    #[test]
    fn arithmetic_precedence_emits_multiply_before_add() {
        let (function, heap) = compiled("print 1 + 2 * 3;");
        let code = &heap.function(function).chunk.code;
        let multiply_pos = code.iter().position(|&b| b == OpCode::Multiply as u8);
        let add_pos = code.iter().position(|&b| b == OpCode::Add as u8);
        assert!(multiply_pos.unwrap() < add_pos.unwrap());
    }

    #[test]
    fn string_literals_are_interned() {
        let mut heap = Heap::new();
        compile("var a = \"hi\"; var b = \"hi\";", &mut heap).unwrap();
        assert_eq!(heap.object_count(), 1);
    }

    #[test]
    fn self_initializer_is_a_compile_error() {
        let mut heap = Heap::new();
        let result = compile("{ var a = a; }", &mut heap);
        assert!(result.is_err());
    }

    #[test]
    fn while_loop_body_ends_with_backward_loop() {
        let (function, heap) = compiled("var n = 0; while (n < 3) { n = n + 1; }");
        let code = &heap.function(function).chunk.code;
        assert!(code.contains(&(OpCode::Loop as u8)));
        assert!(code.contains(&(OpCode::JumpIfFalse as u8)));
    }

    #[test]
    fn return_outside_function_is_a_compile_error() {
        let mut heap = Heap::new();
        assert!(compile("return 1;", &mut heap).is_err());
    }

    #[test]
    fn mark_compiler_roots_marks_in_progress_function() {
        let mut heap = Heap::new();
        let mut parser = Parser::new("var x = \"hi\";", &mut heap);
        parser.advance();
        parser.declaration();
        let function = parser.frames.last().unwrap().function;
        parser.mark_compiler_roots();
        assert!(parser.heap.is_marked(function));
    }

    #[test]
    fn function_declaration_defines_a_global() {
        let (function, heap) = compiled("fun f(a, b) { return a + b; }");
        let code = &heap.function(function).chunk.code;
        assert!(code.contains(&(OpCode::DefineGlobal as u8)));
    }
}
