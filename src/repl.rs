//! # Interactive REPL
//!
//! A read-eval-print loop for the language, driving one persistent [`Vm`]
//! across lines so that `var`/`fun` declarations from one line are visible
//! on the next — unlike a script run, which gets a fresh `Vm` per file.
//!
//! Input is accumulated until braces balance (so a multi-line `fun`/`while`
//! body can be typed across several lines before it's compiled), the same
//! way this codebase's earlier REPL tracked brace depth while skipping
//! braces inside string literals.

use std::io::{self, Write};

use crate::vm::Vm;

/// Run the REPL until EOF (Ctrl+D) or an `exit`/`quit` command.
pub fn run_repl() {
    println!("tinylox REPL");
    println!("Type `exit` or `quit` to leave.");

    let mut vm = Vm::new();
    let mut buffer = String::new();
    let mut brace_depth: i32 = 0;

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        print!("{}", prompt);
        io::stdout().flush().unwrap();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap() == 0 {
            println!();
            break;
        }

        let trimmed = line.trim();
        if buffer.is_empty() && (trimmed == "exit" || trimmed == "quit") {
            break;
        }

        brace_depth += brace_delta(&line);
        buffer.push_str(&line);

        if brace_depth > 0 {
            continue;
        }

        if brace_depth < 0 {
            eprintln!("unmatched '}}'");
            buffer.clear();
            brace_depth = 0;
            continue;
        }

        // Compile/runtime diagnostics are printed by `interpret` itself.
        vm.interpret(&buffer);
        buffer.clear();
    }
}

/// Net change in brace depth contributed by `line`, ignoring braces that
/// appear inside a string literal.
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escape = false;
    for ch in line.chars() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => delta += 1,
            '}' if !in_string => delta -= 1,
            _ => {}
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brace_delta_ignores_braces_inside_strings() {
        assert_eq!(brace_delta(r#"print "{ not a brace }";"#), 0);
    }

    #[test]
    fn brace_delta_counts_unmatched_open_brace() {
        assert_eq!(brace_delta("fun f() {"), 1);
    }

    #[test]
    fn brace_delta_counts_closing_brace() {
        assert_eq!(brace_delta("}"), -1);
    }
}
