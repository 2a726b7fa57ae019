//! Command-line entry point.
//!
//! - No arguments: start the interactive REPL.
//! - `-h`/`--help`: print usage and exit 0.
//! - `-v`/`--version`: print a build string and exit 0.
//! - A path argument: compile and run that source file, mapping the
//!   result to the process exit code this runtime's ancestor interpreter
//!   uses: 0 on success, 65 on a compile error, 70 on a runtime error.

use std::env;
use std::fs;
use std::process::ExitCode;

use tinylox::error::InterpretResult;
use tinylox::repl::run_repl;

const VERSION: &str = "0.1.0";

fn usage() -> String {
    format!(
        r#"tinylox v{0}

Usage:
    tinylox [script]

Arguments:
    [script]
        Path to a source file to execute. With no arguments, starts an
        interactive REPL instead.

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show the runtime version."#,
        VERSION
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        run_repl();
        return ExitCode::SUCCESS;
    }

    if args[1] == "-h" || args[1] == "--help" {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }

    if args[1] == "-v" || args[1] == "--version" {
        println!(
            "tinylox-build-{}-{}: v{}",
            env::consts::OS,
            env::consts::ARCH,
            VERSION
        );
        return ExitCode::SUCCESS;
    }

    let path = &args[1];
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {}", path, err);
            return ExitCode::from(74);
        }
    };

    match tinylox::interpret(&source) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}
