//! End-to-end scenarios driven through the actual `tinylox` binary: each
//! test writes a source file, runs the compiled executable against it, and
//! asserts on stdout/stderr/exit code exactly as a user would see them.

use std::fs;
use std::process::{Command, Output};

fn run_source(source: &str) -> Output {
    let dir = std::env::temp_dir().join(format!("tinylox-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("script.lox");
    fs::write(&path, source).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tinylox"))
        .arg(&path)
        .output()
        .expect("failed to run tinylox binary");

    let _ = fs::remove_file(&path);
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn prints_fibonacci_of_ten() {
    let output = run_source(
        r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
        "#,
    );
    assert_eq!(stdout(&output), "55\n");
    assert!(output.status.success());
}

#[test]
fn equal_string_literals_compare_equal() {
    let output = run_source(r#"print "hi" == "hi";"#);
    assert_eq!(stdout(&output), "true\n");
}

#[test]
fn while_loop_prints_each_iteration() {
    let output = run_source("var n = 0; while (n < 3) { print n; n = n + 1; }");
    assert_eq!(stdout(&output), "0\n1\n2\n");
}

#[test]
fn or_short_circuits_and_skips_the_side_effect() {
    let output = run_source(
        r#"
        fun sideEffect() {
            print "bad";
            return true;
        }
        if (true or sideEffect()) print "ok";
        "#,
    );
    assert_eq!(stdout(&output), "ok\n");
}

#[test]
fn arithmetic_precedence_multiplies_before_adding() {
    let output = run_source("print 1 + 2 * 3;");
    assert_eq!(stdout(&output), "7\n");
}

#[test]
fn undefined_variable_reports_a_script_frame_trace() {
    let output = run_source("foo;");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(70));
    assert!(stderr(&output).contains("[line 1] in script"));
}

#[test]
fn compile_error_exits_with_65() {
    let output = run_source("{ var a = a; }");
    assert_eq!(output.status.code(), Some(65));
}
