use super::*;

fn global_number(vm: &Vm, name: &str) -> f64 {
    match vm.global(name) {
        Some(Value::Number(n)) => n,
        other => panic!("expected global `{}` to be a number, got {:?}", name, other),
    }
}

fn global_bool(vm: &Vm, name: &str) -> bool {
    match vm.global(name) {
        Some(Value::Bool(b)) => b,
        other => panic!("expected global `{}` to be a bool, got {:?}", name, other),
    }
}

#[test]
fn arithmetic_respects_precedence() {
    let mut vm = Vm::new();
    assert_eq!(vm.interpret("var result = 1 + 2 * 3;"), InterpretResult::Ok);
    assert_eq!(global_number(&vm, "result"), 7.0);
}

#[test]
fn while_loop_counts_up() {
    let mut vm = Vm::new();
    let source = "var n = 0; while (n < 3) { n = n + 1; }";
    assert_eq!(vm.interpret(source), InterpretResult::Ok);
    assert_eq!(global_number(&vm, "n"), 3.0);
}

#[test]
fn or_short_circuits_before_evaluating_the_right_operand() {
    let mut vm = Vm::new();
    let source = r#"
        var calls = 0;
        fun sideEffect() {
            calls = calls + 1;
            return true;
        }
        var chosen = true or sideEffect();
    "#;
    assert_eq!(vm.interpret(source), InterpretResult::Ok);
    assert_eq!(global_number(&vm, "calls"), 0.0);
    assert!(global_bool(&vm, "chosen"));
}

#[test]
fn and_evaluates_the_right_operand_when_left_is_truthy() {
    let mut vm = Vm::new();
    let source = "var result = true and (1 < 2);";
    assert_eq!(vm.interpret(source), InterpretResult::Ok);
    assert!(global_bool(&vm, "result"));
}

#[test]
fn recursive_function_call_computes_fibonacci() {
    let mut vm = Vm::new();
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        var result = fib(10);
    "#;
    assert_eq!(vm.interpret(source), InterpretResult::Ok);
    assert_eq!(global_number(&vm, "result"), 55.0);
}

#[test]
fn equal_strings_are_interned_to_the_same_handle() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.interpret(r#"var same = "hi" == "hi";"#),
        InterpretResult::Ok
    );
    assert!(global_bool(&vm, "same"));
}

#[test]
fn reading_an_undefined_global_is_a_runtime_error() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.interpret("print undefinedVariable;"),
        InterpretResult::RuntimeError
    );
}

#[test]
fn assigning_to_an_undefined_global_is_a_runtime_error() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.interpret("undefinedVariable = 1;"),
        InterpretResult::RuntimeError
    );
}

#[test]
fn calling_a_function_with_the_wrong_arity_is_a_runtime_error() {
    let mut vm = Vm::new();
    let source = "fun needsTwo(a, b) { return a + b; } needsTwo(1);";
    assert_eq!(vm.interpret(source), InterpretResult::RuntimeError);
}

#[test]
fn calling_a_non_function_value_is_a_runtime_error() {
    let mut vm = Vm::new();
    let source = "var notAFunction = 1; notAFunction();";
    assert_eq!(vm.interpret(source), InterpretResult::RuntimeError);
}

#[test]
fn dividing_by_zero_is_not_a_compile_error_and_yields_infinity() {
    let mut vm = Vm::new();
    assert_eq!(vm.interpret("var result = 1 / 0;"), InterpretResult::Ok);
    assert!(global_number(&vm, "result").is_infinite());
}

#[test]
fn mark_roots_reaches_a_string_stored_in_a_global() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.interpret(r#"var greeting = "hi";"#),
        InterpretResult::Ok
    );
    assert!(!vm.is_object_marked_by_name("greeting"));
    vm.mark_roots();
    assert!(vm.is_object_marked_by_name("greeting"));
}

#[test]
fn self_referential_initializer_is_a_compile_error() {
    let mut vm = Vm::new();
    assert_eq!(
        vm.interpret("{ var a = a; }"),
        InterpretResult::CompileError
    );
}
