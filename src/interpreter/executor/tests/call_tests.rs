//! Tests for function definition and invocation

use super::helpers::{build_vm, output_of, run_script};
use crate::config::Config;
use crate::interpreter::executor::statements::dispatch;
use crate::interpreter::executor::types::FrameKind;
use crate::interpreter::executor::{run, run_until_done, step, ControlSignal, ErrorKind, Value, VM};

#[test]
fn test_function_result_comes_back_in_mem() {
    let source = "
        func double
            copy $n
            return $n * 2
        endfunc
        double 21; copy $r; out $r
    ";
    assert_eq!(output_of(source), "42");
}

#[test]
fn test_call_without_arguments_passes_empty_string() {
    let source = "func show; typeof ^; copy $t; out $t; endfunc; show";
    assert_eq!(output_of(source), "str");
}

#[test]
fn test_callee_changes_do_not_leak_to_caller() {
    let source = "
        mem 1; copy $x
        func change; mem 99; copy $x; copy $y; endfunc
        change 5
        out $x
        isset $y; copy $leaked; out $leaked
    ";
    assert_eq!(output_of(source), "1false");
}

#[test]
fn test_callee_sees_snapshot_of_caller_variables() {
    let source = "
        mem 'outer'; copy $name
        func greet; out 'hi ' + $name; endfunc
        greet
    ";
    assert_eq!(output_of(source), "hi outer");
}

#[test]
fn test_recursion() {
    let source = "
        func fact
            copy $n
            mem $n <= 1; gotoif base
            fact $n - 1; copy $sub
            return $n * $sub
            section base
            return 1
        endfunc
        fact 5; copy $r; out $r
    ";
    let vm = run_script(source);
    assert!(vm.runtime_error.is_none());
    assert_eq!(vm.output, "120");
    assert!(vm.frames.is_empty());
}

#[test]
fn test_popstate_returns_early() {
    let source = "func f; out 'a'; popstate; out 'b'; endfunc; f; out 'c'";
    assert_eq!(output_of(source), "ac");
}

#[test]
fn test_popstate_without_frames_is_a_no_op() {
    assert_eq!(output_of("popstate; out 'still here'"), "still here");
}

#[test]
fn test_undefined_operation_is_syntax_error() {
    let vm = run_script("nosuch 1; out 'next'");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.message, "undefined operation \"nosuch\"");
    assert_eq!(vm.output, "next");
}

#[test]
fn test_bad_call_argument_is_runtime_error() {
    let vm = run_script("func f; endfunc; f $missing");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert_eq!(err.message, "undefined variable \"missing\"");
    assert!(vm.frames.is_empty());
}

#[test]
fn test_redefinition_replaces_function() {
    let source = "func f; out 'old'; endfunc; func f; out 'new'; endfunc; f";
    assert_eq!(output_of(source), "new");
}

#[test]
fn test_active_call_site_is_not_invoked_twice() {
    let mut vm = build_vm("func f; out 'x'; endfunc; f", &[], false);
    // func, out (captured), endfunc
    for _ in 0..3 {
        step(&mut vm);
    }
    let site = vm.cursor.clone();
    let op = vm.current_operation().cloned().expect("Should be on the call");
    assert_eq!(op.command, "f");

    assert_eq!(dispatch(&mut vm, &op).unwrap(), ControlSignal::Redirect);
    let inside = vm.cursor.clone();
    assert_eq!(inside.depth, 1);
    assert_eq!(vm.frames.len(), 1);
    assert_eq!(vm.frames[0].kind, FrameKind::Call);

    // Same site again while its frame is still active
    vm.cursor = site;
    assert_eq!(dispatch(&mut vm, &op).unwrap(), ControlSignal::Advance);
    assert_eq!(vm.frames.len(), 1);

    vm.cursor = inside;
    run_until_done(&mut vm);
    assert_eq!(vm.output, "x");
    assert!(vm.frames.is_empty());
}

#[test]
fn test_unhandled_error_fails_with_call_trace() {
    let source = "func inner; nosuch; endfunc; func outer; inner; endfunc; outer";
    let mut vm = VM::from_source(
        source,
        vec![],
        &Config {
            include_stdlib: false,
            ..Config::default()
        },
    )
    .unwrap();

    let failure = run(&mut vm).unwrap_err();
    assert_eq!(failure.error.kind, ErrorKind::SyntaxError);
    assert_eq!(failure.error.operation.source, "nosuch");

    let trace: Vec<_> = failure.trace.iter().map(|op| op.source.as_str()).collect();
    assert_eq!(trace, vec!["outer", "inner"]);
    assert_eq!(
        failure.to_string(),
        "SyntaxError: undefined operation \"nosuch\":\n\tin 6: outer\n\tin 0: inner\n\tin 0: nosuch"
    );
}

#[test]
fn test_mem_function_loads_values() {
    let vm = run_script("mem [1, 'two']");
    assert_eq!(
        vm.mem(),
        Some(&Value::Array(vec![Value::Int(1), Value::from("two")]))
    );
}
