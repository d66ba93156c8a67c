//! Tests for the try-context: arming, catching, payload and disarming

use maplit::btreemap;

use super::helpers::{output_of, run_script};
use crate::interpreter::executor::{ErrorKind, TryState, Value};

#[test]
fn test_error_is_caught_exactly_once() {
    let source = "
        try failed
        nosuch
        out 'unreached'
        section failed
        copy $err
        out $err['kind'] + ':' + $err['message']
        nosuch
        out ' after'
    ";
    let vm = run_script(source);

    assert_eq!(
        vm.output,
        "SyntaxError:undefined operation \"nosuch\" after"
    );
    assert_eq!(
        vm.scope().get("err"),
        Some(&Value::Map(btreemap! {
            "kind".to_string() => Value::from("SyntaxError"),
            "message".to_string() => Value::from("undefined operation \"nosuch\""),
            "index".to_string() => Value::Int(1),
        }))
    );

    // The second raise found nothing armed
    let err = vm.runtime_error.expect("Second error should be recorded");
    assert_eq!(err.operation.index, Some(6));
    assert_eq!(vm.try_state, TryState::Idle);
}

#[test]
fn test_caught_message_matches_raised_error() {
    let source = "
        func call_that_raises; out 1 / 0; endfunc
        try err
        call_that_raises
        section err
        copy $e
        out $e['message']
    ";
    let vm = run_script(source);
    assert!(vm.runtime_error.is_none());
    assert_eq!(vm.output, "division by zero");
    assert!(vm.frames.is_empty());
}

#[test]
fn test_catch_unwinds_nested_calls() {
    let source = "
        func risky; out 'in '; nosuch; out 'no'; endfunc
        func wrapper; risky; out 'no'; endfunc
        try handler
        wrapper
        out 'skipped'
        section handler
        out 'handled'
    ";
    let vm = run_script(source);
    assert_eq!(vm.output, "in handled");
    assert!(vm.frames.is_empty());
    assert_eq!(vm.cursor.depth, 0);
}

#[test]
fn test_try_inside_function_catches_locally() {
    let source = "
        func careful
            try oops
            nosuch
            section oops
            copy $e
            return 'recovered ' + $e['kind']
        endfunc
        careful; copy $r; out $r
    ";
    assert_eq!(output_of(source), "recovered SyntaxError");
}

#[test]
fn test_return_disarms_try_from_the_function() {
    let source = "
        func guarded; try local; return; section local; out 'local'; endfunc
        guarded
        nosuch
        out 'end'
    ";
    let vm = run_script(source);
    assert_eq!(vm.output, "end");
    let err = vm.runtime_error.expect("Error should not be caught");
    assert_eq!(err.operation.source, "nosuch");
}

#[test]
fn test_endtry_disarms() {
    let vm = run_script("try handler; endtry; nosuch; section handler; out 'done'");
    assert!(vm.runtime_error.is_some());
    assert_eq!(vm.try_state, TryState::Idle);
    assert!(vm.mem().is_none());
}

#[test]
fn test_try_requires_known_label() {
    let vm = run_script("try missing");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.message, "undefined section \"missing\"");
    assert_eq!(vm.try_state, TryState::Idle);
}

#[test]
fn test_nested_try_overwrites_outer() {
    let source = "
        try outer
        try inner
        nosuch
        section outer
        out 'outer'
        section inner
        out 'inner'
    ";
    assert_eq!(output_of(source), "inner");
}

#[test]
fn test_oversized_string_repeat_is_caught() {
    let source = "
        try too_big
        out 'ab' * 9223372036854775807
        section too_big
        copy $e
        out $e['kind'] + ': ' + $e['message']
    ";
    let vm = run_script(source);
    assert!(vm.runtime_error.is_none());
    assert_eq!(vm.output, "RuntimeError: repeated string too large");
}
