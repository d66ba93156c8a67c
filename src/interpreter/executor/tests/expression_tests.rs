//! Tests for expression evaluation as seen through `out` and `mem`

use super::helpers::{output_of, run_script};
use crate::interpreter::executor::{ErrorKind, Value};

#[test]
fn test_arithmetic() {
    let cases = vec![
        ("1 + 2 * 3", "7"),
        ("(1 + 2) * 3", "9"),
        ("7 / 2", "3.5"),
        ("4 / 2", "2.0"),
        ("7 % 3", "1"),
        ("7 % -3", "-2"),
        ("-7 % 3", "2"),
        ("1 + 0.5", "1.5"),
        ("- (2 - 5)", "3"),
    ];

    for (expr, expected) in cases {
        assert_eq!(output_of(&format!("out {}", expr)), expected, "expr: {}", expr);
    }
}

#[test]
fn test_strings_and_containers() {
    let cases = vec![
        ("'ab' + 'cd'", "abcd"),
        ("'ab' * 3", "ababab"),
        ("'ab' * -2", ""),
        ("[1, 2] + ['x']", "[1, 2, 'x']"),
        ("{'b': 1} + {'a': true}", "{'a': true, 'b': 1}"),
        ("[10, 20, 30][-1]", "30"),
        ("'héllo'[1]", "é"),
        ("{'k': [1, 2]}['k'][0]", "1"),
    ];

    for (expr, expected) in cases {
        assert_eq!(output_of(&format!("out {}", expr)), expected, "expr: {}", expr);
    }
}

#[test]
fn test_comparison_and_logic() {
    let cases = vec![
        ("1 == 1.0", "true"),
        ("'a' < 'b'", "true"),
        ("[1, 2] == [1, 2]", "true"),
        ("1 != 1", "false"),
        ("not 0", "true"),
        ("'' or 'fallback'", "true"),
        ("0 and $undefined", "false"),
    ];

    for (expr, expected) in cases {
        assert_eq!(output_of(&format!("out {}", expr)), expected, "expr: {}", expr);
    }
}

#[test]
fn test_builtin_functions() {
    let cases = vec![
        ("len('héllo')", "5"),
        ("str(12) + '!'", "12!"),
        ("int('42') + 1", "43"),
        ("float(2)", "2.0"),
        ("bool([])", "false"),
        ("typeof(1)", "int"),
        ("upper('abc')", "ABC"),
        ("trim('  x  ')", "x"),
        ("join(split('a,b,c', ','), '-')", "a-b-c"),
        ("keys({'y': 1, 'x': 2})", "['x', 'y']"),
        ("contains([1, 2], 2)", "true"),
    ];

    for (expr, expected) in cases {
        assert_eq!(output_of(&format!("out {}", expr)), expected, "expr: {}", expr);
    }
}

#[test]
fn test_mem_reference_consumes_register() {
    let vm = run_script("mem 5; out ^ + 1; out ^");
    assert_eq!(vm.output, "6null");
    assert!(vm.mem().is_none());
}

#[test]
fn test_evaluation_errors_are_runtime_errors() {
    let cases = vec![
        ("1 / 0", "division by zero"),
        ("1 + 'a'", "unsupported operand types for +: 'int' and 'str'"),
        ("[1][3]", "index 3 out of range for length 1"),
        ("{'a': 1}['b']", "key \"b\" not found"),
        ("$nope", "undefined variable \"nope\""),
        ("nofunc(1)", "unknown function \"nofunc\""),
        ("'x' * 1000000000", "repeated string too large"),
    ];

    for (expr, message) in cases {
        let vm = run_script(&format!("out {}", expr));
        let err = vm.runtime_error.expect("Should record an error");
        assert_eq!(err.kind, ErrorKind::RuntimeError, "expr: {}", expr);
        assert_eq!(err.message, message, "expr: {}", expr);
        assert_eq!(vm.output, "");
    }
}

#[test]
fn test_values_stored_with_copy_keep_their_type() {
    let vm = run_script("mem {'n': 1.5, 'ok': True, 'none': None}; copy $m");
    let Some(Value::Map(map)) = vm.scope().get("m") else {
        unreachable!("Expected a map");
    };
    assert_eq!(map["n"], Value::Float(1.5));
    assert_eq!(map["ok"], Value::Bool(true));
    assert_eq!(map["none"], Value::Null);
}
