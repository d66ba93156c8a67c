//! Tests for namespaces: qualified definitions and call resolution

use super::helpers::{output_of, run_script};
use crate::interpreter::executor::ErrorKind;

const DEFINITIONS: &str = "
    namespace a; func f; out 'a'; endfunc; endnamespace
    namespace b; func f; out 'b'; endfunc; endnamespace
    func f; out 'global'; endfunc
";

#[test]
fn test_current_namespace_wins() {
    let source = format!("{}\nuse a; use b\nnamespace m; func f; out 'm'; endfunc\nf", DEFINITIONS);
    assert_eq!(output_of(&source), "m");
}

#[test]
fn test_used_namespaces_in_declaration_order() {
    let source = format!("{}\nuse b; use a\nf", DEFINITIONS);
    assert_eq!(output_of(&source), "b");
}

#[test]
fn test_global_fallback_and_qualified_calls() {
    let source = format!("{}\nf; a.f; b.f", DEFINITIONS);
    assert_eq!(output_of(&source), "globalab");
}

#[test]
fn test_definitions_are_qualified_by_open_namespace() {
    let vm = run_script("namespace tools; func hammer; endfunc; endnamespace; hammer");
    assert!(vm.functions.contains("tools.hammer"));
    assert!(!vm.functions.contains("hammer"));

    let err = vm.runtime_error.expect("Unqualified call should fail");
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.message, "undefined operation \"hammer\"");
}

#[test]
fn test_used_namespace_variables() {
    let source = "mem 8080; copy $net.port; use net; out $port";
    assert_eq!(output_of(source), "8080");
}
