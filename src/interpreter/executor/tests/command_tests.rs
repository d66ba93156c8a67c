//! Tests for built-in commands: variables, arrays, files and processes

use std::fs;
use std::io::Cursor;

use tempfile::TempDir;

use super::helpers::{build_vm, output_of, run_script};
use crate::interpreter::executor::{run_until_done, ErrorKind, Value};

/* ===================== Variables ===================== */

#[test]
fn test_set_isset_and_free() {
    let vm = run_script("set $a $b; isset $a $b; copy $both; free $a; isset $a; copy $after");
    assert!(vm.runtime_error.is_none());
    assert_eq!(vm.scope().get("both"), Some(&Value::Bool(true)));
    assert_eq!(vm.scope().get("after"), Some(&Value::Bool(false)));
    assert_eq!(vm.scope().get("b"), Some(&Value::Null));
}

#[test]
fn test_copy_forms() {
    let source = "
        mem 'from mem'; copy $a
        copy $a $b
        mem 3; copy ^ $c
        copy 'literal' $d
    ";
    let vm = run_script(source);
    assert!(vm.runtime_error.is_none());
    assert_eq!(vm.scope().get("a"), Some(&Value::from("from mem")));
    assert_eq!(vm.scope().get("b"), Some(&Value::from("from mem")));
    assert_eq!(vm.scope().get("c"), Some(&Value::Int(3)));
    assert_eq!(vm.scope().get("d"), Some(&Value::from("literal")));
}

#[test]
fn test_copy_needs_variable_target() {
    let vm = run_script("copy 1 2");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert_eq!(err.message, "\"copy\" expects variable names like $name");
}

#[test]
fn test_free_unknown_variable_fails() {
    let vm = run_script("free $ghost");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.message, "undefined variable \"ghost\"");
}

#[test]
fn test_required() {
    let vm = run_script("set $here; required $here; out 'ok'; required $here $gone");
    assert_eq!(vm.output, "ok");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.message, "undefined variable \"gone\"");
}

#[test]
fn test_typeof() {
    let source = "typeof [1]; out ^; typeof 1.5; out ^; typeof {}; out ^; typeof null; out ^";
    assert_eq!(output_of(source), "arrayfloatmapnull");
}

/* ===================== Arrays ===================== */

#[test]
fn test_arraypush_and_arraypop() {
    let source = "
        copy [] $list
        arraypush $list 1 + 1
        arraypush $list 'x'
        arraypop $list; copy $last
        out $list; out ' '; out $last
    ";
    assert_eq!(output_of(source), "[2] x");
}

#[test]
fn test_arraypop_empty_array_fails() {
    let vm = run_script("copy [] $list; arraypop $list");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.message, "pop from empty array");
}

#[test]
fn test_arraypush_needs_an_array() {
    let vm = run_script("copy 'text' $s; arraypush $s 1");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.message, "\"s\" is str, not an array");
}

/* ===================== Input / Output ===================== */

#[test]
fn test_read_one_line_per_variable() {
    let mut vm = build_vm("read $a $b $c; out $a + '|' + $b + '|' + $c", &[], false)
        .with_input(Cursor::new("one\r\ntwo\n"));
    run_until_done(&mut vm);
    assert_eq!(vm.output, "one|two|");
}

#[test]
fn test_fwrite_then_fread() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("note.txt").display().to_string();

    let source = format!("fwrite '{0}' 'hello ' + 'file'; fread '{0}'; copy $c; out $c", path);
    assert_eq!(output_of(&source), "hello file");
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello file");
}

#[test]
fn test_fread_missing_file_is_runtime_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.txt").display().to_string();

    let vm = run_script(&format!("fread '{}'", path));
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.kind, ErrorKind::RuntimeError);
}

#[test]
fn test_system_captures_output_and_exit_code() {
    let vm = run_script("system 'echo hi'; copy $ok; system 'exit 3'; copy $bad");
    assert_eq!(vm.output, "hi\n");
    assert_eq!(vm.scope().get("ok"), Some(&Value::Int(0)));
    assert_eq!(vm.scope().get("bad"), Some(&Value::Int(3)));
}

#[test]
fn test_cwd_reports_working_directory() {
    let vm = run_script("cwd");
    let cwd = std::env::current_dir().unwrap().display().to_string();
    assert_eq!(vm.mem(), Some(&Value::Str(cwd)));
}

#[test]
fn test_python_is_not_a_command() {
    let vm = run_script("python 'print(1)'");
    let err = vm.runtime_error.expect("Should record an error");
    assert_eq!(err.message, "undefined operation \"python\"");
}
