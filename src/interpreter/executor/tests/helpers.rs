//! Test helpers for executor tests
//!
//! Common utilities for building harness VMs from script source

use crate::config::Config;
use crate::interpreter::executor::{run_until_done, VM};

/// Parse source and create a harness-mode VM without running it
///
/// The stdlib prelude is left out unless `with_stdlib` is set, so operation
/// indexes in assertions match the script as written.
pub fn build_vm(source: &str, args: &[&str], with_stdlib: bool) -> VM {
    let config = Config {
        include_stdlib: with_stdlib,
        ..Config::default()
    };
    let args = args.iter().map(|a| a.to_string()).collect();
    VM::from_source(source, args, &config)
        .expect("Parse failed")
        .harness()
}

/// Run a script (no stdlib, no arguments) in harness mode
pub fn run_script(source: &str) -> VM {
    let mut vm = build_vm(source, &[], false);
    run_until_done(&mut vm);
    vm
}

/// Run a script with the stdlib prelude in harness mode
pub fn run_with_stdlib(source: &str) -> VM {
    let mut vm = build_vm(source, &[], true);
    run_until_done(&mut vm);
    vm
}

/// Run a script and return its output, failing on any recorded error
pub fn output_of(source: &str) -> String {
    let vm = run_script(source);
    if let Some(err) = &vm.runtime_error {
        panic!("Unexpected error {}: {}", err.kind, err.message);
    }
    vm.output
}
