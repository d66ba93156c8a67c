//! Core execution loop
//!
//! `step()` runs one operation: it handles the end of a code unit, polls the
//! interrupt flag, dispatches the operation under the cursor, routes handler
//! failures through `VM::raise`, and applies the resulting control signal.

use std::sync::atomic::Ordering;

use tracing::{info, trace};

use super::errors::{ErrorKind, Failure};
use super::statements::dispatch;
use super::types::{CodeUnit, ControlSignal};
use super::vm::{Step, VM};

/* ===================== Public API ===================== */

/// Run the VM until the main stream is exhausted or the program halts
///
/// Returns the unhandled error that stopped the program, if any. In harness
/// mode errors are recorded on the VM instead and this always succeeds.
pub fn run(vm: &mut VM) -> Result<(), Failure> {
    info!(operations = vm.stream.len(), harness = vm.harness, "starting program");

    run_until_done(vm);

    match vm.failure.take() {
        Some(failure) => {
            info!(kind = %failure.error.kind, "program failed");
            Err(failure)
        }
        None => {
            info!("program finished");
            Ok(())
        }
    }
}

/// Drive `step()` until it reports completion
pub fn run_until_done(vm: &mut VM) {
    loop {
        match step(vm) {
            Step::Continue => continue,
            Step::Done => break,
        }
    }
}

/// Execute one operation
pub fn step(vm: &mut VM) -> Step {
    let Some(op) = vm.fetch() else {
        // End of the unit under the cursor; a pending interrupt stays set
        // for the operation after the call site
        if vm.cursor.unit == CodeUnit::Main {
            return Step::Done;
        }
        vm.pop_frame();
        return Step::Continue;
    };

    if vm.interrupt_flag().swap(false, Ordering::SeqCst) {
        // The interrupted operation has not run yet, so a recorded signal
        // leaves the cursor on it
        return match vm.raise(ErrorKind::Signal, libc::SIGINT.to_string(), &op) {
            ControlSignal::Advance => Step::Continue,
            signal => apply(vm, signal),
        };
    }

    trace!(
        unit = vm.cursor.unit.name(),
        pc = vm.cursor.pc,
        source = %op.source,
        "dispatching"
    );

    let signal = match dispatch(vm, &op) {
        Ok(signal) => signal,
        Err(err) => vm.raise(err.kind(), err.to_string(), &op),
    };
    apply(vm, signal)
}

/* ===================== Control Signals ===================== */

fn apply(vm: &mut VM, signal: ControlSignal) -> Step {
    match signal {
        ControlSignal::Advance => {
            vm.cursor.pc += 1;
            Step::Continue
        }
        ControlSignal::Redirect => Step::Continue,
        ControlSignal::Halt => Step::Done,
    }
}
