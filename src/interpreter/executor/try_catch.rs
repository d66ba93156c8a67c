//! Try-context and error raising
//!
//! A single try-context can be armed at a time. When an error is raised while
//! it is armed, the context is consumed: frames above the depth `try` ran at
//! are dropped, the cursor jumps to the handler label in the code unit that
//! armed it, and mem receives the error payload. Without an armed context the
//! error is recorded (harness mode) or ends the run with a `Failure`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::errors::{ErrorKind, Failure, RaisedError};
use super::types::{CodeUnit, ControlSignal, Cursor, Operation, Value};
use super::vm::VM;

/* ===================== Try State ===================== */

/// Where to resume when an error is caught
#[derive(Debug, Clone, PartialEq)]
pub struct TryContext {
    /// Handler label, resolved when the error is raised
    pub label: String,
    /// Code unit whose section table holds the label
    pub unit: CodeUnit,
    /// Call depth of the `try` operation
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TryState {
    #[default]
    Idle,
    Armed(TryContext),
}

impl TryState {
    /// Arm (replaces any context already armed)
    pub fn enter(&mut self, context: TryContext) {
        *self = TryState::Armed(context);
    }

    /// Disarm
    pub fn exit(&mut self) {
        *self = TryState::Idle;
    }

    /// Consume the armed context, leaving the state idle
    pub fn take(&mut self) -> Option<TryContext> {
        match std::mem::take(self) {
            TryState::Armed(context) => Some(context),
            TryState::Idle => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, TryState::Armed(_))
    }

    /// Disarm if the context was armed deeper than `depth`
    pub fn leave_depth(&mut self, depth: usize) {
        if let TryState::Armed(context) = self {
            if context.depth > depth {
                debug!(label = %context.label, "try-context left by return");
                *self = TryState::Idle;
            }
        }
    }
}

/* ===================== Raising ===================== */

/// Error payload written to mem on catch
pub fn error_payload(kind: ErrorKind, message: &str, op: &Operation) -> Value {
    let mut payload = BTreeMap::new();
    payload.insert("kind".to_string(), Value::from(kind.as_str()));
    payload.insert("message".to_string(), Value::from(message));
    payload.insert("index".to_string(), Value::Int(op.position() as i64));
    Value::Map(payload)
}

impl VM {
    /// Raise an error against `op`
    pub fn raise(&mut self, kind: ErrorKind, message: String, op: &Operation) -> ControlSignal {
        if let Some(context) = self.try_state.take() {
            if let Some(signal) = self.catch(context, kind, &message, op) {
                return signal;
            }
        }

        let error = RaisedError {
            kind,
            message,
            operation: op.clone(),
        };

        if self.harness {
            debug!(kind = %error.kind, message = %error.message, "recording error");
            self.runtime_error = Some(error);
            return ControlSignal::Advance;
        }

        warn!(kind = %error.kind, message = %error.message, "unhandled error");
        let trace = self.frames.iter().map(|f| f.operation.clone()).collect();
        self.failure = Some(Failure { error, trace });
        ControlSignal::Halt
    }

    /// Transfer control to the handler of a consumed try-context
    fn catch(
        &mut self,
        context: TryContext,
        kind: ErrorKind,
        message: &str,
        op: &Operation,
    ) -> Option<ControlSignal> {
        let target = match self.unit_stream(&context.unit).section(&context.label) {
            Ok(target) => target,
            Err(err) => {
                warn!(label = %context.label, error = %err, "try handler vanished");
                return None;
            }
        };

        self.frames.truncate(context.depth);
        debug!(
            label = %context.label,
            kind = %kind,
            depth = context.depth,
            "caught error"
        );

        self.cursor = Cursor {
            unit: context.unit,
            pc: target,
            depth: context.depth,
        };
        self.mem.put(error_payload(kind, message, op));
        Some(ControlSignal::Redirect)
    }
}
