//! Call stack
//!
//! Invocation pushes a frame holding the call site and a snapshot of the
//! caller's variables, then moves the cursor to the start of the shared
//! function body. Returning pops the frame and resumes after the call site.

use std::rc::Rc;

use tracing::{debug, trace};

use super::errors::ExecError;
use super::stream::OperationStream;
use super::types::{Body, ControlSignal, Frame, FrameKind, Operation, Value};
use super::vm::VM;

impl VM {
    /// Invoke a resolved function from the operation under the cursor
    ///
    /// The argument text is evaluated into mem (`""` when there is none).
    /// A call site that is already active is skipped.
    pub fn invoke(&mut self, op: &Operation, body: Rc<Body>) -> Result<ControlSignal, ExecError> {
        let argument = if op.args_str.is_empty() {
            Value::from("")
        } else {
            self.eval(&op.args_str)?
        };
        self.mem.put(argument);

        let site = self.cursor.clone();
        if self.frames.iter().any(|frame| frame.entry_point == site) {
            debug!(function = %body.name, pc = site.pc, "call site already active");
            return Ok(ControlSignal::Advance);
        }

        trace!(function = %body.name, depth = site.depth + 1, "invoking");
        let snapshot = self.scope().clone();
        self.cursor = site.enter(body);
        self.frames.push(Frame {
            kind: FrameKind::Call,
            entry_point: site,
            operation: op.clone(),
            vars: Some(snapshot),
        });
        Ok(ControlSignal::Redirect)
    }

    /// Run loaded code in place of `op` inside a function body; the code
    /// shares the current scope
    pub fn enter_inline(
        &mut self,
        op: &Operation,
        name: &str,
        operations: Vec<Operation>,
    ) -> Result<(), ExecError> {
        let body = Rc::new(Body {
            name: name.to_string(),
            stream: OperationStream::linked_body(operations)?,
        });
        let site = self.cursor.clone();
        self.cursor = site.enter(body);
        self.frames.push(Frame {
            kind: FrameKind::Inline,
            entry_point: site,
            operation: op.clone(),
            vars: None,
        });
        Ok(())
    }

    /// Pop the innermost frame and resume after its call site
    ///
    /// A try-context armed inside the popped frame is disarmed.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.cursor = frame.entry_point.next();
        self.try_state.leave_depth(self.cursor.depth);
        Some(frame)
    }

    /// `return`: pop frames up to and including the innermost call
    ///
    /// Outside any call this stops the program.
    pub fn return_from_call(&mut self) -> ControlSignal {
        if !self.frames.iter().any(|f| f.kind == FrameKind::Call) {
            return ControlSignal::Halt;
        }
        while let Some(frame) = self.pop_frame() {
            if frame.kind == FrameKind::Call {
                break;
            }
        }
        ControlSignal::Redirect
    }
}
