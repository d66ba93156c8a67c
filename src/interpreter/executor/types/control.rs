//! Control flow and call frame types

use super::operation::Operation;
use crate::interpreter::executor::scope::Scope;
use crate::interpreter::executor::stream::OperationStream;
use std::rc::Rc;

/* ===================== Control Signal ===================== */

/// What the dispatcher does with the program counter after a handler ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Default "+1"
    Advance,
    /// The handler already moved the cursor (goto, call, return, catch)
    Redirect,
    /// Stop the run
    Halt,
}

/* ===================== Code Units ===================== */

/// An immutable, shared stream of operations executed in place of a call site:
/// a function body or a module run inline from inside a function.
#[derive(Debug)]
pub struct Body {
    pub name: String,
    pub stream: OperationStream,
}

/// Which operation stream the cursor walks
#[derive(Debug, Clone)]
pub enum CodeUnit {
    /// The program's main operation stream
    Main,
    Body(Rc<Body>),
}

impl CodeUnit {
    pub fn name(&self) -> &str {
        match self {
            CodeUnit::Main => "<main>",
            CodeUnit::Body(body) => &body.name,
        }
    }
}

impl PartialEq for CodeUnit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CodeUnit::Main, CodeUnit::Main) => true,
            (CodeUnit::Body(a), CodeUnit::Body(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A position inside one activation: code unit, program counter and the
/// call depth the activation runs at.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub unit: CodeUnit,
    pub pc: usize,
    pub depth: usize,
}

impl Cursor {
    pub fn start() -> Self {
        Cursor {
            unit: CodeUnit::Main,
            pc: 0,
            depth: 0,
        }
    }

    /// Cursor on the first operation of `body`, one level deeper than `self`
    pub fn enter(&self, body: Rc<Body>) -> Self {
        Cursor {
            unit: CodeUnit::Body(body),
            pc: 0,
            depth: self.depth + 1,
        }
    }

    /// Cursor on the operation after this one
    pub fn next(&self) -> Self {
        Cursor {
            unit: self.unit.clone(),
            pc: self.pc + 1,
            depth: self.depth,
        }
    }
}

/* ===================== Frames ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Function invocation with its own variable scope
    Call,
    /// Module or eval code run from inside a function body; shares the scope
    Inline,
}

/// Call frame - one per active invocation
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    /// Where the invocation happened; execution resumes right after it
    pub entry_point: Cursor,
    /// The invoking operation, for stack traces
    pub operation: Operation,
    /// Callee scope, seeded with a snapshot of the caller's variables
    pub vars: Option<Scope>,
}
