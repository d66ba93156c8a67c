//! Error types raised while executing operations
//!
//! Every failure, whatever its origin, ends up in `VM::raise` as an
//! `ErrorKind` plus a message. Recoverability depends only on whether a
//! try-context is armed at that moment.

use super::types::Operation;
use crate::interpreter::parser::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/* ===================== Error Kinds ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SyntaxError,
    RuntimeError,
    Signal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::Signal => "Signal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* ===================== Handler Errors ===================== */

/// Failure of a single handler or expression evaluation
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("undefined section \"{0}\"")]
    UndefinedSection(String),

    #[error("undefined operation \"{0}\"")]
    UndefinedOperation(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("undefined variable \"{0}\"")]
    UndefinedVariable(String),

    #[error("variable \"{0}\" is read-only")]
    ReadOnly(String),

    #[error("\"{command}\" expects {expected}")]
    Arguments {
        command: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key \"{0}\" not found")]
    KeyNotFound(String),

    #[error("module \"{0}\" not found")]
    ModuleNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Runtime(String),
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::UndefinedSection(_)
            | ExecError::UndefinedOperation(_)
            | ExecError::Parse(_) => ErrorKind::SyntaxError,
            _ => ErrorKind::RuntimeError,
        }
    }

    pub fn arguments(command: &str, expected: &'static str) -> Self {
        ExecError::Arguments {
            command: command.to_string(),
            expected,
        }
    }
}

/* ===================== Raised Errors ===================== */

/// An error raised against an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaisedError {
    pub kind: ErrorKind,
    pub message: String,
    pub operation: Operation,
}

/// Unhandled error outside harness mode
///
/// `Display` renders the diagnostic: kind and message, the entry point of each
/// active call frame (outermost first), then the failing operation.
#[derive(Debug, Clone)]
pub struct Failure {
    pub error: RaisedError,
    pub trace: Vec<Operation>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}:", self.error.kind, self.error.message)?;
        for op in &self.trace {
            writeln!(f, "\tin {}: {}", op.position(), op.source)?;
        }
        write!(
            f,
            "\tin {}: {}",
            self.error.operation.position(),
            self.error.operation.source
        )
    }
}

impl std::error::Error for Failure {}
