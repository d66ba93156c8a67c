//! Type definitions for the executor
//!
//! - Operations produced by the parser
//! - Expression AST
//! - Runtime values
//! - Control flow (cursor, code units, frames)

pub mod ast;
pub mod control;
pub mod operation;
pub mod values;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use control::{Body, CodeUnit, ControlSignal, Cursor, Frame, FrameKind};
pub use operation::Operation;
pub use values::Value;
