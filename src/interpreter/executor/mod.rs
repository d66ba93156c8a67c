//! # Executor - Operation Stream Interpreter
//!
//! Runs parsed Pashmak operations one at a time.
//!
//! ## Core Pieces
//!
//! 1. **Operation stream**: the main program plus its section table; `include`
//!    and `eval` splice code into it
//! 2. **Call stack**: functions are immutable shared bodies; a call pushes a
//!    frame with a scope snapshot and returns to the call site
//! 3. **Dispatcher**: one handler per command, errors funnel into `raise`
//! 4. **Try-context**: a single armed handler label per program

pub mod builtins;
pub mod calls;
pub mod errors;
pub mod exec_loop;
pub mod expressions;
pub mod functions;
pub mod modules;
pub mod namespace;
pub mod scope;
pub mod statements;
pub mod stream;
pub mod try_catch;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::{ErrorKind, ExecError, Failure, RaisedError};
pub use exec_loop::{run, run_until_done, step};
pub use try_catch::{TryContext, TryState};
pub use types::{ControlSignal, Expr, Operation, Value};
pub use vm::{Step, VM};
