//! Virtual Machine state
//!
//! The VM owns everything a run mutates: the main operation stream, the
//! cursor walking it, call frames, variables, the mem register, functions,
//! namespaces, the try-context and the set of included modules.

use std::io::{self, BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::errors::{ExecError, Failure, RaisedError};
use super::expressions::{eval_source, Env};
use super::functions::{FunctionTable, PendingFunction};
use super::modules::ModuleLoader;
use super::namespace::Namespaces;
use super::scope::{Mem, Scope};
use super::stream::OperationStream;
use super::try_catch::TryState;
use super::types::{CodeUnit, Cursor, Frame, Operation, Value};
use crate::config::Config;
use crate::interpreter::parser::{self, ParseError};

/// Bootstrap operations placed before every program
pub const STDLIB_PRELUDE: &str = "mem \"@stdlib\"; include ^;";

/* ===================== Step Result ===================== */

/// Result of one `step()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More operations to run
    Continue,
    /// Program finished or halted
    Done,
}

/* ===================== VM ===================== */

pub struct VM {
    /// Main operation stream and its section table
    pub stream: OperationStream,

    /// Current position
    pub cursor: Cursor,

    /// Active invocations, outermost first
    pub frames: Vec<Frame>,

    /// Variables outside any call
    pub globals: Scope,

    pub mem: Mem,

    pub functions: FunctionTable,

    /// Function whose body is being captured, if any
    pub defining: Option<PendingFunction>,

    pub namespaces: Namespaces,

    pub try_state: TryState,

    pub modules: ModuleLoader,

    /// Test mode: record errors instead of failing, buffer output
    pub harness: bool,

    /// Output accumulated in harness mode
    pub output: String,

    /// Last unhandled error in harness mode
    pub runtime_error: Option<RaisedError>,

    pub(crate) failure: Option<Failure>,

    input: Box<dyn BufRead>,

    interrupt: Arc<AtomicBool>,
}

impl VM {
    /// Create a VM for a parsed program
    ///
    /// The stdlib prelude is prepended (unless disabled), `argv`/`argc` are
    /// seeded, and the link pass runs.
    pub fn new(
        operations: Vec<Operation>,
        args: Vec<String>,
        config: &Config,
    ) -> Result<Self, ParseError> {
        let mut ops = operations;
        if config.include_stdlib {
            let prelude = parser::parse(STDLIB_PRELUDE)?;
            ops.splice(0..0, prelude);
        }

        let mut stream = OperationStream::new(ops);
        stream.link()?;

        Ok(VM {
            stream,
            cursor: Cursor::start(),
            frames: Vec::new(),
            globals: Scope::with_args(args),
            mem: Mem::default(),
            functions: FunctionTable::default(),
            defining: None,
            namespaces: Namespaces::default(),
            try_state: TryState::default(),
            modules: ModuleLoader::new(config),
            harness: false,
            output: String::new(),
            runtime_error: None,
            failure: None,
            input: Box::new(io::BufReader::new(io::stdin())),
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Parse a script and create a VM for it
    pub fn from_source(source: &str, args: Vec<String>, config: &Config) -> Result<Self, ParseError> {
        VM::new(parser::parse(source)?, args, config)
    }

    /// Switch to harness mode
    pub fn harness(mut self) -> Self {
        self.harness = true;
        self
    }

    /// Replace standard input for `read`
    pub fn with_input(mut self, input: impl BufRead + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Poll an externally owned interrupt flag
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    /// Flag polled once per step; setting it raises a `Signal` error
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub(crate) fn interrupt_flag(&self) -> &AtomicBool {
        &self.interrupt
    }

    /* ===================== Variables ===================== */

    /// Scope of the innermost call, or the globals
    pub fn scope(&self) -> &Scope {
        current_scope(&self.frames, &self.globals)
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        match self.frames.iter_mut().rev().find_map(|f| f.vars.as_mut()) {
            Some(scope) => scope,
            None => &mut self.globals,
        }
    }

    /// Variable lookup with used-namespace fallback
    pub fn var(&self, name: &str) -> Result<&Value, ExecError> {
        self.env().lookup(name)
    }

    /// Name a reference resolves to, with used-namespace fallback
    pub fn resolve_var(&self, name: &str) -> Option<String> {
        self.env().resolve_name(name)
    }

    pub fn env(&self) -> Env<'_> {
        Env {
            scope: self.scope(),
            namespaces: &self.namespaces,
        }
    }

    /// Evaluate argument text against the current scope
    pub fn eval(&mut self, source: &str) -> Result<Value, ExecError> {
        let env = Env {
            scope: current_scope(&self.frames, &self.globals),
            namespaces: &self.namespaces,
        };
        eval_source(source, &env, &mut self.mem)
    }

    /// Pending mem value without consuming it
    pub fn mem(&self) -> Option<&Value> {
        self.mem.peek()
    }

    /* ===================== Code Units ===================== */

    pub fn unit_stream<'a>(&'a self, unit: &'a CodeUnit) -> &'a OperationStream {
        match unit {
            CodeUnit::Main => &self.stream,
            CodeUnit::Body(body) => &body.stream,
        }
    }

    pub fn current_operation(&self) -> Option<&Operation> {
        self.unit_stream(&self.cursor.unit).get(self.cursor.pc)
    }

    /// Operation under the cursor, with its index stamped
    pub(crate) fn fetch(&mut self) -> Option<Operation> {
        let pc = self.cursor.pc;
        match &self.cursor.unit {
            CodeUnit::Main => {
                let op = self.stream.get_mut(pc)?;
                op.index = Some(pc);
                Some(op.clone())
            }
            CodeUnit::Body(body) => body.stream.get(pc).cloned(),
        }
    }

    /* ===================== I/O ===================== */

    pub(crate) fn write_output(&mut self, text: &str) -> Result<(), ExecError> {
        if self.harness {
            self.output.push_str(text);
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// One line from input without its line ending; empty at end of input
    pub(crate) fn read_line(&mut self) -> Result<String, ExecError> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

fn current_scope<'a>(frames: &'a [Frame], globals: &'a Scope) -> &'a Scope {
    frames
        .iter()
        .rev()
        .find_map(|f| f.vars.as_ref())
        .unwrap_or(globals)
}
