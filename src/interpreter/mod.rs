pub mod executor;
pub mod parser;

pub use executor::{run, Failure, RaisedError, Value, VM};
pub use parser::{parse, ParseError};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;

/// Why a script run did not complete
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script {}: {}", .file.display(), .error)]
    Io {
        file: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to parse script {}: {}", .file.display(), .error)]
    Parse { file: PathBuf, error: ParseError },

    /// Unhandled error raised while the program ran
    #[error("{0}")]
    Failed(#[from] Failure),
}

/// Read, parse and run a script file
///
/// `args` become `argv`. Setting `interrupt` raises a `Signal` error at the
/// next operation.
pub fn run_file(
    file: &Path,
    args: Vec<String>,
    config: &Config,
    interrupt: Arc<AtomicBool>,
) -> Result<(), ScriptError> {
    let source = fs::read_to_string(file).map_err(|error| ScriptError::Io {
        file: file.to_path_buf(),
        error,
    })?;

    let mut vm = VM::from_source(&source, args, config)
        .map_err(|error| ScriptError::Parse {
            file: file.to_path_buf(),
            error,
        })?
        .with_interrupt(interrupt);

    run(&mut vm)?;
    Ok(())
}
