use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::interpreter::{self, ScriptError};

#[derive(Parser)]
#[command(name = "pashmak")]
#[command(about = "Pashmak - a small line-oriented scripting language", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory with stdlib modules overriding the embedded ones
    #[arg(long, global = true)]
    pub stdlib_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script
    Run {
        /// Script file
        file: PathBuf,

        /// Arguments passed to the script as argv
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the parsed operations of a script as JSON
    Parse {
        /// Script file
        file: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<ExitStatus> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<ExitStatus> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<ExitStatus> {
    // Load configuration before anything else so errors show up immediately
    let config = Config::builder()
        .config_path(cli.config)
        .stdlib_path(cli.stdlib_path)
        .build()?;

    init_logging(&config);

    match cli.command {
        Commands::Run { file, args } => run_script(file, args, config).await,

        Commands::Parse { file } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read script {}", file.display()))?;
            let operations = interpreter::parse(&source)
                .with_context(|| format!("Failed to parse script {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&operations)?);
            Ok(ExitStatus::Success)
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitStatus::Success)
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over the configured filter
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    // Ignore a second install (run_cli_from_args called twice in one process)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the interpreter on a blocking task while Ctrl-C feeds its interrupt flag
async fn run_script(file: PathBuf, args: Vec<String>, config: Config) -> Result<ExitStatus> {
    let interrupt = Arc::new(AtomicBool::new(false));

    let watcher = {
        let interrupt = Arc::clone(&interrupt);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received");
                interrupt.store(true, Ordering::SeqCst);
            }
        })
    };

    info!(file = %file.display(), args = args.len(), "running script");
    let result = tokio::task::spawn_blocking(move || {
        interpreter::run_file(&file, args, &config, interrupt)
    })
    .await
    .context("Interpreter task panicked")?;

    watcher.abort();

    match result {
        Ok(()) => Ok(ExitStatus::Success),
        Err(ScriptError::Failed(failure)) => {
            // Diagnostics go to the program's output channel
            println!("{}", failure);
            Ok(ExitStatus::Failure)
        }
        Err(err) => Err(err.into()),
    }
}
