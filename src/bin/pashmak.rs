//! Pashmak CLI
//!
//! Runs Pashmak scripts, dumps parsed operations, and prints the effective
//! configuration.

use pashmak_core::cli;

#[tokio::main]
async fn main() {
    match cli::run_cli().await {
        Ok(status) => std::process::exit(status.code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
