#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "docex_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "docex_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "docex_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "docex_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "command completed successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    Cli::log_build_info();

    match &cli.command {
        Command::Connect(args) => {
            args.connection.log();
            command::connect(args).await
        }
        Command::Provision(args) => {
            args.log();
            command::provision(args).await
        }
    }
}
