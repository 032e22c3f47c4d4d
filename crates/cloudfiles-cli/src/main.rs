#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;

use std::process;

use anyhow::Context;
use cloudfiles_client::Connection;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "cloudfiles_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "cloudfiles_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "cloudfiles_cli::config";
pub const TRACING_TARGET_COMMANDS: &str = "cloudfiles_cli::commands";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
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
    cli.log();
    cli.validate()?;

    let connection = Connection::connect(&cli.client, cli.transport.clone())
        .await
        .context("failed to connect to the storage service")?;

    let result = cli.command.execute(&connection).await;
    connection.close().await;
    result
}
