// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! terrace: run terraform inside managed Kubernetes workspaces.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod envfile;
mod error;
mod exit_error;
mod monitor;
mod protocol;
mod waiter;

use clap::{Parser, Subcommand};
use commands::{run, workspace};
use exit_error::ExitError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terrace", about = "Run terraform commands in Kubernetes workspaces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage workspaces
    #[command(subcommand)]
    Workspace(workspace::WorkspaceCommand),
    /// Submit a run against the selected workspace
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Workspace(cmd) => workspace::execute(cmd).await,
        Command::Run(args) => run::execute(args).await,
    };

    if let Err(err) = result {
        if !err.message.is_empty() {
            eprintln!("Error: {}", err.message);
        }
        std::process::exit(err.code);
    }
}
