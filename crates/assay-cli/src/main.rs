//! Assay CLI - Answer data-science assignment questions
//!
//! Usage:
//!   assay serve --port 10000          Start the answer API
//!   assay ask "QUESTION" --file PATH  Answer a question locally
//!   assay classify "QUESTION"         Show which engine would handle it
//!   assay checksum PATH               Canonical-form SHA-256 of a file

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { port, host } => {
            let solver = commands::build_solver();
            commands::cmd_serve(solver, &host, port).await
        }
        Commands::Ask { question, file } => {
            let solver = commands::build_solver();
            commands::cmd_ask(&solver, &question, file.as_deref()).await
        }
        Commands::Classify { question } => commands::cmd_classify(&question),
        Commands::Checksum { path } => commands::cmd_checksum(&path),
    }
}
