//! CLI argument definitions using clap
//!
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Assay - Answer data-science assignment questions
#[derive(Parser)]
#[command(name = "assay")]
#[command(about = "Answer assignment questions from text and an optional file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "10000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Answer a question locally and print {"answer": ...}
    Ask {
        /// Question text
        question: String,

        /// File to attach (CSV, ZIP, text)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show which engine a question is routed to
    Classify {
        /// Question text
        question: String,
    },

    /// Print the canonical-form SHA-256 of a file
    ///
    /// Line endings are normalized, leading tabs become two spaces,
    /// trailing whitespace is trimmed and blank runs collapse.
    Checksum {
        /// File to hash
        path: PathBuf,
    },
}
