//! CLI command implementations
//!
//! Commands are organized by purpose:
//! - `ask` - Answer a question locally
//! - `checksum` - Canonical-form file hash
//! - `classify` - Show the routing decision for a question
//! - `serve` - Web server command

pub mod ask;
pub mod checksum;
pub mod classify;
pub mod serve;

// Re-export command functions for main.rs
pub use ask::*;
pub use checksum::*;
pub use classify::*;
pub use serve::*;

use assay_core::{AIClient, Config, Solver};

/// Build a solver from environment configuration
pub fn build_solver() -> Solver {
    let config = Config::from_env();
    let ai = AIClient::from_env(&config.llm);
    Solver::new(config, ai)
}
