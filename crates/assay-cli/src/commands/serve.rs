//! Server command implementation

use anyhow::Result;
use assay_core::AIBackend;

pub async fn cmd_serve(solver: assay_core::Solver, host: &str, port: u16) -> Result<()> {
    let config = assay_server::ServerConfig::from_env();

    println!("🚀 Starting Assay answer API...");
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   LLM fallback: {} ({})",
        solver.ai().name(),
        solver.ai().model()
    );
    if !config.api_keys.is_empty() {
        println!(
            "   🔑 API keys: {} configured (ASSAY_API_KEYS)",
            config.api_keys.len()
        );
    }
    if solver.config().invoker.allow_shell {
        println!();
        println!("   ⚠️  Shell commands ENABLED - do not expose to untrusted callers!");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    assay_server::serve_with_config(solver, host, port, config).await?;

    Ok(())
}
