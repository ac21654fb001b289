//! Local question answering

use std::path::Path;

use anyhow::{Context, Result};
use assay_core::{AnswerResponse, Solver, Upload};
use tracing::debug;

/// Answer a question and print `{"answer": ...}` on stdout
pub async fn cmd_ask(solver: &Solver, question: &str, file: Option<&Path>) -> Result<()> {
    let line = ask_json(solver, question, file).await?;
    println!("{}", line);
    Ok(())
}

/// Answer a question and render the response body
pub async fn ask_json(solver: &Solver, question: &str, file: Option<&Path>) -> Result<String> {
    let upload = file.map(read_upload).transpose()?;
    debug!(
        file = upload.as_ref().map(|u| u.filename.as_str()).unwrap_or("-"),
        "Answering question locally"
    );

    let answer = solver
        .answer(question, upload)
        .await
        .context("Failed to answer question")?;

    Ok(serde_json::to_string(&AnswerResponse { answer })?)
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Upload::new(filename, bytes))
}
