//! Routing preview

use anyhow::Result;
use assay_core::{classify, Question};

/// Print the engine and parameters a question is routed to
pub fn cmd_classify(question: &str) -> Result<()> {
    println!("{}", describe(question)?);
    Ok(())
}

/// `fallback` when no rule matches, else the dispatch as JSON
pub fn describe(question: &str) -> Result<String> {
    match classify(&Question::new(question))? {
        Some(dispatch) => Ok(serde_json::to_string_pretty(&dispatch)?),
        None => Ok("fallback".to_string()),
    }
}
