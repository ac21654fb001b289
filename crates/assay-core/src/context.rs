//! Fallback context builder
//!
//! When no intent rule matches, the question goes to the LLM with whatever
//! metadata we have about the upload:
//! - the question itself
//! - the uploaded file's name and size
//! - the member names, if the upload is a ZIP archive

use tracing::{debug, warn};

use crate::archive;
use crate::models::Question;
use crate::scratch::UploadedFile;

/// Fixed system instruction for fallback completions
pub const SYSTEM_PROMPT: &str = "You are an assistant helping with data science assignments. \
Provide only the exact answer that should be submitted, without explanations or reasoning.";

/// Upper bound on archive members listed in the prompt
const MAX_LISTED_MEMBERS: usize = 50;

/// Assembled fallback context
#[derive(Debug, Clone, Default)]
pub struct FallbackContext {
    pub question: String,
    /// `(name, size in bytes)` of the upload
    pub file: Option<(String, u64)>,
    /// Archive member names, when the upload is a ZIP
    pub members: Vec<String>,
}

impl FallbackContext {
    /// Gather context for a question and optional upload
    pub fn build(question: &Question, file: Option<&UploadedFile>) -> Self {
        let mut context = Self {
            question: question.raw().to_string(),
            ..Self::default()
        };

        if let Some(file) = file {
            context.file = Some((file.name.clone(), file.size));
            match archive::is_zip(&file.path) {
                Ok(true) => match archive::list_members(&file.path) {
                    Ok(members) => context.members = members,
                    Err(e) => warn!(file = %file.name, error = %e, "Could not list archive"),
                },
                Ok(false) => {}
                Err(e) => warn!(file = %file.name, error = %e, "Could not inspect upload"),
            }
        }

        debug!(
            has_file = context.file.is_some(),
            members = context.members.len(),
            "Built fallback context"
        );
        context
    }

    /// Render as the user message of the chat request
    pub fn render(&self) -> String {
        let mut out = format!("Question: {}\n\n", self.question);

        if let Some((name, size)) = &self.file {
            out.push_str(&format!("File provided: {} ({} bytes)\n", name, size));
        }

        if !self.members.is_empty() {
            out.push_str("Archive contents:\n");
            for name in self.members.iter().take(MAX_LISTED_MEMBERS) {
                out.push_str(&format!("- {}\n", name));
            }
            if self.members.len() > MAX_LISTED_MEMBERS {
                out.push_str(&format!(
                    "- ... and {} more\n",
                    self.members.len() - MAX_LISTED_MEMBERS
                ));
            }
        }

        out
    }
}
