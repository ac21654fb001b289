//! Answer handler

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use assay_core::{AnswerResponse, Upload};

/// Name given to uploads whose form field carries no file name
const UNNAMED_UPLOAD: &str = "upload";

/// POST /api/ - Answer a question
///
/// Expects multipart form with:
/// - question: question text (required)
/// - file: any file (optional, max 10MB)
pub async fn answer(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnswerResponse>, AppError> {
    let mut question: Option<String> = None;
    let mut upload: Option<Upload> = None;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, "Failed to read form field"))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "question" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| form_error(e, "Failed to read question"))?;
                question = Some(value);
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| UNNAMED_UPLOAD.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| form_error(e, "Failed to read file data"))?;

                // Check file size limit
                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(too_large());
                }

                upload = Some(Upload::new(filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    // Validate required fields
    let question = question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing question field"))?;

    let started = Instant::now();
    let file_name = upload.as_ref().map(|u| u.filename.clone());
    info!(
        question_chars = question.chars().count(),
        file = file_name.as_deref().unwrap_or("-"),
        "Answering question"
    );

    match state.solver.answer(&question, upload).await {
        Ok(answer) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Question answered"
            );
            Ok(Json(AnswerResponse { answer }))
        }
        Err(e) => {
            error!(
                error = %e,
                question = %question,
                file = file_name.as_deref().unwrap_or("-"),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Failed to answer question"
            );
            Err(e.into())
        }
    }
}

fn too_large() -> AppError {
    AppError::payload_too_large(&format!(
        "File too large. Maximum size is {} MB",
        MAX_UPLOAD_SIZE / 1024 / 1024
    ))
}

/// Body-limit failures surface as multipart errors; keep them a 413
fn form_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        AppError::bad_request(&format!("{}: {}", context, err.body_text()))
    }
}
