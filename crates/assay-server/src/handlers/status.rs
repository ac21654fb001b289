//! Liveness handler

use axum::Json;
use serde::Serialize;

/// Root endpoint response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

/// GET / - Check that the API is running
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Assay answer API is running. POST a question (and optional file) to /api/"
            .to_string(),
    })
}
