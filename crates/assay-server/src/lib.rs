//! Assay Web Server
//!
//! Axum-based HTTP API for answering assignment questions.
//!
//! Endpoints:
//! - `GET /`: liveness message
//! - `POST /api/`: multipart form with `question` (required) and `file` (optional)
//!
//! Security features:
//! - Optional API key authentication (enabled when keys are configured)
//! - Upload size limit
//! - Sanitized error responses for internal failures

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use assay_core::{AIBackend, ErrorKind, Solver};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Room for the question field and multipart framing on top of the file
const FORM_OVERHEAD: usize = 64 * 1024;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as `Authorization: Bearer <key>` (empty = no auth)
    pub api_keys: Vec<String>,
}

impl ServerConfig {
    /// Read `ASSAY_API_KEYS` and `ASSAY_ALLOWED_ORIGINS` (comma-separated)
    pub fn from_env() -> Self {
        Self {
            allowed_origins: split_list(std::env::var("ASSAY_ALLOWED_ORIGINS").ok()),
            api_keys: split_list(std::env::var("ASSAY_API_KEYS").ok()),
        }
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Shared application state
pub struct AppState {
    pub solver: Solver,
    pub config: ServerConfig,
}

/// API key middleware
///
/// A no-op when no keys are configured. Keys are compared in constant time.
async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.api_keys.is_empty() {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - missing or invalid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes)) {
            return true;
        }
    }
    false
}

/// Build the application router
pub fn create_router(solver: Solver, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        solver,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/api", post(handlers::answer))
        .route("/api/", post(handlers::answer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .route("/", get(handlers::root))
        .merge(api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + FORM_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server with default configuration
pub async fn serve(solver: Solver, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(solver, host, port, ServerConfig::default()).await
}

/// Start the server
pub async fn serve_with_config(
    solver: Solver,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    info!(
        backend = solver.ai().name(),
        model = solver.ai().model(),
        endpoint = %solver.config().llm.endpoint,
        "LLM fallback configured"
    );
    if solver.config().invoker.allow_shell {
        warn!("Shell command execution is ENABLED - only expose this server to trusted callers");
    }
    if config.api_keys.is_empty() {
        info!("API key authentication disabled (set ASSAY_API_KEYS to enable)");
    }

    let app = create_router(solver, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ========== Error Handling ==========

/// Application error type
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn payload_too_large(msg: &str) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<assay_core::Error> for AppError {
    fn from(err: assay_core::Error) -> Self {
        let status = match err.kind() {
            ErrorKind::ParameterMissing => StatusCode::BAD_REQUEST,
            ErrorKind::Parse | ErrorKind::Computation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Disabled => StatusCode::FORBIDDEN,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            Self {
                status,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err.into()),
            }
        } else {
            Self {
                status,
                message: err.to_string(),
                internal: None,
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}
