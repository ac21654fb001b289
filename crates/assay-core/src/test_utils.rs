//! Test utilities for assay-core
//!
//! A mock chat-completions server that can stand in for the LLM endpoint in
//! integration tests, plus a few plain routes for exercising the API request
//! engine.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// How the mock chat endpoint answers
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A normal completion whose first choice carries this content
    Content(String),
    /// A non-success status with a short error body
    Status(u16),
    /// A 200 response with an empty `choices` array
    NoChoices,
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Mock chat-completions server for testing
///
/// Routes:
/// - `POST /v1/chat/completions`: replies per [`MockReply`], records requests
/// - `GET|POST /json`: `{"ok": true, "method": ...}`
/// - `GET /text`: a plain-text body
/// - `GET /status/:code`: responds with that status
/// - `GET /slow`: waits five seconds before answering
pub struct MockChatServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    /// Start with a completion that answers "42"
    pub async fn start() -> Self {
        Self::start_with(MockReply::Content("42".into())).await
    }

    /// Start the mock server on an available port
    pub async fn start_with(reply: MockReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_chat))
            .route("/json", get(handle_json_get).post(handle_json_post))
            .route("/text", get(handle_text))
            .route("/status/:code", get(handle_status))
            .route("/slow", get(handle_slow))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full chat completions URL
    pub fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.url())
    }

    /// Chat request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_chat(State(state): State<MockState>, Json(request): Json<Value>) -> Response {
    let model = request["model"].as_str().unwrap_or("mock").to_string();
    state.requests.lock().unwrap().push(request);

    match state.reply {
        MockReply::Content(content) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        MockReply::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({"error": {"message": "mock failure"}}))).into_response()
        }
        MockReply::NoChoices => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": []
        }))
        .into_response(),
    }
}

async fn handle_json_get() -> Json<Value> {
    Json(json!({"ok": true, "method": "GET"}))
}

async fn handle_json_post() -> Json<Value> {
    Json(json!({"ok": true, "method": "POST"}))
}

async fn handle_text() -> &'static str {
    "plain body\n"
}

async fn handle_status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "failure").into_response()
}

async fn handle_slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}
