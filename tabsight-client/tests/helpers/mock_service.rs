//! Mock analysis service
//!
//! Serves `/upload` and `/model` on an ephemeral localhost port, replies with
//! whatever the test configured and records every request it receives.

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Url;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabsight_client::{ClientSettings, WorkflowController};
use tabsight_common::config::TomlConfig;
use tokio::net::TcpListener;

use super::fixtures::{ranking_response, upload_response};

/// Canned reply for one endpoint
#[derive(Debug, Clone)]
pub struct MockReply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl MockReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "text/plain",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// 200 with a body that is not JSON
    pub fn html(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back after the request has been recorded
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn respond(self) -> Response {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// One multipart part as seen by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

struct MockState {
    upload_reply: Mutex<MockReply>,
    analysis_reply: Mutex<MockReply>,
    uploads: Mutex<Vec<Vec<ReceivedPart>>>,
    analysis_requests: Mutex<Vec<Value>>,
}

/// Running mock service; lives until the test runtime shuts down
pub struct MockService {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockService {
    /// Start with successful defaults: directory `abc123`, ranking result
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            upload_reply: Mutex::new(MockReply::json(upload_response("abc123"))),
            analysis_reply: Mutex::new(MockReply::json(ranking_response())),
            uploads: Mutex::new(Vec::new()),
            analysis_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/upload", post(handle_upload))
            .route("/model", post(handle_analysis))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings::with_base(self.base_url(), &TomlConfig::default())
    }

    pub fn controller(&self) -> WorkflowController {
        WorkflowController::from_settings(&self.settings()).unwrap()
    }

    pub fn reply_to_upload(&self, reply: MockReply) {
        *self.state.upload_reply.lock().unwrap() = reply;
    }

    pub fn reply_to_analysis(&self, reply: MockReply) {
        *self.state.analysis_reply.lock().unwrap() = reply;
    }

    /// Every upload request received, each as its ordered parts
    pub fn uploads(&self) -> Vec<Vec<ReceivedPart>> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// Every analysis request body received
    pub fn analysis_requests(&self) -> Vec<Value> {
        self.state.analysis_requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.analysis_requests()
            .iter()
            .filter_map(|body| body.get("prompt").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

async fn handle_upload(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

        parts.push(ReceivedPart {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    state.uploads.lock().unwrap().push(parts);

    let reply = state.upload_reply.lock().unwrap().clone();
    reply.respond().await
}

async fn handle_analysis(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.analysis_requests.lock().unwrap().push(body);

    let reply = state.analysis_reply.lock().unwrap().clone();
    reply.respond().await
}

/// Address with nothing listening on it
pub async fn unused_base_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}", addr)).unwrap()
}
