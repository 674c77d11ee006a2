//! Scripted in-process stub of the vision inference endpoint.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted reply from the stub endpoint.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// 200 with `{"answer": ...}`
    Answer(String),
    /// Bare status code with an empty JSON body
    Status(u16),
}

#[derive(Clone)]
struct StubState {
    replies: Arc<Mutex<VecDeque<StubReply>>>,
    last: Arc<Mutex<Option<StubReply>>>,
    hits: Arc<AtomicUsize>,
}

/// Handle to a running stub endpoint.
pub struct StubModel {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl StubModel {
    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn query_handler(
    State(state): State<StubState>,
    Json(_req): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let reply = {
        let mut replies = state.replies.lock().unwrap();
        match replies.pop_front() {
            Some(reply) => {
                *state.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            // Script exhausted: keep repeating the last reply.
            None => state
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(StubReply::Status(500)),
        }
    };

    match reply {
        StubReply::Answer(answer) => (StatusCode::OK, Json(json!({ "answer": answer }))),
        StubReply::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({})),
        ),
    }
}

/// Spawn a stub inference endpoint that plays back `replies` in order,
/// then repeats the last one.
pub async fn spawn_model_stub(replies: Vec<StubReply>) -> StubModel {
    let state = StubState {
        replies: Arc::new(Mutex::new(replies.into())),
        last: Arc::new(Mutex::new(None)),
        hits: Arc::new(AtomicUsize::new(0)),
    };
    let hits = state.hits.clone();

    let app = Router::new()
        .route("/v1/query", post(query_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    StubModel {
        base_url: format!("http://{}", addr),
        hits,
    }
}
