//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes
//! - Request validation
//! - Response formatting
//! - Async job tracking

mod jobs;
mod routes;

pub use jobs::{Job, JobStatus, JobStore};
pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::record::Scenario;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let model_ok = state.vision_client.health_check().await;
    let health = state.system_health.read().await.clone();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_connected: model_ok,
        scheduler_running: state.scheduler.is_running().await,
        supported_scenarios: Scenario::ALL.len(),
        cpu_percent: health.cpu_percent,
        memory_percent: health.memory_percent,
        overloaded: health.overloaded,
    };

    Json(response)
}
