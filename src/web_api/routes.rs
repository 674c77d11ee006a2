//! API Routes

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::path::{Component, PathBuf};
use uuid::Uuid;

use crate::alert;
use crate::error::{Error, Result};
use crate::prompts;
use crate::record::{DetectionRecord, Scenario};
use crate::record_store::RecordStore;
use crate::state::AppState;
use crate::web_api::JobStatus;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Safety detection
        .route("/api/safety/analyze", post(analyze))
        .route("/api/safety/analyze/async", post(analyze_async))
        .route("/api/safety/status/:job_id", get(job_status))
        .route("/api/safety/scenarios", get(list_scenarios))
        .route("/api/safety/edge/analyze", post(edge_analyze))
        .route("/api/safety/records/:camera_id", get(get_record))
        .route("/api/safety/scheduler/status", get(scheduler_status))
        .with_state(state)
}

/// Parsed multipart fields for the analyze endpoints
struct AnalyzeForm {
    camera_id: String,
    timestamp: Option<String>,
    image: Option<Vec<u8>>,
}

async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeForm> {
    let mut camera_id = None;
    let mut timestamp = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Invalid multipart request: {}", e)))?
    {
        match field.name() {
            Some("camera_id") => {
                camera_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::Validation(format!("Invalid camera_id: {}", e)))?,
                );
            }
            Some("timestamp") => {
                timestamp = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::Validation(format!("Invalid timestamp: {}", e)))?,
                );
            }
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Invalid image: {}", e)))?;
                if !bytes.is_empty() {
                    image = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let camera_id = camera_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation("Camera ID is required".to_string()))?;

    Ok(AnalyzeForm {
        camera_id,
        timestamp,
        image,
    })
}

/// Full analysis document returned by both analyze endpoints.
fn analysis_document(record: &DetectionRecord) -> serde_json::Value {
    json!({
        "success": true,
        "record": record,
        "alert": alert::generate(record),
    })
}

/// Run the validation workflow synchronously and return the full document
async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let form = read_analyze_form(multipart).await?;

    let record = state
        .validation_engine
        .validate_camera(
            &form.camera_id,
            form.timestamp.as_deref(),
            form.image.as_deref(),
        )
        .await?;

    Ok(Json(analysis_document(&record)))
}

/// Start the validation workflow in the background, returning a job id
async fn analyze_async(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let form = read_analyze_form(multipart).await?;

    let timestamp = form
        .timestamp
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    let job = state.jobs.create(&form.camera_id, &timestamp).await;
    let job_id = job.job_id;

    let jobs = state.jobs.clone();
    let engine = state.validation_engine.clone();
    tokio::spawn(async move {
        jobs.mark_processing(job_id).await;

        match engine
            .validate_camera(
                &form.camera_id,
                form.timestamp.as_deref(),
                form.image.as_deref(),
            )
            .await
        {
            Ok(record) => {
                jobs.complete(job_id, analysis_document(&record)).await;
            }
            Err(e) => {
                tracing::error!(
                    camera_id = %form.camera_id,
                    job_id = %job_id,
                    error = %e,
                    "Async analysis failed"
                );
                jobs.fail(job_id, e.to_string()).await;
            }
        }
    });

    Ok(Json(json!({
        "success": true,
        "job_id": job_id,
        "status": JobStatus::Pending,
        "message": "True positive detection started"
    })))
}

/// Fetch an async job's status and result
async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    match state.jobs.get(job_id).await {
        Some(job) => Ok(Json(job)),
        None => Err(Error::NotFound(format!("Job not found: {}", job_id))),
    }
}

/// List supported scenarios
async fn list_scenarios() -> impl IntoResponse {
    let scenarios: Vec<_> = Scenario::ALL
        .into_iter()
        .map(|scenario| {
            json!({
                "name": scenario.as_str(),
                "description": prompts::scenario_description(scenario),
                "display_name": scenario.display_name(),
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "total_count": scenarios.len(),
        "scenarios": scenarios,
    }))
}

#[derive(Debug, Deserialize)]
struct EdgeAnalyzeRequest {
    camera_id: String,
    clip_path: String,
}

/// Run the stage-1 edge sweep over a clip and store the pending record
async fn edge_analyze(
    State(state): State<AppState>,
    Json(req): Json<EdgeAnalyzeRequest>,
) -> Result<Json<serde_json::Value>> {
    if req.camera_id.is_empty() {
        return Err(Error::Validation("Camera ID is required".to_string()));
    }

    let clip = resolve_clip_path(&state, &req.clip_path)?;
    let record = state.edge_analyzer.run_sweep(&clip, &req.camera_id).await?;

    Ok(Json(json!({
        "success": true,
        "detected_scenarios": record.detected_scenarios(),
        "record": record,
    })))
}

/// Resolve a clip path against the video directory, rejecting traversal.
fn resolve_clip_path(state: &AppState, clip_path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(clip_path);
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::Validation(format!(
            "Invalid clip path: {}",
            clip_path
        )));
    }

    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(state.config.video_dir.join(path))
    }
}

#[derive(Debug, Deserialize)]
struct RecordQuery {
    timestamp: Option<String>,
}

/// Fetch a stored detection/validation record
async fn get_record(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
    Query(query): Query<RecordQuery>,
) -> Result<impl IntoResponse> {
    match state
        .record_store
        .retrieve(&camera_id, query.timestamp.as_deref())
        .await?
    {
        Some(record) => Ok(Json(record)),
        None => Err(Error::NotFound(format!(
            "No detection record for camera {}",
            camera_id
        ))),
    }
}

/// Scheduler status document
async fn scheduler_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.scheduler.status().await)
}
