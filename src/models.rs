//! Shared API models

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_connected: bool,
    pub scheduler_running: bool,
    pub supported_scenarios: usize,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub overloaded: bool,
}
