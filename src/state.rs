//! Application state
//!
//! Holds configuration and all shared components

use crate::edge_analyzer::EdgeAnalyzer;
use crate::poll_scheduler::PollScheduler;
use crate::record_store::RecordStore;
use crate::validation_engine::ValidationEngine;
use crate::vision_client::VisionClient;
use crate::web_api::JobStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Record store backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON files under `store_dir`
    Local,
    /// Remote record API at `store_url`
    Http,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Vision inference endpoint base URL
    pub model_api_url: String,
    /// Record store backend
    pub store_backend: StoreBackend,
    /// Remote record store base URL (http backend)
    pub store_url: String,
    /// Record store API key (http backend, optional)
    pub store_api_key: Option<String>,
    /// Local record store directory (local backend)
    pub store_dir: PathBuf,
    /// Directory clip paths are resolved against
    pub video_dir: PathBuf,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Validation sweep interval in minutes
    pub poll_interval_min: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let store_backend = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("http") => StoreBackend::Http,
            _ => StoreBackend::Local,
        };

        Self {
            model_api_url: std::env::var("MODEL_API_URL")
                .unwrap_or_else(|_| "http://localhost:2020".to_string()),
            store_backend,
            store_url: std::env::var("STORE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            store_api_key: std::env::var("STORE_API_KEY").ok(),
            store_dir: std::env::var("STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/records")),
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/videos")),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            poll_interval_min: std::env::var("POLL_INTERVAL_MIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Vision query client
    pub vision_client: Arc<VisionClient>,
    /// Record store (local or http backend)
    pub record_store: Arc<dyn RecordStore>,
    /// Stage-1 edge sweep
    pub edge_analyzer: Arc<EdgeAnalyzer>,
    /// Stage-2 confirmation engine
    pub validation_engine: Arc<ValidationEngine>,
    /// Periodic validation sweeps
    pub scheduler: Arc<PollScheduler>,
    /// Async analysis job tracking
    pub jobs: Arc<JobStore>,
    /// System health status
    pub system_health: Arc<RwLock<SystemHealth>>,
}

/// System health metrics
#[derive(Debug, Clone, Default)]
pub struct SystemHealth {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub overloaded: bool,
    pub last_overload_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SystemHealth {
    /// Check and update overload status
    pub fn update(&mut self, cpu: f32, memory: f32) {
        self.cpu_percent = cpu;
        self.memory_percent = memory;

        if cpu > 85.0 || memory > 90.0 {
            self.overloaded = true;
            self.last_overload_at = Some(chrono::Utc::now());
        } else if self.overloaded {
            // Recovery with hysteresis
            if let Some(last) = self.last_overload_at {
                let elapsed = chrono::Utc::now() - last;
                if elapsed > chrono::Duration::seconds(60) && cpu < 60.0 && memory < 70.0 {
                    self.overloaded = false;
                }
            }
        }
    }
}
