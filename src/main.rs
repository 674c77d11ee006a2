//! Safewatch - Two-Stage Camera Safety Detection
//!
//! Main entry point for the detection service.

use safewatch::{
    edge_analyzer::EdgeAnalyzer,
    poll_scheduler::PollScheduler,
    record_store::{HttpRecordStore, LocalRecordStore, RecordStore},
    state::{AppConfig, AppState, StoreBackend, SystemHealth},
    validation_engine::ValidationEngine,
    vision_client::VisionClient,
    web_api::{self, JobStore},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safewatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting safewatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        model_api_url = %config.model_api_url,
        store_backend = ?config.store_backend,
        video_dir = %config.video_dir.display(),
        poll_interval_min = config.poll_interval_min,
        "Configuration loaded"
    );

    // Initialize components
    let vision_client = Arc::new(VisionClient::new(config.model_api_url.clone()));
    if vision_client.health_check().await {
        tracing::info!("Vision inference endpoint reachable");
    } else {
        tracing::warn!(
            url = %config.model_api_url,
            "Vision inference endpoint not reachable at startup"
        );
    }

    let record_store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Local => {
            let store = LocalRecordStore::new(config.store_dir.clone()).await?;
            tracing::info!(dir = %config.store_dir.display(), "Local record store initialized");
            Arc::new(store)
        }
        StoreBackend::Http => {
            tracing::info!(url = %config.store_url, "HTTP record store initialized");
            Arc::new(HttpRecordStore::new(
                config.store_url.clone(),
                config.store_api_key.clone(),
            ))
        }
    };

    let edge_analyzer = Arc::new(EdgeAnalyzer::new(
        vision_client.clone(),
        record_store.clone(),
    ));
    let validation_engine = Arc::new(ValidationEngine::new(
        vision_client.clone(),
        record_store.clone(),
    ));

    let scheduler = Arc::new(
        PollScheduler::new(validation_engine.clone(), record_store.clone()).with_interval(
            Duration::from_secs(config.poll_interval_min * 60),
        ),
    );

    let system_health = Arc::new(RwLock::new(SystemHealth::default()));

    // Create application state
    let state = AppState {
        config: config.clone(),
        vision_client,
        record_store,
        edge_analyzer,
        validation_engine,
        scheduler: scheduler.clone(),
        jobs: Arc::new(JobStore::new()),
        system_health: system_health.clone(),
    };

    // Start system health monitoring
    tokio::spawn(async move {
        use sysinfo::System;
        let mut sys = System::new_all();
        let mut interval = tokio::time::interval(Duration::from_secs(30));

        loop {
            interval.tick().await;
            sys.refresh_all();

            let cpu = {
                let cpus = sys.cpus();
                if cpus.is_empty() {
                    0.0
                } else {
                    cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
                }
            };
            let memory = if sys.total_memory() > 0 {
                (sys.used_memory() as f32 / sys.total_memory() as f32) * 100.0
            } else {
                0.0
            };

            let mut health = system_health.write().await;
            health.update(cpu, memory);
        }
    });

    // Start validation sweeps
    scheduler.start().await;
    tracing::info!("Poll scheduler started");

    // Create router
    let app = web_api::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
