//! PollScheduler - Periodic Validation Sweeps
//!
//! ## Responsibilities
//!
//! - Run one validation sweep immediately on start, then every N minutes
//! - Process pending cameras sequentially within a sweep
//! - Contain per-camera failures; a sweep never crashes the process
//! - Stop via an explicit signal with a bounded join
//!
//! The whole schedule runs on a single timer loop, so two sweeps can never
//! overlap. Stopping lets the in-flight camera finish; it does not abort a
//! query mid-flight.

use crate::alert;
use crate::error::Result;
use crate::record_store::RecordStore;
use crate::validation_engine::ValidationEngine;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Default sweep interval in minutes.
const DEFAULT_INTERVAL_MIN: u64 = 5;

/// Bounded wait when joining the background loop on stop.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Scheduler status document
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub interval_secs: u64,
    pub sweeps_completed: u64,
}

/// PollScheduler instance
pub struct PollScheduler {
    engine: Arc<ValidationEngine>,
    store: Arc<dyn RecordStore>,
    sweep_interval: Duration,
    running: Arc<RwLock<bool>>,
    sweeps_completed: Arc<AtomicU64>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    /// Create new PollScheduler with the default 5-minute interval
    pub fn new(engine: Arc<ValidationEngine>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            engine,
            store,
            sweep_interval: Duration::from_secs(DEFAULT_INTERVAL_MIN * 60),
            running: Arc::new(RwLock::new(false)),
            sweeps_completed: Arc::new(AtomicU64::new(0)),
            stop_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Override the sweep interval (config / test hook)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Start the scheduler: one sweep immediately, then one per interval.
    pub async fn start(&self) {
        {
            let mut running = self.running.write().await;
            if *running {
                tracing::warn!("Poll scheduler already running");
                return;
            }
            *running = true;
        }

        tracing::info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Starting poll scheduler"
        );

        // Initial sweep runs synchronously before the loop is scheduled.
        Self::run_sweep(&self.engine, &self.store, &self.sweeps_completed).await;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = self.engine.clone();
        let store = self.store.clone();
        let sweeps = self.sweeps_completed.clone();
        let sweep_interval = self.sweep_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial sweep
            // already ran, so consume it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::run_sweep(&engine, &store, &sweeps).await;
                    }
                    _ = stop_rx.changed() => {
                        break;
                    }
                }
            }

            tracing::info!("Poll scheduler loop exited");
        });

        *self.stop_tx.lock().await = Some(stop_tx);
        *self.handle.lock().await = Some(handle);
    }

    /// Stop the scheduler and join the background loop with a bounded wait.
    pub async fn stop(&self) {
        {
            let running = self.running.read().await;
            if !*running {
                tracing::warn!("Poll scheduler is not running");
                return;
            }
        }

        tracing::info!("Stopping poll scheduler");

        if let Some(stop_tx) = self.stop_tx.lock().await.take() {
            // Receiver may already be gone if the loop panicked.
            let _ = stop_tx.send(true);
        }

        if let Some(mut handle) = self.handle.lock().await.take() {
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!(
                    timeout_secs = STOP_JOIN_TIMEOUT.as_secs(),
                    "Poll scheduler did not stop in time, aborting task"
                );
                handle.abort();
            }
        }

        *self.running.write().await = false;
        tracing::info!("Poll scheduler stopped");
    }

    /// Whether the scheduler is currently running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Completed sweep count (including the initial immediate sweep)
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed.load(Ordering::Relaxed)
    }

    /// Current status document
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            is_running: self.is_running().await,
            interval_secs: self.sweep_interval.as_secs(),
            sweeps_completed: self.sweeps_completed(),
        }
    }

    /// One sweep: validate every camera with a pending record, sequentially.
    async fn run_sweep(
        engine: &ValidationEngine,
        store: &Arc<dyn RecordStore>,
        sweeps_completed: &AtomicU64,
    ) {
        if let Err(e) = Self::sweep_once(engine, store).await {
            tracing::error!(error = %e, "Validation sweep failed");
        }
        sweeps_completed.fetch_add(1, Ordering::Relaxed);
    }

    async fn sweep_once(engine: &ValidationEngine, store: &Arc<dyn RecordStore>) -> Result<()> {
        let cameras = store.list_pending_cameras().await?;

        if cameras.is_empty() {
            tracing::info!("No cameras with pending records");
            return Ok(());
        }

        tracing::info!(camera_count = cameras.len(), "Starting validation sweep");

        let mut processed = 0usize;
        let mut violations = 0usize;

        for camera_id in cameras {
            match engine.validate_camera(&camera_id, None, None).await {
                Ok(record) => {
                    processed += 1;
                    if let Some(alert) = alert::generate(&record) {
                        violations += alert.violations.len();
                        tracing::warn!(
                            camera_id = %camera_id,
                            violations = ?alert.violations,
                            priority = ?alert.priority,
                            confidence = alert.confidence,
                            "Safety alert"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(
                        camera_id = %camera_id,
                        error = %e,
                        "Camera validation failed, continuing sweep"
                    );
                }
            }
        }

        tracing::info!(
            cameras_processed = processed,
            true_positives = violations,
            "Validation sweep complete"
        );

        Ok(())
    }
}
