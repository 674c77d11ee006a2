//! Safewatch - Two-Stage Camera Safety Detection
//!
//! ## Architecture
//!
//! 1. VisionClient - retrying adapter for the vision-query endpoint
//! 2. Classifier - keyword-weight verdicts over free-text model output
//! 3. FrameSampler - ffmpeg frame extraction from short clips
//! 4. EdgeAnalyzer - stage-1 wide-net sweep over all six scenarios
//! 5. RecordStore - detection record persistence (local file or remote API)
//! 6. ValidationEngine - stage-2 confirmation into true/false positives
//! 7. Alert - priority + recommended actions for confirmed violations
//! 8. PollScheduler - periodic validation sweeps across pending cameras
//! 9. WebAPI - REST endpoints + async job tracking
//!
//! ## Design Principles
//!
//! - Failures are contained at the smallest unit (frame, scenario, camera)
//! - Sequential model traffic: one query in flight per sweep
//! - Records are fetched, mutated whole, and written back whole

pub mod alert;
pub mod classifier;
pub mod edge_analyzer;
pub mod error;
pub mod frame_sampler;
pub mod models;
pub mod poll_scheduler;
pub mod prompts;
pub mod record;
pub mod record_store;
pub mod state;
pub mod validation_engine;
pub mod vision_client;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
