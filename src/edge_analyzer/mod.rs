//! EdgeAnalyzer - Stage-1 Wide-Net Detection
//!
//! ## Responsibilities
//!
//! - Query the vision model once per sampled frame per scenario
//! - Fold per-frame verdicts into one scenario verdict (OR semantics)
//! - Sweep all six scenarios over a clip and store the pending record
//!
//! A per-frame query failure is recorded as a failed frame entry and never
//! aborts the scenario; a scenario never aborts the sweep. Only an
//! unreadable clip is fatal to the sweep.

use crate::classifier::classify_detection;
use crate::error::{Error, Result};
use crate::frame_sampler::{FrameSampler, DEFAULT_TARGET_FRAMES};
use crate::prompts;
use crate::record::{DetectionRecord, Scenario, ScenarioResult};
use crate::record_store::RecordStore;
use crate::vision_client::VisionClient;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Outcome of a single frame query within one scenario.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Position in the sampled sequence (1-indexed).
    pub frame_number: usize,
    pub success: bool,
    pub response: Option<String>,
    pub detected: bool,
    pub error: Option<String>,
}

/// Full stage-1 result for one scenario over the sampled frames.
#[derive(Debug, Clone)]
pub struct ScenarioAnalysis {
    pub scenario: Scenario,
    pub detected: bool,
    /// Human-readable narrative composed from the frame responses.
    pub response: String,
    pub frame_results: Vec<FrameOutcome>,
    pub detected_frames: u32,
    pub total_frames: u32,
}

impl ScenarioAnalysis {
    fn to_result(&self) -> ScenarioResult {
        ScenarioResult {
            detected: self.detected,
            response: self.response.clone(),
            detected_frames: self.detected_frames,
            total_frames: self.total_frames,
        }
    }
}

/// EdgeAnalyzer instance
pub struct EdgeAnalyzer {
    client: Arc<VisionClient>,
    store: Arc<dyn RecordStore>,
    sampler: FrameSampler,
}

impl EdgeAnalyzer {
    /// Create new EdgeAnalyzer
    pub fn new(client: Arc<VisionClient>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            client,
            store,
            sampler: FrameSampler::new(),
        }
    }

    /// Analyze the sampled frames for one scenario.
    pub async fn analyze_scenario(
        &self,
        frames: &[Vec<u8>],
        scenario: Scenario,
    ) -> ScenarioAnalysis {
        let prompt = prompts::vision_prompt(scenario);
        let mut frame_results = Vec::with_capacity(frames.len());
        let mut detected_count = 0u32;

        for (i, frame) in frames.iter().enumerate() {
            let frame_number = i + 1;

            match self.client.query(frame, prompt).await {
                Ok(reply) => {
                    let detected = classify_detection(&reply.answer);
                    if detected {
                        detected_count += 1;
                    }
                    frame_results.push(FrameOutcome {
                        frame_number,
                        success: true,
                        response: Some(reply.answer),
                        detected,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        scenario = %scenario,
                        frame_number,
                        error = %e,
                        "Frame query failed"
                    );
                    frame_results.push(FrameOutcome {
                        frame_number,
                        success: false,
                        response: None,
                        detected: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let response = compose_response(&frame_results, scenario);

        ScenarioAnalysis {
            scenario,
            detected: detected_count > 0,
            response,
            frame_results,
            detected_frames: detected_count,
            total_frames: frames.len() as u32,
        }
    }

    /// Run the full edge sweep over a clip and store the pending record.
    ///
    /// Scenarios are processed sequentially in [`Scenario::ALL`] order so
    /// runs are repeatable and the inference endpoint sees bounded load.
    pub async fn run_sweep(&self, clip: &Path, camera_id: &str) -> Result<DetectionRecord> {
        tracing::info!(
            camera_id = %camera_id,
            clip = %clip.display(),
            "Starting edge sweep"
        );

        let frames = self.sampler.sample(clip, &DEFAULT_TARGET_FRAMES).await?;
        if frames.is_empty() {
            return Err(Error::ClipUnreadable(format!(
                "no frames extracted from {}",
                clip.display()
            )));
        }

        let mut scenario_results = BTreeMap::new();
        for scenario in Scenario::ALL {
            let analysis = self.analyze_scenario(&frames, scenario).await;
            tracing::info!(
                camera_id = %camera_id,
                scenario = %scenario,
                detected = analysis.detected,
                detected_frames = analysis.detected_frames,
                total_frames = analysis.total_frames,
                "Scenario analyzed"
            );
            scenario_results.insert(scenario, analysis.to_result());
        }

        let record = DetectionRecord::new(
            camera_id,
            Utc::now().to_rfc3339(),
            clip.display().to_string(),
            scenario_results,
        );

        if !self.store.store(&record).await? {
            return Err(Error::Store(format!(
                "store rejected edge results for camera {}",
                camera_id
            )));
        }

        tracing::info!(
            camera_id = %camera_id,
            detected_scenarios = ?record.detected_scenarios(),
            "Edge sweep complete"
        );

        Ok(record)
    }
}

/// Compose the scenario narrative from the per-frame outcomes.
fn compose_response(frame_results: &[FrameOutcome], scenario: Scenario) -> String {
    let successful: Vec<&str> = frame_results
        .iter()
        .filter(|f| f.success)
        .filter_map(|f| f.response.as_deref())
        .collect();

    if successful.is_empty() {
        return format!("No analysis available for {}", scenario);
    }
    if successful.len() == 1 {
        return successful[0].to_string();
    }

    let detections: Vec<&str> = frame_results
        .iter()
        .filter(|f| f.success && f.detected)
        .filter_map(|f| f.response.as_deref())
        .collect();

    if !detections.is_empty() {
        format!(
            "Analysis of {} frames indicates {} detection. Details: {}",
            successful.len(),
            scenario.display_name(),
            detections.join("; ")
        )
    } else {
        format!(
            "Analysis of {} frames indicates no {} detection. Details: {}",
            successful.len(),
            scenario.display_name(),
            successful.join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_frame(frame_number: usize, response: &str, detected: bool) -> FrameOutcome {
        FrameOutcome {
            frame_number,
            success: true,
            response: Some(response.to_string()),
            detected,
            error: None,
        }
    }

    fn failed_frame(frame_number: usize) -> FrameOutcome {
        FrameOutcome {
            frame_number,
            success: false,
            response: None,
            detected: false,
            error: Some("timeout".to_string()),
        }
    }

    #[test]
    fn no_successful_frames() {
        let response = compose_response(&[failed_frame(1), failed_frame(2)], Scenario::FireDetection);
        assert_eq!(response, "No analysis available for fire_detection");
    }

    #[test]
    fn single_successful_frame_is_verbatim() {
        let frames = [failed_frame(1), ok_frame(2, "I see smoke", true)];
        assert_eq!(
            compose_response(&frames, Scenario::SmokeDetection),
            "I see smoke"
        );
    }

    #[test]
    fn detected_frames_drive_the_summary() {
        let frames = [
            ok_frame(1, "I see smoke", true),
            ok_frame(2, "no smoke visible", false),
            ok_frame(3, "smoke detected", true),
        ];
        let response = compose_response(&frames, Scenario::SmokeDetection);
        assert_eq!(
            response,
            "Analysis of 3 frames indicates smoke detection detection. Details: I see smoke; smoke detected"
        );
    }

    #[test]
    fn all_negative_frames_report_no_detection() {
        let frames = [
            ok_frame(1, "the area is clear", false),
            ok_frame(2, "nothing on the floor", false),
        ];
        let response = compose_response(&frames, Scenario::DebrisDetection);
        assert_eq!(
            response,
            "Analysis of 2 frames indicates no debris detection detection. Details: the area is clear; nothing on the floor"
        );
    }
}
