//! ValidationEngine - Stage-2 Confirmation
//!
//! ## Responsibilities
//!
//! - Re-examine scenarios the edge sweep flagged with a closed yes/no prompt
//! - Compute per-scenario and overall confidence scores
//! - Partition edge detections into true and false positives
//! - Write the completed record back to the store
//!
//! Stage 1 casts a wide net; this pass narrows it. Scenarios the edge did
//! not flag are never re-examined, and a failed confirmation call counts as
//! "could not confirm" — a false positive, not missing data.

use crate::classifier::classify_validation;
use crate::error::{Error, Result};
use crate::prompts;
use crate::record::{
    DetectionRecord, FinalDecision, RecordStatus, Scenario, ValidationOutcome,
};
use crate::record_store::{RecordStore, ValidationUpdate};
use crate::vision_client::{placeholder_jpeg, VisionClient};
use std::collections::BTreeMap;
use std::sync::Arc;

/// ValidationEngine instance
pub struct ValidationEngine {
    client: Arc<VisionClient>,
    store: Arc<dyn RecordStore>,
}

impl ValidationEngine {
    /// Create new ValidationEngine
    pub fn new(client: Arc<VisionClient>, store: Arc<dyn RecordStore>) -> Self {
        Self { client, store }
    }

    /// Confirm one scenario against its stage-1 narrative.
    ///
    /// Uses the supplied still image when present, otherwise a 1x1
    /// placeholder (text-only confirmation degraded mode).
    pub async fn validate_scenario(
        &self,
        scenario: Scenario,
        edge_response: &str,
        image: Option<&[u8]>,
    ) -> ValidationOutcome {
        let prompt = prompts::validation_prompt(scenario, edge_response);
        let image = image.unwrap_or(placeholder_jpeg());

        match self.client.query(image, &prompt).await {
            Ok(reply) => {
                let validation_response = reply.answer.trim().to_lowercase();
                let is_valid = classify_validation(&validation_response);
                let confidence = score_confidence(edge_response, &validation_response);

                tracing::debug!(
                    scenario = %scenario,
                    is_valid,
                    confidence,
                    "Scenario validated"
                );

                ValidationOutcome {
                    success: true,
                    is_valid,
                    confidence,
                    edge_response: edge_response.to_string(),
                    validation_response,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    scenario = %scenario,
                    error = %e,
                    "Validation query failed, treating as unconfirmed"
                );
                ValidationOutcome {
                    success: false,
                    is_valid: false,
                    confidence: 0.0,
                    edge_response: edge_response.to_string(),
                    validation_response: String::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Run the full validation pass for one camera.
    ///
    /// Fetches the pending record (most recent when `timestamp` is `None`),
    /// confirms each edge-detected scenario sequentially, writes the
    /// completed record back, and returns it. When the edge sweep detected
    /// nothing, the record is returned unchanged without contacting the
    /// model or the store.
    pub async fn validate_camera(
        &self,
        camera_id: &str,
        timestamp: Option<&str>,
        image: Option<&[u8]>,
    ) -> Result<DetectionRecord> {
        let Some(mut record) = self.store.retrieve(camera_id, timestamp).await? else {
            return Err(Error::NoPendingData(format!(
                "no detection record for camera {}",
                camera_id
            )));
        };

        // Status only moves forward; a completed record reads back as-is.
        if record.status == RecordStatus::ValidationComplete {
            tracing::debug!(
                camera_id = %camera_id,
                timestamp = %record.timestamp,
                "Record already validated"
            );
            return Ok(record);
        }

        let detected = record.detected_scenarios();
        if detected.is_empty() {
            tracing::info!(
                camera_id = %camera_id,
                "No scenarios detected at edge level, nothing to validate"
            );
            return Ok(record);
        }

        tracing::info!(
            camera_id = %camera_id,
            timestamp = %record.timestamp,
            scenarios = ?detected,
            "Validating edge detections"
        );

        let mut validation_results: BTreeMap<Scenario, ValidationOutcome> = BTreeMap::new();
        for scenario in &detected {
            let edge_response = record
                .scenario_results
                .get(scenario)
                .map(|r| r.response.clone())
                .unwrap_or_default();
            let outcome = self
                .validate_scenario(*scenario, &edge_response, image)
                .await;
            validation_results.insert(*scenario, outcome);
        }

        let mut true_positives = Vec::new();
        let mut false_positives = Vec::new();
        for (scenario, outcome) in &validation_results {
            if outcome.success && outcome.is_valid {
                true_positives.push(*scenario);
            } else {
                false_positives.push(*scenario);
            }
        }

        let decision = FinalDecision {
            true_positives,
            false_positives,
            confidence: overall_confidence(&validation_results),
        };

        record.validation_results = validation_results.clone();
        record.final_decision = Some(decision.clone());
        record.status = RecordStatus::ValidationComplete;

        let update = ValidationUpdate {
            validation_results,
            final_decision: decision,
            status: RecordStatus::ValidationComplete,
        };
        if !self
            .store
            .update_validation(camera_id, &record.timestamp, &update)
            .await?
        {
            return Err(Error::Store(format!(
                "validation update rejected for camera {}",
                camera_id
            )));
        }

        let decision = &update.final_decision;
        tracing::info!(
            camera_id = %camera_id,
            true_positives = decision.true_positives.len(),
            false_positives = decision.false_positives.len(),
            confidence = decision.confidence,
            "Validation complete"
        );

        Ok(record)
    }
}

/// Combined confidence for one scenario: mean of edge and validation
/// response clarity scores.
fn score_confidence(edge_response: &str, validation_response: &str) -> f64 {
    let edge = if edge_response.trim().len() > 10 {
        0.8
    } else {
        0.5
    };
    let validation = if matches!(validation_response.trim(), "yes" | "no" | "true" | "false") {
        0.9
    } else {
        0.6
    };
    (edge + validation) / 2.0
}

/// Mean confidence over successful validation calls; 0.0 if none succeeded.
fn overall_confidence(results: &BTreeMap<Scenario, ValidationOutcome>) -> f64 {
    let successful: Vec<f64> = results
        .values()
        .filter(|outcome| outcome.success)
        .map(|outcome| outcome.confidence)
        .collect();

    if successful.is_empty() {
        return 0.0;
    }
    successful.iter().sum::<f64>() / successful.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: bool, confidence: f64) -> ValidationOutcome {
        ValidationOutcome {
            success,
            is_valid: success,
            confidence,
            edge_response: String::new(),
            validation_response: String::new(),
            error: None,
        }
    }

    #[test]
    fn confidence_rewards_clear_responses() {
        // Narrative over 10 chars + exact yes/no answer.
        assert!((score_confidence("fire detected", "yes") - 0.85).abs() < 1e-9);
        // Short narrative, exact answer.
        assert!((score_confidence("fire", "no") - 0.7).abs() < 1e-9);
        // Long narrative, rambling answer.
        assert!(
            (score_confidence("fire detected near exit", "i think there is fire") - 0.7).abs()
                < 1e-9
        );
        // Short narrative, rambling answer.
        assert!((score_confidence("fire", "unsure") - 0.55).abs() < 1e-9);
    }

    #[test]
    fn overall_confidence_ignores_failed_calls() {
        let mut results = BTreeMap::new();
        results.insert(Scenario::SmokeDetection, outcome(true, 0.85));
        results.insert(Scenario::FireDetection, outcome(false, 0.0));
        results.insert(Scenario::FallDetection, outcome(true, 0.7));

        let overall = overall_confidence(&results);
        assert!((overall - 0.775).abs() < 1e-9);
    }

    #[test]
    fn overall_confidence_is_zero_without_successes() {
        let mut results = BTreeMap::new();
        results.insert(Scenario::SmokeDetection, outcome(false, 0.0));
        assert_eq!(overall_confidence(&results), 0.0);

        assert_eq!(overall_confidence(&BTreeMap::new()), 0.0);
    }
}
