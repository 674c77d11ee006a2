//! Detection record data model
//!
//! One `DetectionRecord` per (camera_id, timestamp) pair. Created by the
//! edge sweep at `pending_validation`, mutated exactly once by the
//! validation engine (validation results + final decision + status flip).
//! The record store owns persistence; the core only holds transient copies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The six fixed safety scenarios.
///
/// Variant order is the processing order everywhere (sweeps, maps, final
/// decisions), which keeps runs repeatable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    SmokeDetection,
    FireDetection,
    FallDetection,
    DebrisDetection,
    MissingFireExtinguisher,
    UnattendedObject,
}

impl Scenario {
    /// All supported scenarios, in processing order.
    pub const ALL: [Scenario; 6] = [
        Scenario::SmokeDetection,
        Scenario::FireDetection,
        Scenario::FallDetection,
        Scenario::DebrisDetection,
        Scenario::MissingFireExtinguisher,
        Scenario::UnattendedObject,
    ];

    /// Wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::SmokeDetection => "smoke_detection",
            Scenario::FireDetection => "fire_detection",
            Scenario::FallDetection => "fall_detection",
            Scenario::DebrisDetection => "debris_detection",
            Scenario::MissingFireExtinguisher => "missing_fire_extinguisher",
            Scenario::UnattendedObject => "unattended_object",
        }
    }

    /// Human-readable name ("smoke detection").
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown scenario: {}", s)))
    }
}

/// Record lifecycle status. Transitions only forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    PendingValidation,
    ValidationComplete,
}

/// Stage-1 outcome for a single scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Any positive frame marks the scenario detected (OR semantics).
    pub detected: bool,
    /// Narrative composed from the per-frame model responses.
    pub response: String,
    /// Frames with a positive verdict. Always <= total_frames.
    pub detected_frames: u32,
    /// Frames that yielded a model response at all.
    pub total_frames: u32,
}

/// Stage-2 outcome for a single scenario.
///
/// A failed validation call keeps `success = false` and counts as a false
/// positive downstream ("could not confirm", not "no data").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub is_valid: bool,
    /// Combined edge/validation confidence in [0, 1].
    pub confidence: f64,
    pub edge_response: String,
    pub validation_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final true/false-positive partition over the edge-detected scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalDecision {
    pub true_positives: Vec<Scenario>,
    pub false_positives: Vec<Scenario>,
    /// Mean confidence over successful validation calls; 0.0 if none.
    pub confidence: f64,
}

impl FinalDecision {
    pub fn violations_detected(&self) -> bool {
        !self.true_positives.is_empty()
    }
}

/// One detection record per (camera, clip).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub camera_id: String,
    /// RFC 3339 timestamp of the edge sweep.
    pub timestamp: String,
    /// Clip or image locator the record was produced from.
    pub source_ref: String,
    pub scenario_results: BTreeMap<Scenario, ScenarioResult>,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validation_results: BTreeMap<Scenario, ValidationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_decision: Option<FinalDecision>,
}

impl DetectionRecord {
    /// Create a fresh record awaiting validation.
    pub fn new(
        camera_id: impl Into<String>,
        timestamp: impl Into<String>,
        source_ref: impl Into<String>,
        scenario_results: BTreeMap<Scenario, ScenarioResult>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            timestamp: timestamp.into(),
            source_ref: source_ref.into(),
            scenario_results,
            status: RecordStatus::PendingValidation,
            validation_results: BTreeMap::new(),
            final_decision: None,
        }
    }

    /// Scenarios the edge sweep flagged, in processing order.
    pub fn detected_scenarios(&self) -> Vec<Scenario> {
        self.scenario_results
            .iter()
            .filter(|(_, result)| result.detected)
            .map(|(scenario, _)| *scenario)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(detected: bool) -> ScenarioResult {
        ScenarioResult {
            detected,
            response: "test".to_string(),
            detected_frames: if detected { 1 } else { 0 },
            total_frames: 3,
        }
    }

    #[test]
    fn scenario_roundtrip() {
        for scenario in Scenario::ALL {
            let parsed: Scenario = scenario.as_str().parse().unwrap();
            assert_eq!(parsed, scenario);

            let json = serde_json::to_string(&scenario).unwrap();
            assert_eq!(json, format!("\"{}\"", scenario.as_str()));
        }
        assert!("smoke".parse::<Scenario>().is_err());
    }

    #[test]
    fn detected_scenarios_in_processing_order() {
        let mut results = BTreeMap::new();
        results.insert(Scenario::UnattendedObject, result(true));
        results.insert(Scenario::SmokeDetection, result(true));
        results.insert(Scenario::FireDetection, result(false));

        let record = DetectionRecord::new("CAMERA_001", "2026-01-01T00:00:00Z", "clip.mp4", results);
        assert_eq!(
            record.detected_scenarios(),
            vec![Scenario::SmokeDetection, Scenario::UnattendedObject]
        );
        assert_eq!(record.status, RecordStatus::PendingValidation);
    }

    #[test]
    fn record_serde_uses_wire_names() {
        let mut results = BTreeMap::new();
        results.insert(Scenario::SmokeDetection, result(true));
        let record = DetectionRecord::new("CAMERA_001", "2026-01-01T00:00:00Z", "clip.mp4", results);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "pending_validation");
        assert!(json["scenario_results"]["smoke_detection"]["detected"]
            .as_bool()
            .unwrap());
        // Untouched optional sections stay off the wire.
        assert!(json.get("final_decision").is_none());
    }
}
