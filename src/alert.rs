//! Alert construction for confirmed violations
//!
//! Alerts are derived from a validated record and handed to callers (the
//! scheduler log stream, the web API response); the core never persists
//! them.

use crate::record::{DetectionRecord, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alert priority. `Low` exists in the contract but the current policy
/// only ever emits `Medium` or `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

/// Alert payload for a record with confirmed true positives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub camera_id: String,
    pub timestamp: String,
    /// Confirmed scenarios, in processing order.
    pub violations: Vec<Scenario>,
    pub priority: AlertPriority,
    pub confidence: f64,
    pub recommended_actions: BTreeMap<Scenario, String>,
    pub message: String,
}

/// Recommended response for a confirmed scenario, with a generic fallback
/// for scenario names the table does not know.
pub fn recommended_action(scenario: &str) -> &'static str {
    match scenario {
        "smoke_detection" => "Immediately investigate source of smoke and evacuate if necessary",
        "fire_detection" => "Activate fire alarm, call emergency services, and evacuate area",
        "fall_detection" => "Provide immediate medical assistance and secure the area",
        "debris_detection" => "Clear debris and investigate source of obstruction",
        "missing_fire_extinguisher" => "Replace missing fire extinguisher immediately",
        "unattended_object" => "Investigate unattended object and remove if safe to do so",
        _ => "Investigate and take appropriate safety measures",
    }
}

/// Build an alert from a validated record; `None` when there is nothing to
/// alert on (no final decision yet, or no true positives).
pub fn generate(record: &DetectionRecord) -> Option<Alert> {
    let decision = record.final_decision.as_ref()?;
    if decision.true_positives.is_empty() {
        return None;
    }

    let violations = decision.true_positives.clone();
    let priority = if decision.confidence > 0.8 {
        AlertPriority::High
    } else {
        AlertPriority::Medium
    };

    let recommended_actions = violations
        .iter()
        .map(|s| (*s, recommended_action(s.as_str()).to_string()))
        .collect();

    let names: Vec<&str> = violations.iter().map(|s| s.as_str()).collect();
    let message = format!("Safety violations detected: {}", names.join(", "));

    Some(Alert {
        camera_id: record.camera_id.clone(),
        timestamp: record.timestamp.clone(),
        violations,
        priority,
        confidence: decision.confidence,
        recommended_actions,
        message,
    })
}
