//! RecordStore - Detection Record Persistence
//!
//! ## Responsibilities
//!
//! - Store and fetch detection records by camera/timestamp
//! - List cameras with a pending (unvalidated) record
//! - Apply whole-record validation updates (last-writer-wins)
//!
//! Two interchangeable backends share the contract: a local file-backed
//! store for single-box deployments and testing, and a remote HTTP store.

mod http;
mod local;

pub use http::HttpRecordStore;
pub use local::LocalRecordStore;

use crate::error::Result;
use crate::record::{DetectionRecord, FinalDecision, RecordStatus, Scenario, ValidationOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation results applied to an existing record in one write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationUpdate {
    pub validation_results: BTreeMap<Scenario, ValidationOutcome>,
    pub final_decision: FinalDecision,
    pub status: RecordStatus,
}

/// Record persistence contract.
///
/// The core fetches a record, mutates it fully in memory, and writes it
/// back whole; backends only need last-writer-wins semantics.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record. `false` means the backend rejected the write.
    async fn store(&self, record: &DetectionRecord) -> Result<bool>;

    /// Fetch a record; most recent by write time when `timestamp` is `None`.
    async fn retrieve(
        &self,
        camera_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<DetectionRecord>>;

    /// Cameras with at least one record still pending validation, sorted.
    async fn list_pending_cameras(&self) -> Result<Vec<String>>;

    /// Apply validation results to the record at (camera_id, timestamp).
    /// `false` means no matching record or a rejected write.
    async fn update_validation(
        &self,
        camera_id: &str,
        timestamp: &str,
        update: &ValidationUpdate,
    ) -> Result<bool>;
}

/// Make an RFC 3339 timestamp filesystem- and URL-safe.
pub fn sanitize_timestamp(timestamp: &str) -> String {
    timestamp.replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_timestamps_have_no_colons_or_dots() {
        let sanitized = sanitize_timestamp("2026-08-07T12:34:56.789Z");
        assert!(!sanitized.contains(':'));
        assert!(!sanitized.contains('.'));
        assert_eq!(sanitized, "2026-08-07T12-34-56-789Z");
    }
}
