//! File-backed record store
//!
//! One JSON document per record, named `{camera_id}_{timestamp}.json` with
//! the timestamp sanitized for the filesystem. "Most recent" resolution
//! uses file modification time.

use super::{sanitize_timestamp, RecordStore, ValidationUpdate};
use crate::error::{Error, Result};
use crate::record::{DetectionRecord, RecordStatus};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

pub struct LocalRecordStore {
    dir: PathBuf,
}

impl LocalRecordStore {
    /// Create the store, ensuring the data directory exists
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn record_path(&self, camera_id: &str, timestamp: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", camera_id, sanitize_timestamp(timestamp)))
    }

    /// Files belonging to `camera_id`, optionally filtered by timestamp.
    async fn matching_files(
        &self,
        camera_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}_", camera_id);
        let needle = timestamp.map(sanitize_timestamp);

        let mut matches = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) || !name.ends_with(".json") {
                continue;
            }
            if let Some(ref needle) = needle {
                if !name.contains(needle.as_str()) {
                    continue;
                }
            }
            matches.push(entry.path());
        }

        Ok(matches)
    }

    async fn load(&self, path: &Path) -> Result<DetectionRecord> {
        let data = fs::read(path).await?;
        let record = serde_json::from_slice(&data)?;
        Ok(record)
    }

    async fn write(&self, path: &Path, record: &DetectionRecord) -> Result<()> {
        let data = serde_json::to_vec_pretty(record)?;
        fs::write(path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn store(&self, record: &DetectionRecord) -> Result<bool> {
        let path = self.record_path(&record.camera_id, &record.timestamp);
        self.write(&path, record).await?;

        tracing::debug!(
            camera_id = %record.camera_id,
            path = %path.display(),
            "Stored detection record"
        );
        Ok(true)
    }

    async fn retrieve(
        &self,
        camera_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<DetectionRecord>> {
        let matches = self.matching_files(camera_id, timestamp).await?;
        if matches.is_empty() {
            return Ok(None);
        }

        // Most recent by write time.
        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for path in matches {
            let modified = fs::metadata(&path).await?.modified()?;
            if latest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
                latest = Some((modified, path));
            }
        }

        match latest {
            Some((_, path)) => Ok(Some(self.load(&path).await?)),
            None => Ok(None),
        }
    }

    async fn list_pending_cameras(&self) -> Result<Vec<String>> {
        let mut cameras = BTreeSet::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match self.load(&path).await {
                Ok(record) if record.status == RecordStatus::PendingValidation => {
                    cameras.insert(record.camera_id);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable record file"
                    );
                }
            }
        }

        Ok(cameras.into_iter().collect())
    }

    async fn update_validation(
        &self,
        camera_id: &str,
        timestamp: &str,
        update: &ValidationUpdate,
    ) -> Result<bool> {
        let matches = self.matching_files(camera_id, Some(timestamp)).await?;
        let Some(path) = matches.into_iter().next() else {
            tracing::warn!(
                camera_id = %camera_id,
                timestamp = %timestamp,
                "No record found to update"
            );
            return Ok(false);
        };

        let mut record = self.load(&path).await?;
        if record.status == RecordStatus::ValidationComplete {
            return Err(Error::Store(format!(
                "record {}/{} already validated",
                camera_id, timestamp
            )));
        }

        record.validation_results = update.validation_results.clone();
        record.final_decision = Some(update.final_decision.clone());
        record.status = update.status;
        self.write(&path, &record).await?;

        tracing::debug!(
            camera_id = %camera_id,
            timestamp = %timestamp,
            "Updated validation status"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FinalDecision, Scenario, ScenarioResult};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn record(camera_id: &str, timestamp: &str, detected: bool) -> DetectionRecord {
        let mut results = BTreeMap::new();
        results.insert(
            Scenario::SmokeDetection,
            ScenarioResult {
                detected,
                response: "smoke haze near the exit".to_string(),
                detected_frames: if detected { 2 } else { 0 },
                total_frames: 3,
            },
        );
        DetectionRecord::new(camera_id, timestamp, "clip.mp4", results)
    }

    #[tokio::test]
    async fn store_and_retrieve_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(dir.path()).await.unwrap();

        let original = record("CAMERA_001", "2026-08-07T10:00:00Z", true);
        assert!(store.store(&original).await.unwrap());

        let loaded = store
            .retrieve("CAMERA_001", Some("2026-08-07T10:00:00Z"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.camera_id, "CAMERA_001");
        assert_eq!(loaded.detected_scenarios(), vec![Scenario::SmokeDetection]);

        assert!(store.retrieve("CAMERA_002", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn retrieve_without_timestamp_returns_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(dir.path()).await.unwrap();

        store
            .store(&record("CAMERA_001", "2026-08-07T10:00:00Z", false))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .store(&record("CAMERA_001", "2026-08-07T11:00:00Z", true))
            .await
            .unwrap();

        let latest = store.retrieve("CAMERA_001", None).await.unwrap().unwrap();
        assert_eq!(latest.timestamp, "2026-08-07T11:00:00Z");
    }

    #[tokio::test]
    async fn pending_cameras_excludes_validated_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(dir.path()).await.unwrap();

        store
            .store(&record("CAMERA_B", "2026-08-07T10:00:00Z", true))
            .await
            .unwrap();
        store
            .store(&record("CAMERA_A", "2026-08-07T10:00:00Z", true))
            .await
            .unwrap();

        // Sorted, both pending.
        assert_eq!(
            store.list_pending_cameras().await.unwrap(),
            vec!["CAMERA_A".to_string(), "CAMERA_B".to_string()]
        );

        let update = ValidationUpdate {
            validation_results: BTreeMap::new(),
            final_decision: FinalDecision {
                true_positives: vec![],
                false_positives: vec![Scenario::SmokeDetection],
                confidence: 0.65,
            },
            status: RecordStatus::ValidationComplete,
        };
        assert!(store
            .update_validation("CAMERA_A", "2026-08-07T10:00:00Z", &update)
            .await
            .unwrap());

        assert_eq!(
            store.list_pending_cameras().await.unwrap(),
            vec!["CAMERA_B".to_string()]
        );

        let updated = store.retrieve("CAMERA_A", None).await.unwrap().unwrap();
        assert_eq!(updated.status, RecordStatus::ValidationComplete);
        assert!(updated.final_decision.is_some());
    }

    #[tokio::test]
    async fn update_missing_record_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRecordStore::new(dir.path()).await.unwrap();

        let update = ValidationUpdate {
            validation_results: BTreeMap::new(),
            final_decision: FinalDecision {
                true_positives: vec![],
                false_positives: vec![],
                confidence: 0.0,
            },
            status: RecordStatus::ValidationComplete,
        };
        assert!(!store
            .update_validation("CAMERA_X", "2026-08-07T10:00:00Z", &update)
            .await
            .unwrap());
    }
}
