//! Async analysis job tracking
//!
//! Maps job id -> status record for the async analyze endpoint. After
//! creation, only the spawned worker task mutates a job, so each job has a
//! single writer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One async analysis job
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: Uuid,
    pub camera_id: String,
    pub timestamp: String,
    pub status: JobStatus,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JobStore instance
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    /// Create new JobStore
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Create a pending job
    pub async fn create(&self, camera_id: &str, timestamp: &str) -> Job {
        let job = Job {
            job_id: Uuid::new_v4(),
            camera_id: camera_id.to_string(),
            timestamp: timestamp.to_string(),
            status: JobStatus::Pending,
            created_at: Utc::now().to_rfc3339(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        };

        let mut jobs = self.jobs.write().await;
        jobs.insert(job.job_id, job.clone());
        job
    }

    /// Mark a job as processing
    pub async fn mark_processing(&self, job_id: Uuid) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now().to_rfc3339());
        }
    }

    /// Complete a job with its result document
    pub async fn complete(&self, job_id: Uuid, result: serde_json::Value) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Completed;
            job.finished_at = Some(Utc::now().to_rfc3339());
            job.result = Some(result);
        }
    }

    /// Fail a job with an error message
    pub async fn fail(&self, job_id: Uuid, error: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = JobStatus::Failed;
            job.finished_at = Some(Utc::now().to_rfc3339());
            job.error = Some(error);
        }
    }

    /// Fetch a job by id
    pub async fn get(&self, job_id: Uuid) -> Option<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(&job_id).cloned()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_lifecycle() {
        let store = JobStore::new();
        let job = store.create("CAMERA_001", "2026-08-07T10:00:00Z").await;
        assert_eq!(job.status, JobStatus::Pending);

        store.mark_processing(job.job_id).await;
        assert_eq!(
            store.get(job.job_id).await.unwrap().status,
            JobStatus::Processing
        );

        store
            .complete(job.job_id, serde_json::json!({"success": true}))
            .await;
        let done = store.get(job.job_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.finished_at.is_some());
        assert!(done.result.is_some());

        assert!(store.get(Uuid::new_v4()).await.is_none());
    }
}
