//! Remote HTTP record store
//!
//! Talks to the cloud record API: `POST /edge-results`, `GET /retrieve`,
//! `GET /pending-cameras`, `PUT /update-validation`. Absence (404 or
//! `success: false`) is `None`; other non-2xx statuses are store failures.

use super::{RecordStore, ValidationUpdate};
use crate::error::{Error, Result};
use crate::record::DetectionRecord;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

/// Request timeout for store operations.
const STORE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveReply {
    success: bool,
    data: Option<DetectionRecord>,
}

#[derive(Debug, Deserialize)]
struct PendingCamerasReply {
    cameras: Vec<String>,
}

impl HttpRecordStore {
    /// Create new store client
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(STORE_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn store(&self, record: &DetectionRecord) -> Result<bool> {
        let url = format!("{}/edge-results", self.base_url);
        let resp = self.with_auth(self.client.post(&url).json(record)).send().await?;

        if resp.status().is_success() {
            Ok(true)
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                camera_id = %record.camera_id,
                status = %status,
                body = %body.trim(),
                "Record store rejected edge results"
            );
            Ok(false)
        }
    }

    async fn retrieve(
        &self,
        camera_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<DetectionRecord>> {
        let url = format!("{}/retrieve", self.base_url);
        let mut params = vec![("camera_id", camera_id.to_string())];
        if let Some(ts) = timestamp {
            params.push(("timestamp", ts.to_string()));
        }

        let resp = self
            .with_auth(self.client.get(&url).query(&params))
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Error::Store(format!(
                "retrieve failed for camera {}: {}",
                camera_id,
                resp.status()
            )));
        }

        let reply: RetrieveReply = resp.json().await?;
        if !reply.success {
            return Ok(None);
        }
        Ok(reply.data)
    }

    async fn list_pending_cameras(&self) -> Result<Vec<String>> {
        let url = format!("{}/pending-cameras", self.base_url);
        let resp = self.with_auth(self.client.get(&url)).send().await?;

        if !resp.status().is_success() {
            return Err(Error::Store(format!(
                "pending-cameras failed: {}",
                resp.status()
            )));
        }

        let reply: PendingCamerasReply = resp.json().await?;
        let mut cameras = reply.cameras;
        cameras.sort();
        cameras.dedup();
        Ok(cameras)
    }

    async fn update_validation(
        &self,
        camera_id: &str,
        timestamp: &str,
        update: &ValidationUpdate,
    ) -> Result<bool> {
        let url = format!("{}/update-validation", self.base_url);
        let payload = serde_json::json!({
            "camera_id": camera_id,
            "timestamp": timestamp,
            "validation_results": update.validation_results,
            "final_decision": update.final_decision,
            "status": update.status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let resp = self
            .with_auth(self.client.put(&url).json(&payload))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(true)
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                camera_id = %camera_id,
                status = %status,
                body = %body.trim(),
                "Validation update rejected"
            );
            Ok(false)
        }
    }
}
