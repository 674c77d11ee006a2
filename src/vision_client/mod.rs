//! VisionClient - Inference Endpoint Adapter
//!
//! ## Responsibilities
//!
//! - Send one (image, question) pair to the vision-query endpoint
//! - Retry/backoff on transport failures
//! - Fail fast on rate limiting (backpressure, not a transient error)

use crate::error::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

/// Request timeout per query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Attempts per query (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;

/// Base of the retry backoff: `BACKOFF_BASE_SECS * 1.5^attempt`.
const BACKOFF_BASE_SECS: f64 = 2.0;

/// Query request (matches the endpoint's /v1/query contract)
#[derive(Debug, Clone, Serialize)]
struct QueryRequest {
    image_url: String,
    question: String,
}

/// Query reply body
#[derive(Debug, Clone, Deserialize)]
struct QueryReply {
    answer: String,
}

/// Successful query outcome.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// Trimmed answer text.
    pub answer: String,
    /// Retries performed before this answer (0 on first-attempt success).
    pub retries: u32,
}

/// Vision query client
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    backoff_base_secs: f64,
}

impl VisionClient {
    /// Create new client against `{base_url}/v1/query`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, QUERY_TIMEOUT)
    }

    /// Create new client with custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            backoff_base_secs: BACKOFF_BASE_SECS,
        }
    }

    /// Override the backoff base (test hook)
    pub fn with_backoff_base(mut self, secs: f64) -> Self {
        self.backoff_base_secs = secs;
        self
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one (image, question) pair and return the answer text.
    ///
    /// The JPEG bytes are base64-encoded once per call. Transport failures
    /// and non-2xx statuses (other than 429) are retried up to
    /// [`MAX_ATTEMPTS`] with `base * 1.5^attempt` backoff before each retry;
    /// a 429 fails immediately with [`Error::RateLimited`].
    pub async fn query(&self, image: &[u8], prompt: &str) -> Result<QueryResponse> {
        let url = format!("{}/v1/query", self.base_url);

        let image_url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        let request = QueryRequest {
            image_url,
            question: prompt.to_string(),
        };

        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = self.backoff_base_secs * 1.5f64.powi(attempt as i32);
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            }

            match self.client.post(&url).json(&request).send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!(url = %url, "Inference endpoint rate limited");
                    return Err(Error::RateLimited);
                }
                Ok(resp) if resp.status().is_success() => {
                    let reply: QueryReply = resp.json().await?;
                    return Ok(QueryResponse {
                        answer: reply.answer.trim().to_string(),
                        retries: attempt,
                    });
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    last_error = format!("{} - {}", status, body.trim());
                    tracing::warn!(
                        attempt = attempt + 1,
                        status = %status,
                        "Inference query failed, will retry"
                    );
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "Inference request error, will retry"
                    );
                }
            }
        }

        Err(Error::Unreachable(last_error))
    }

    /// Check endpoint connectivity with a single placeholder query (no retries)
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/v1/query", self.base_url);
        let request = QueryRequest {
            image_url: format!(
                "data:image/jpeg;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(placeholder_jpeg())
            ),
            question: "What do you see? Answer Yes or No.".to_string(),
        };

        match self.client.post(&url).json(&request).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

static PLACEHOLDER_JPEG: LazyLock<Vec<u8>> = LazyLock::new(|| {
    let pixel = image::RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
    encoder
        .encode_image(&pixel)
        .expect("encoding a 1x1 JPEG into memory cannot fail");
    buf
});

/// 1x1 white JPEG for text-only confirmation queries and health checks.
pub fn placeholder_jpeg() -> &'static [u8] {
    &PLACEHOLDER_JPEG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_jpeg() {
        let bytes = placeholder_jpeg();
        // SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(bytes.len() > 100);
    }

    #[test]
    fn request_serializes_as_data_url() {
        let request = QueryRequest {
            image_url: "data:image/jpeg;base64,AAAA".to_string(),
            question: "Do you see smoke?".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["image_url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert_eq!(json["question"], "Do you see smoke?");
    }
}
