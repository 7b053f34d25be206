//! Extraction service contract and HTTP client.
//!
//! Raw media acquisition (download, audio transcription, frame OCR) lives in
//! a separate service; the pipeline only consumes its `extract` contract.
//! One attempt per job — retry policy, if any, belongs to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Hard failure from the extraction service (unreachable source, download or
/// decode error). Empty text is not an extraction failure — the orchestrator
/// classifies that separately.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ExtractionFailure(pub String);

/// Descriptive fields of a media item, as reported by the extraction service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub channel_name: Option<String>,
}

/// Contract consumed by the orchestrator.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Derive plain text (transcript + on-screen text) from the media URL.
    async fn extract(&self, url: &str) -> Result<String, ExtractionFailure>;

    /// Best-effort metadata probe. `None` means unavailable; never fatal.
    async fn metadata(&self, url: &str) -> Option<MediaMetadata> {
        let _ = url;
        None
    }
}

/// HTTP client for a deployed extraction service.
pub struct HttpExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct ExtractResponse {
    text: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl MediaExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<String, ExtractionFailure> {
        let resp = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| ExtractionFailure(format!("extraction service unreachable: {e}")))?;

        let body: ExtractResponse = resp
            .json()
            .await
            .map_err(|e| ExtractionFailure(format!("invalid extraction response: {e}")))?;

        if let Some(reason) = body.error {
            return Err(ExtractionFailure(reason));
        }
        Ok(body.text.unwrap_or_default())
    }

    async fn metadata(&self, url: &str) -> Option<MediaMetadata> {
        let resp = self
            .client
            .get(format!("{}/metadata", self.base_url))
            .query(&[("url", url)])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            debug!(url, status = %resp.status(), "metadata probe declined");
            return None;
        }
        resp.json().await.ok()
    }
}
