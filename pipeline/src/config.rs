//! Process-wide pipeline configuration.
//!
//! One `PipelineConfig` is constructed at startup (env-driven, like the rest
//! of the deployment) and passed explicitly into the orchestrator, the
//! deliberation engine, and the status publisher — no module-level client
//! state anywhere.

use anyhow::{Context, Result};
use rig::providers::openai;
use std::time::Duration;

/// OpenAI-compatible endpoint serving the deliberation roles.
#[derive(Debug, Clone)]
pub struct ReasonerEndpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reasoning backend shared by all non-coordinator roles.
    pub reasoner: ReasonerEndpoint,
    /// Extraction service base URL.
    pub extraction_url: String,
    /// Web search service base URL.
    pub search_url: String,
    /// Full round-robin rounds before the engine gives up.
    pub max_rounds: u32,
    /// Cadence of status snapshots pushed to stream subscribers.
    pub publish_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reasoner: ReasonerEndpoint {
                url: env_or("FACTCHECK_REASONER_URL", "http://localhost:8080/v1"),
                api_key: env_or("FACTCHECK_REASONER_API_KEY", "not-needed"),
                model: env_or("FACTCHECK_REASONER_MODEL", "gemini-2.5-flash"),
            },
            extraction_url: env_or("FACTCHECK_EXTRACTOR_URL", "http://localhost:8090"),
            search_url: env_or("FACTCHECK_SEARCH_URL", "http://localhost:8091"),
            max_rounds: 6,
            publish_interval: Duration::from_secs(2),
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.into())
}

/// Pre-built rig client for the reasoning endpoint.
///
/// Role selection happens per request via the role's system message — one
/// client serves the whole roster.
pub struct ClientSet {
    pub reasoner: openai::CompletionsClient,
}

impl ClientSet {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let reasoner = openai::CompletionsClient::builder()
            .api_key(&config.reasoner.api_key)
            .base_url(&config.reasoner.url)
            .build()
            .context("Failed to build reasoner client")?;

        Ok(Self { reasoner })
    }
}

/// Check if an inference endpoint is reachable (GET /models).
pub async fn check_endpoint(url: &str) -> bool {
    let models_url = format!("{url}/models");
    match reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}
