//! Reasoner contract and the rig-backed implementation.
//!
//! A reasoner is opaque: given a role description and the shared transcript,
//! it returns the role's next turn as text. It may be slow and it may return
//! malformed output — both are the engine's problem, not the reasoner's.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::deliberation::{RoleSpec, Turn};

#[derive(Debug, Error)]
#[error("reasoner failure: {0}")]
pub struct ReasonerError(pub String);

/// Opaque reasoning backend for the deliberation roles.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn respond(&self, role: &RoleSpec, transcript: &[Turn]) -> Result<String, ReasonerError>;
}

/// Reasoner backed by an OpenAI-compatible completions endpoint.
///
/// A fresh agent is assembled per call with the role's system message as
/// preamble; the transcript is rendered into the user prompt.
pub struct OpenAiReasoner {
    client: openai::CompletionsClient,
    model: String,
}

impl OpenAiReasoner {
    pub fn new(client: openai::CompletionsClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn respond(&self, role: &RoleSpec, transcript: &[Turn]) -> Result<String, ReasonerError> {
        let agent = self
            .client
            .agent(&self.model)
            .name(role.name)
            .preamble(role.system_message)
            .temperature(0.2)
            .build();

        let prompt = render_transcript(transcript);
        prompt_with_retry(&agent, &prompt, 2)
            .await
            .map_err(|e| ReasonerError(e.to_string()))
    }
}

/// Render the transcript the way the conversation reads to a participant:
/// one block per turn, labeled with the speaker role.
fn render_transcript(transcript: &[Turn]) -> String {
    let mut rendered = String::new();
    for turn in transcript {
        rendered.push_str(&format!("[{}]\n{}\n\n", turn.role, turn.content));
    }
    rendered.push_str("It is now your turn to respond.");
    rendered
}

/// Prompt with exponential backoff on failure.
async fn prompt_with_retry(
    agent: &impl Prompt,
    prompt: &str,
    max_retries: u32,
) -> Result<String, rig::completion::PromptError> {
    let mut last_err = None;
    for attempt in 0..=max_retries {
        match agent.prompt(prompt).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt == max_retries {
                    return Err(e);
                }
                let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "Reasoner call failed — retrying"
                );
                last_err = Some(e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
    Err(last_err.unwrap())
}
