//! Analysis failure taxonomy.
//!
//! Every failure inside a running job is recovered locally into the job's
//! terminal `failed` state — callers never see a raw error escape a worker,
//! only the eventual persisted state. Boundary-level refusals for status
//! reads live in [`crate::status::StatusRefusal`] and never mutate a job.

use thiserror::Error;

/// Unified error type for everything that can sink a running analysis job.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Extraction service unreachable or failed outright. The message is
    /// retained verbatim on the job record.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Extraction succeeded but yielded no usable text.
    #[error("no text could be extracted from the media")]
    NoTextExtracted,

    /// Round cap exhausted without a valid terminating report.
    #[error("deliberation exhausted {0} rounds without a final report")]
    DeliberationTimeout(u32),

    /// The terminating turn could not be parsed into a report even after
    /// recovery attempts. The raw text is carried for operator diagnosis and
    /// deliberately kept out of the display message.
    #[error("agent output could not be parsed into a report")]
    MalformedAgentOutput { raw: String },

    /// Durable store failure surfaced mid-run.
    #[error("store error: {0}")]
    Store(#[from] crate::job::store::StoreError),

    /// Anything else — caught at the orchestrator top level and recorded on
    /// the job with its original message.
    #[error("unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<crate::reasoner::ReasonerError> for AnalysisError {
    fn from(err: crate::reasoner::ReasonerError) -> Self {
        Self::Unexpected(err.into())
    }
}
