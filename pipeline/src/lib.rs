//! Fact-Check Analysis Pipeline
//!
//! This library provides:
//! - A durable analysis job lifecycle (`starting → processing →
//!   completed | failed`) driven by a single-writer orchestrator
//! - A four-role round-robin deliberation engine that turns extracted media
//!   text into a structured claims report
//! - A status publisher that pushes authorized job snapshots on a fixed
//!   cadence until the job reaches a terminal state
//!
//! External collaborators (media text extraction, LLM reasoning, web search,
//! persistence, access control) are injected as traits; one
//! [`config::PipelineConfig`] is built at process start and everything else
//! is constructed from it — no ambient globals.

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod deliberation;
pub mod errors;
pub mod extraction;
pub mod job;
pub mod reasoner;
pub mod search;
pub mod status;

// Re-export key configuration types
pub use config::{check_endpoint, ClientSet, PipelineConfig, ReasonerEndpoint};

// Re-export the failure taxonomy
pub use errors::AnalysisError;

// Re-export key deliberation types
pub use deliberation::{
    ClaimFinding, DeliberationEngine, FactReport, Role, RoleSpec, Turn,
};

// Re-export key job types
pub use job::orchestrator::JobOrchestrator;
pub use job::state::{
    ClaimRecord, JobRecord, JobStatus, MediaItem, ReportRow, TransitionError,
};
pub use job::store::{JobStore, MemoryJobStore, SharedJobStore, StoreError};

// Re-export collaborator contracts
pub use extraction::{ExtractionFailure, HttpExtractor, MediaExtractor, MediaMetadata};
pub use reasoner::{OpenAiReasoner, Reasoner, ReasonerError};
pub use search::{HttpSearchClient, SearchOutcome, SearchProvider, Snippet};

// Re-export status streaming types
pub use status::{
    AccessPolicy, JobSnapshot, OwnerOnly, StatusPublisher, StatusRefusal,
};
