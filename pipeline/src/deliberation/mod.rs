//! Multi-agent deliberation over extracted media text.
//!
//! A fixed roster of four roles speaks in strict round-robin order on a
//! shared transcript until one of them produces the structured final report
//! (or the round cap runs out). See [`engine::DeliberationEngine`].

pub mod engine;
pub mod report;
pub mod roles;

pub use engine::DeliberationEngine;
pub use report::{ClaimFinding, FactReport, TERMINATION_MARKER};
pub use roles::{Role, RoleSpec, ROSTER};

/// A single turn in the shared transcript.
///
/// Turns are ephemeral — they live for the duration of one engine run and
/// are surfaced in logs, never persisted.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub seq: u32,
}
