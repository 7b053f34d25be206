//! Analysis jobs: records, lifecycle state machine, orchestration, storage.

pub mod orchestrator;
pub mod state;
pub mod store;

pub use orchestrator::JobOrchestrator;
pub use state::{ClaimRecord, JobRecord, JobStatus, MediaItem, ReportRow, TransitionError};
pub use store::{JobStore, MemoryJobStore, SharedJobStore, StoreError};
