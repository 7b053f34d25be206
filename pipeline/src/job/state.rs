//! Job lifecycle state machine and the persisted record shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deliberation::ClaimFinding;
use crate::extraction::MediaMetadata;

/// Lifecycle status of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Persisted, not yet claimed by a worker.
    Starting,
    /// A worker owns the job and is driving it.
    Processing,
    /// Terminal: report and claims recorded.
    Completed,
    /// Terminal: error message recorded.
    Failed,
}

impl JobStatus {
    /// Whether this is a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Valid transitions out of this status.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            Self::Starting => &[Self::Processing],
            Self::Processing => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid job transition {} → {} (allowed: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for TransitionError {}

/// The stored result summary of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub summary: String,
    pub overall_score: f64,
}

/// One analysis request and its evolving state.
///
/// Single writer per job: only the owning orchestrator run mutates a record,
/// and the record becomes immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub owner: Uuid,
    pub media_id: Uuid,
    pub status: JobStatus,
    pub progress: f64,
    pub extracted_text: Option<String>,
    pub report: Option<ReportRow>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a fresh job in `starting` state with zero progress.
    pub fn new(owner: Uuid, media_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            media_id,
            status: JobStatus::Starting,
            progress: 0.0,
            extracted_text: None,
            report: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, enforcing the machine's edges.
    pub fn transition(&mut self, to: JobStatus) -> Result<(), TransitionError> {
        if !self.status.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Raise progress. Progress is monotone within a job's lifetime, so a
    /// lower value is ignored.
    pub fn set_progress(&mut self, progress: f64) {
        if progress > self.progress {
            self.progress = progress;
            self.updated_at = Utc::now();
        }
    }

    /// Last-resort failure write, bypassing edge validation: the step that
    /// failed may have left the record mid-write, and this must still land.
    /// Progress is left where it was — failure is not completion.
    pub fn force_fail(&mut self, message: String) {
        self.status = JobStatus::Failed;
        self.error_message = Some(message);
        self.report = None;
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One scored claim row, child of a job's report. Replaced wholesale on each
/// successful run, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub text: String,
    pub evidence_summary: String,
    pub score: f64,
}

impl ClaimRecord {
    pub fn from_finding(job_id: Uuid, finding: &ClaimFinding) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            text: finding.claim.clone(),
            evidence_summary: finding.evidence_summary.clone(),
            score: finding.score,
        }
    }
}

/// A media item many jobs may reference. Descriptive fields are filled in
/// best-effort by the metadata probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub channel_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            title: None,
            description: None,
            duration_seconds: None,
            thumbnail_url: None,
            uploaded_at: None,
            channel_name: None,
            created_at: Utc::now(),
        }
    }

    /// Overlay freshly probed metadata; absent fields leave existing values.
    pub fn apply_metadata(&mut self, meta: MediaMetadata) {
        if meta.title.is_some() {
            self.title = meta.title;
        }
        if meta.description.is_some() {
            self.description = meta.description;
        }
        if meta.duration_seconds.is_some() {
            self.duration_seconds = meta.duration_seconds;
        }
        if meta.thumbnail_url.is_some() {
            self.thumbnail_url = meta.thumbnail_url;
        }
        if meta.uploaded_at.is_some() {
            self.uploaded_at = meta.uploaded_at;
        }
        if meta.channel_name.is_some() {
            self.channel_name = meta.channel_name;
        }
    }
}
