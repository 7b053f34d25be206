//! Status publisher: authorized snapshot push loop.
//!
//! A subscriber is authorized once, receives a full snapshot immediately,
//! then one per interval tick, then one final snapshot when the job turns
//! terminal — after which the channel closes. Every tick re-reads the store,
//! so the loop reliably observes orchestrator commits.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::deliberation::{ClaimFinding, FactReport};
use crate::job::state::{ClaimRecord, JobRecord, MediaItem};
use crate::job::store::{JobStore, SharedJobStore};

/// Why a status read was refused. Boundary-only: refusals never mutate the
/// job, and a refused subscription sends zero snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRefusal {
    NotFound,
    NotAuthorized,
}

impl std::fmt::Display for StatusRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::NotAuthorized => write!(f, "not_authorized"),
        }
    }
}

/// Access decision for status reads, delegated so deployments can swap
/// policies in.
pub trait AccessPolicy: Send + Sync {
    fn may_view(&self, requester: Uuid, job: &JobRecord) -> bool;
}

/// Default policy: only the job's owner may observe it.
pub struct OwnerOnly;

impl AccessPolicy for OwnerOnly {
    fn may_view(&self, requester: Uuid, job: &JobRecord) -> bool {
        job.owner == requester
    }
}

/// One full frame pushed to a subscriber: the job, its media item's
/// descriptive fields, and the current claim list.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job: JobRecord,
    pub media: Option<MediaItem>,
    pub claims: Vec<ClaimRecord>,
}

impl JobSnapshot {
    /// Reassemble the engine-shaped report from the stored rows. `None`
    /// until the job has completed.
    pub fn fact_report(&self) -> Option<FactReport> {
        let row = self.job.report.as_ref()?;
        Some(FactReport {
            claims: self
                .claims
                .iter()
                .map(|c| ClaimFinding {
                    claim: c.text.clone(),
                    evidence_summary: c.evidence_summary.clone(),
                    score: c.score,
                })
                .collect(),
            report: row.summary.clone(),
            overall_score: row.overall_score,
        })
    }
}

pub struct StatusPublisher {
    store: SharedJobStore,
    access: Arc<dyn AccessPolicy>,
    interval: Duration,
}

impl StatusPublisher {
    pub fn new(store: SharedJobStore, access: Arc<dyn AccessPolicy>, interval: Duration) -> Self {
        Self {
            store,
            access,
            interval,
        }
    }

    /// One-shot snapshot for the status query boundary.
    pub async fn snapshot(
        &self,
        job_id: Uuid,
        requester: Uuid,
    ) -> Result<JobSnapshot, StatusRefusal> {
        self.authorize(job_id, requester).await?;
        load_snapshot(&self.store, job_id)
            .await
            .ok_or(StatusRefusal::NotFound)
    }

    /// All of the requester's jobs, each in full snapshot shape.
    pub async fn history(&self, requester: Uuid) -> Vec<JobSnapshot> {
        let jobs = match self.store.jobs_for_owner(requester).await {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(%requester, error = %err, "history read failed");
                return Vec::new();
            }
        };

        let mut snapshots = Vec::with_capacity(jobs.len());
        for job in jobs {
            if let Some(snapshot) = load_snapshot(&self.store, job.id).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    /// Subscribe to the push loop. Authorization happens before the first
    /// snapshot is ever produced; a refusal means the channel is never
    /// opened at all.
    pub async fn subscribe(
        &self,
        job_id: Uuid,
        requester: Uuid,
    ) -> Result<mpsc::Receiver<JobSnapshot>, StatusRefusal> {
        self.authorize(job_id, requester).await?;

        let (tx, rx) = mpsc::channel(8);
        let store = Arc::clone(&self.store);
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                let Some(snapshot) = load_snapshot(&store, job_id).await else {
                    warn!(%job_id, "job vanished mid-stream — closing");
                    break;
                };
                let terminal = snapshot.job.is_terminal();
                if tx.send(snapshot).await.is_err() {
                    debug!(%job_id, "status subscriber went away");
                    break;
                }
                if terminal {
                    debug!(%job_id, "job terminal — final snapshot sent, closing stream");
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        Ok(rx)
    }

    async fn authorize(&self, job_id: Uuid, requester: Uuid) -> Result<(), StatusRefusal> {
        let job = match self.store.fetch_job(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => return Err(StatusRefusal::NotFound),
            Err(err) => {
                warn!(%job_id, error = %err, "store read failed during authorization");
                return Err(StatusRefusal::NotFound);
            }
        };
        if !self.access.may_view(requester, &job) {
            return Err(StatusRefusal::NotAuthorized);
        }
        Ok(())
    }
}

async fn load_snapshot(store: &SharedJobStore, job_id: Uuid) -> Option<JobSnapshot> {
    let job = store.fetch_job(job_id).await.ok().flatten()?;
    let media = store.fetch_media(job.media_id).await.ok().flatten();
    let claims = store.claims_for(job.id).await.unwrap_or_default();
    Some(JobSnapshot { job, media, claims })
}
