//! Durable job store contract and the in-process implementation.
//!
//! The store is the only resource shared between concurrently running jobs.
//! Each write is a single-record commit scoped to one job, and a read issued
//! after a commit observes it (the status publisher depends on this).
//! Claims are replaced wholesale — delete-then-insert — so re-running a
//! job's terminal save converges instead of accumulating.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::state::{ClaimRecord, JobRecord, MediaItem};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    #[error("media not found: {0}")]
    MediaNotFound(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared reference to a job store.
pub type SharedJobStore = Arc<dyn JobStore>;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_media(&self, media: MediaItem) -> StoreResult<()>;
    async fn update_media(&self, media: &MediaItem) -> StoreResult<()>;
    async fn fetch_media(&self, id: Uuid) -> StoreResult<Option<MediaItem>>;
    async fn find_media_by_url(&self, url: &str) -> StoreResult<Option<MediaItem>>;

    async fn insert_job(&self, job: JobRecord) -> StoreResult<()>;
    async fn fetch_job(&self, id: Uuid) -> StoreResult<Option<JobRecord>>;
    /// Commit the record as one single-job transaction.
    async fn update_job(&self, job: &JobRecord) -> StoreResult<()>;
    async fn jobs_for_owner(&self, owner: Uuid) -> StoreResult<Vec<JobRecord>>;

    /// Replace the job's claims: delete existing rows, insert the new set.
    async fn replace_claims(&self, job_id: Uuid, claims: Vec<ClaimRecord>) -> StoreResult<()>;
    async fn claims_for(&self, job_id: Uuid) -> StoreResult<Vec<ClaimRecord>>;
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, JobRecord>,
    media: HashMap<Uuid, MediaItem>,
    claims: HashMap<Uuid, Vec<ClaimRecord>>,
}

/// In-process store: RwLock-guarded maps. Writes take the lock exclusively,
/// so every read that follows a commit observes it.
#[derive(Default)]
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared trait-object reference to a fresh store.
    pub fn shared() -> SharedJobStore {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert_media(&self, media: MediaItem) -> StoreResult<()> {
        self.inner.write().await.media.insert(media.id, media);
        Ok(())
    }

    async fn update_media(&self, media: &MediaItem) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.media.contains_key(&media.id) {
            return Err(StoreError::MediaNotFound(media.id));
        }
        inner.media.insert(media.id, media.clone());
        Ok(())
    }

    async fn fetch_media(&self, id: Uuid) -> StoreResult<Option<MediaItem>> {
        Ok(self.inner.read().await.media.get(&id).cloned())
    }

    async fn find_media_by_url(&self, url: &str) -> StoreResult<Option<MediaItem>> {
        Ok(self
            .inner
            .read()
            .await
            .media
            .values()
            .find(|m| m.url == url)
            .cloned())
    }

    async fn insert_job(&self, job: JobRecord) -> StoreResult<()> {
        self.inner.write().await.jobs.insert(job.id, job);
        Ok(())
    }

    async fn fetch_job(&self, id: Uuid) -> StoreResult<Option<JobRecord>> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn update_job(&self, job: &JobRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.jobs.contains_key(&job.id) {
            return Err(StoreError::JobNotFound(job.id));
        }
        inner.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn jobs_for_owner(&self, owner: Uuid) -> StoreResult<Vec<JobRecord>> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<JobRecord> = inner
            .jobs
            .values()
            .filter(|j| j.owner == owner)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn replace_claims(&self, job_id: Uuid, claims: Vec<ClaimRecord>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.claims.remove(&job_id);
        inner.claims.insert(job_id, claims);
        Ok(())
    }

    async fn claims_for(&self, job_id: Uuid) -> StoreResult<Vec<ClaimRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .claims
            .get(&job_id)
            .cloned()
            .unwrap_or_default())
    }
}
