//! Job orchestration: claim → extract → deliberate → persist.
//!
//! One orchestration run owns one job at a time. Every step commits before
//! the next begins, so a crash between steps leaves the record in the last
//! committed state, never half-written. All failures are recovered at the
//! top level into the job's terminal `failed` state; the caller only ever
//! observes eventual state.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::state::{ClaimRecord, JobRecord, JobStatus, MediaItem, ReportRow};
use super::store::{JobStore, SharedJobStore};
use crate::deliberation::DeliberationEngine;
use crate::errors::AnalysisError;
use crate::extraction::MediaExtractor;

pub struct JobOrchestrator {
    store: SharedJobStore,
    extractor: Arc<dyn MediaExtractor>,
    engine: DeliberationEngine,
}

impl JobOrchestrator {
    pub fn new(
        store: SharedJobStore,
        extractor: Arc<dyn MediaExtractor>,
        engine: DeliberationEngine,
    ) -> Self {
        Self {
            store,
            extractor,
            engine,
        }
    }

    /// Persist a new job in `starting` state for the given media URL,
    /// reusing the media row when one exists. The caller hands the returned
    /// id to [`run`](Self::run) on a spawned task.
    pub async fn create_job(
        &self,
        owner: Uuid,
        url: &str,
    ) -> Result<JobRecord, crate::job::store::StoreError> {
        let media = match self.store.find_media_by_url(url).await? {
            Some(existing) => existing,
            None => {
                let media = MediaItem::new(url);
                self.store.insert_media(media.clone()).await?;
                media
            }
        };

        let job = JobRecord::new(owner, media.id);
        self.store.insert_job(job.clone()).await?;
        info!(job_id = %job.id, media_id = %media.id, "job created");
        Ok(job)
    }

    /// Drive one job to a terminal state. Never surfaces an error to the
    /// caller — every failure is recorded on the job itself.
    pub async fn run(&self, job_id: Uuid) {
        info!(%job_id, "analysis worker starting");
        match self.execute(job_id).await {
            Ok(()) => info!(%job_id, "analysis completed"),
            Err(err) => {
                if let AnalysisError::MalformedAgentOutput { raw } = &err {
                    // Raw agent output is for operators only; it lands in the
                    // log, never in the user-visible error message.
                    warn!(%job_id, raw_output = %raw, "unparseable deliberation output retained");
                }
                warn!(%job_id, error = %err, "analysis failed — recording terminal failure");
                self.force_fail(job_id, &err).await;
            }
        }
    }

    async fn execute(&self, job_id: Uuid) -> Result<(), AnalysisError> {
        let mut job = self
            .store
            .fetch_job(job_id)
            .await?
            .ok_or_else(|| AnalysisError::Unexpected(anyhow!("job {job_id} not found")))?;

        // Claim the job and commit immediately, so status observers see work
        // has begun before the first slow call.
        job.transition(JobStatus::Processing)
            .map_err(|e| AnalysisError::Unexpected(anyhow!(e)))?;
        self.store.update_job(&job).await?;

        self.refresh_media_metadata(&job).await;

        let media = self
            .store
            .fetch_media(job.media_id)
            .await?
            .ok_or_else(|| AnalysisError::Unexpected(anyhow!("media {} not found", job.media_id)))?;

        // Step 1: extract text from the media. One attempt, no retry.
        let text = self
            .extractor
            .extract(&media.url)
            .await
            .map_err(|failure| AnalysisError::Extraction(failure.to_string()))?;
        if text.trim().is_empty() {
            return Err(AnalysisError::NoTextExtracted);
        }

        job.extracted_text = Some(text.clone());
        job.set_progress(0.5);
        self.store.update_job(&job).await?;
        debug!(%job_id, chars = text.len(), "extracted text committed");

        // Step 2: run the deliberation over the extracted text.
        let report = self.engine.run(&text).await?;

        // Step 3: persist the result. Claims are replaced wholesale so a
        // repeated run of the terminal save converges to the same set.
        let claims: Vec<ClaimRecord> = report
            .claims
            .iter()
            .map(|finding| ClaimRecord::from_finding(job.id, finding))
            .collect();
        self.store.replace_claims(job.id, claims).await?;

        job.report = Some(ReportRow {
            summary: report.report.clone(),
            overall_score: report.overall_score,
        });
        job.set_progress(1.0);
        job.transition(JobStatus::Completed)
            .map_err(|e| AnalysisError::Unexpected(anyhow!(e)))?;
        self.store.update_job(&job).await?;

        Ok(())
    }

    /// Best-effort media metadata refresh; failures are logged, never fatal.
    async fn refresh_media_metadata(&self, job: &JobRecord) {
        let media = match self.store.fetch_media(job.media_id).await {
            Ok(Some(media)) => media,
            _ => return,
        };
        let Some(meta) = self.extractor.metadata(&media.url).await else {
            debug!(media_id = %media.id, "no metadata available");
            return;
        };
        let mut media = media;
        media.apply_metadata(meta);
        if let Err(err) = self.store.update_media(&media).await {
            warn!(media_id = %media.id, error = %err, "metadata refresh not persisted");
        }
    }

    /// Last-resort terminal write: re-fetch the record (the failed step may
    /// have left the in-memory copy mid-write) and force it to failed.
    async fn force_fail(&self, job_id: Uuid, err: &AnalysisError) {
        match self.store.fetch_job(job_id).await {
            Ok(Some(mut job)) => {
                job.force_fail(err.to_string());
                if let Err(store_err) = self.store.update_job(&job).await {
                    error!(%job_id, error = %store_err, "failed to record job failure");
                }
            }
            Ok(None) => error!(%job_id, "job vanished while recording failure"),
            Err(store_err) => {
                error!(%job_id, error = %store_err, "could not re-fetch job to record failure")
            }
        }
    }
}
