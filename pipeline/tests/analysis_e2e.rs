//! End-to-end pipeline test: submit → extract → deliberate → persist, with a
//! status subscriber watching the whole run.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use pipeline::{
    DeliberationEngine, ExtractionFailure, JobOrchestrator, JobStatus, JobStore, MediaExtractor,
    MediaMetadata, MemoryJobStore, OwnerOnly, Reasoner, ReasonerError, RoleSpec, SearchOutcome,
    SearchProvider, SharedJobStore, Snippet, StatusPublisher, StatusRefusal, Turn,
};

struct FixedExtractor(&'static str);

#[async_trait]
impl MediaExtractor for FixedExtractor {
    async fn extract(&self, _url: &str) -> Result<String, ExtractionFailure> {
        Ok(self.0.to_string())
    }

    async fn metadata(&self, _url: &str) -> Option<MediaMetadata> {
        Some(MediaMetadata {
            title: Some("Sky footage".into()),
            channel_name: Some("Nature Clips".into()),
            ..Default::default()
        })
    }
}

struct ScriptedReasoner {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedReasoner {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn respond(&self, _role: &RoleSpec, _transcript: &[Turn]) -> Result<String, ReasonerError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ReasonerError("script exhausted".into()))
    }
}

struct OneSnippetSearch;

#[async_trait]
impl SearchProvider for OneSnippetSearch {
    async fn search(&self, _query: &str) -> SearchOutcome {
        SearchOutcome::Results(vec![Snippet {
            title: "Why is the sky blue?".into(),
            link: "https://example.com/sky".into(),
            snippet: "Sunlight scatters off air molecules.".into(),
        }])
    }
}

const VERDICT: &str = r#"```json
{"claims":[{"claim":"The sky is blue.","evidence_summary":"Scattering of sunlight is well documented.","score":95.0}],"report":"The content is largely reliable.","overall_score":95.0}
```
TERMINATE"#;

fn build_orchestrator(store: SharedJobStore) -> JobOrchestrator {
    let engine = DeliberationEngine::new(
        Arc::new(ScriptedReasoner::new(vec![
            r#"["The sky is blue."]"#,
            "Evidence summary: scattering of sunlight supports the claim.",
            VERDICT,
        ])),
        Arc::new(OneSnippetSearch),
        6,
    );
    JobOrchestrator::new(store, Arc::new(FixedExtractor("The sky is blue.")), engine)
}

#[tokio::test]
async fn submitted_job_reaches_completed_with_one_scored_claim() {
    let store = MemoryJobStore::shared();
    let orchestrator = build_orchestrator(Arc::clone(&store));

    let owner = Uuid::new_v4();
    let job = orchestrator
        .create_job(owner, "https://example.com/sky-video")
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Starting);
    assert_eq!(job.progress, 0.0);

    orchestrator.run(job.id).await;

    let done = store.fetch_job(job.id).await.unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 1.0);
    assert!(done.error_message.is_none());

    let report = done.report.unwrap();
    assert_eq!(report.overall_score, 95.0);
    assert_eq!(report.summary, "The content is largely reliable.");

    let claims = store.claims_for(job.id).await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].text, "The sky is blue.");
    assert_eq!(claims[0].score, 95.0);

    // Metadata probe enriched the media row along the way.
    let media = store.fetch_media(done.media_id).await.unwrap().unwrap();
    assert_eq!(media.title.as_deref(), Some("Sky footage"));
}

#[tokio::test]
async fn subscriber_observes_the_run_to_its_terminal_snapshot() {
    let store = MemoryJobStore::shared();
    let orchestrator = Arc::new(build_orchestrator(Arc::clone(&store)));
    let publisher = StatusPublisher::new(
        Arc::clone(&store),
        Arc::new(OwnerOnly),
        Duration::from_millis(5),
    );

    let owner = Uuid::new_v4();
    let job = orchestrator
        .create_job(owner, "https://example.com/sky-video")
        .await
        .unwrap();

    let mut rx = publisher.subscribe(job.id, owner).await.unwrap();

    let runner = Arc::clone(&orchestrator);
    let job_id = job.id;
    tokio::spawn(async move { runner.run(job_id).await });

    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot);
    }

    let last = snapshots.last().expect("at least one snapshot");
    assert_eq!(last.job.status, JobStatus::Completed);
    assert_eq!(last.claims.len(), 1);

    let progresses: Vec<f64> = snapshots.iter().map(|s| s.job.progress).collect();
    assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn strangers_get_refused_before_any_snapshot() {
    let store = MemoryJobStore::shared();
    let orchestrator = build_orchestrator(Arc::clone(&store));
    let publisher = StatusPublisher::new(
        Arc::clone(&store),
        Arc::new(OwnerOnly),
        Duration::from_millis(5),
    );

    let owner = Uuid::new_v4();
    let job = orchestrator
        .create_job(owner, "https://example.com/sky-video")
        .await
        .unwrap();

    let refusal = publisher
        .subscribe(job.id, Uuid::new_v4())
        .await
        .expect_err("stranger must be refused");
    assert_eq!(refusal, StatusRefusal::NotAuthorized);
}
