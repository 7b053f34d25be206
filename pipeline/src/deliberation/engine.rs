//! Round-robin deliberation engine.
//!
//! Drives the four-role conversation over a shared transcript: the
//! Coordinator opens with the task statement, the Claim Extractor lists
//! verifiable claims, the Evidence Gatherer searches and summarizes, and the
//! Verdict Generator scores everything into the final report. After every
//! turn the engine checks for the terminating report; hitting the round cap
//! without one is a `DeliberationTimeout`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::report::{self, FactReport};
use super::roles::{self, Role, ROSTER};
use super::Turn;
use crate::errors::AnalysisError;
use crate::reasoner::Reasoner;
use crate::search::{self, SearchProvider};

pub struct DeliberationEngine {
    reasoner: Arc<dyn Reasoner>,
    search: Arc<dyn SearchProvider>,
    max_rounds: u32,
}

impl DeliberationEngine {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        search: Arc<dyn SearchProvider>,
        max_rounds: u32,
    ) -> Self {
        Self {
            reasoner,
            search,
            max_rounds,
        }
    }

    /// Run the full conversation over the extracted text.
    pub async fn run(&self, text: &str) -> Result<FactReport, AnalysisError> {
        let mut transcript: Vec<Turn> = Vec::new();
        let mut seq = 0u32;

        for round in 1..=self.max_rounds {
            for role in ROSTER {
                let content = self.take_turn(role, text, &transcript).await?;
                debug!(round, speaker = %role, chars = content.len(), "turn recorded");

                if report::is_final_report(&content) {
                    info!(round, speaker = %role, "final report detected — deliberation over");
                    return report::parse_final_report(&content);
                }

                transcript.push(Turn { role, content, seq });
                seq += 1;
            }
        }

        warn!(
            rounds = self.max_rounds,
            turns = transcript.len(),
            "round cap exhausted without a final report"
        );
        Err(AnalysisError::DeliberationTimeout(self.max_rounds))
    }

    async fn take_turn(
        &self,
        role: Role,
        text: &str,
        transcript: &[Turn],
    ) -> Result<String, AnalysisError> {
        match role {
            Role::Coordinator => Ok(coordinator_turn(text, transcript)),
            Role::EvidenceGatherer => self.evidence_turn(transcript).await,
            Role::ClaimExtractor | Role::VerdictGenerator => {
                self.reasoned_turn(role, transcript).await
            }
        }
    }

    async fn reasoned_turn(&self, role: Role, transcript: &[Turn]) -> Result<String, AnalysisError> {
        let response = self.reasoner.respond(role.spec(), transcript).await?;
        Ok(response)
    }

    /// The Evidence Gatherer's turn: one search query per extracted claim,
    /// results spliced into the transcript the reasoner sees (and only that
    /// copy — tool output never lands on the shared transcript itself).
    async fn evidence_turn(&self, transcript: &[Turn]) -> Result<String, AnalysisError> {
        let claims = latest_claim_list(transcript);
        debug!(claims = claims.len(), "gathering evidence");

        let mut blocks = Vec::new();
        for claim in &claims {
            let outcome = self.search.search(claim).await;
            blocks.push(format!(
                "Search results for \"{claim}\":\n{}",
                search::format_outcome(&outcome)
            ));
        }

        if blocks.is_empty() {
            return self.reasoned_turn(Role::EvidenceGatherer, transcript).await;
        }

        let mut augmented = transcript.to_vec();
        augmented.push(Turn {
            role: Role::Coordinator,
            content: format!("Search tool output:\n\n{}", blocks.join("\n\n")),
            seq: augmented.len() as u32,
        });
        self.reasoned_turn(Role::EvidenceGatherer, &augmented).await
    }
}

/// Round one opens with the task statement; later Coordinator turns just
/// keep the floor moving.
fn coordinator_turn(text: &str, transcript: &[Turn]) -> String {
    if transcript.is_empty() {
        roles::opening_statement(text)
    } else {
        roles::CONTINUATION_PROMPT.to_string()
    }
}

/// The most recent claim list the extractor produced, parsed as a JSON array
/// of strings (fenced or bare). Unparseable output degrades to no claims —
/// the gatherer then speaks without search context.
fn latest_claim_list(transcript: &[Turn]) -> Vec<String> {
    let Some(turn) = transcript
        .iter()
        .rev()
        .find(|t| t.role == Role::ClaimExtractor)
    else {
        return Vec::new();
    };

    let candidate = report::fenced_json_inner(&turn.content).unwrap_or(&turn.content);
    serde_json::from_str::<Vec<String>>(candidate.trim()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::ReasonerError;
    use crate::search::{SearchOutcome, Snippet};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Reasoner that replays a fixed script of responses.
    struct ScriptedReasoner {
        responses: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedReasoner {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn callers(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl crate::reasoner::Reasoner for ScriptedReasoner {
        async fn respond(
            &self,
            role: &crate::deliberation::RoleSpec,
            _transcript: &[Turn],
        ) -> Result<String, ReasonerError> {
            self.calls.lock().unwrap().push(role.name.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ReasonerError("script exhausted".into()))
        }
    }

    /// Search provider that records queries and returns a fixed outcome.
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
        no_results: bool,
    }

    impl RecordingSearch {
        fn new(no_results: bool) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                no_results,
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for RecordingSearch {
        async fn search(&self, query: &str) -> SearchOutcome {
            self.queries.lock().unwrap().push(query.to_string());
            if self.no_results {
                SearchOutcome::NoResults
            } else {
                SearchOutcome::Results(vec![Snippet {
                    title: "Sky color".into(),
                    link: "https://example.com/sky".into(),
                    snippet: "Rayleigh scattering makes the sky appear blue.".into(),
                }])
            }
        }
    }

    const FINAL_REPORT: &str = r#"```json
{"claims":[{"claim":"The sky is blue.","evidence_summary":"Rayleigh scattering.","score":95.0}],"report":"Mostly reliable.","overall_score":95.0}
```"#;

    fn engine(
        reasoner: Arc<ScriptedReasoner>,
        search: Arc<RecordingSearch>,
        max_rounds: u32,
    ) -> DeliberationEngine {
        DeliberationEngine::new(reasoner, search, max_rounds)
    }

    #[tokio::test]
    async fn full_round_produces_report() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![
            r#"["The sky is blue."]"#,
            "Evidence: scattering of sunlight supports the claim.",
            FINAL_REPORT,
        ]));
        let search = Arc::new(RecordingSearch::new(false));
        let engine = engine(Arc::clone(&reasoner), Arc::clone(&search), 6);

        let report = engine.run("The sky is blue.").await.unwrap();
        assert_eq!(report.claims.len(), 1);
        assert_eq!(report.claims[0].score, 95.0);
        assert_eq!(report.overall_score, 95.0);

        // One search query per extracted claim.
        assert_eq!(search.queries(), vec!["The sky is blue.".to_string()]);

        // The Coordinator never consumes a reasoner call.
        assert_eq!(
            reasoner.callers(),
            vec!["Claim_Extractor", "Evidence_Gatherer", "Verdict_Generator"]
        );
    }

    #[tokio::test]
    async fn cap_exhaustion_is_a_timeout() {
        // Nobody ever produces the report shape.
        let reasoner = Arc::new(ScriptedReasoner::new(vec!["still thinking"; 18]));
        let search = Arc::new(RecordingSearch::new(true));
        let engine = engine(reasoner, search, 2);

        match engine.run("text").await {
            Err(AnalysisError::DeliberationTimeout(rounds)) => assert_eq!(rounds, 2),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_final_turn_with_embedded_json_is_recovered() {
        // Detection fires on the fenced inner JSON, but the raw turn carries
        // prose around the fences, so recovery has to fall back to the
        // outermost `{...}` span.
        let embedded = "Here is my verdict:\n```json\n{\"claims\":[{\"claim\":\"c\",\
                        \"evidence_summary\":\"e\",\"score\":40.0}],\"report\":\"shaky\",\
                        \"overall_score\":40.0}\n```\nTERMINATE";
        let reasoner = Arc::new(ScriptedReasoner::new(vec![
            r#"["c"]"#,
            "evidence summary",
            embedded,
        ]));
        let search = Arc::new(RecordingSearch::new(true));
        let engine = engine(reasoner, search, 6);

        let report = engine.run("text").await.unwrap();
        assert_eq!(report.overall_score, 40.0);
    }

    #[tokio::test]
    async fn gatherer_speaks_without_search_context_when_no_claims_parse() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![
            "I could not find a claim list.",
            "No claims to research.",
            FINAL_REPORT,
        ]));
        let search = Arc::new(RecordingSearch::new(true));
        let engine = engine(Arc::clone(&reasoner), Arc::clone(&search), 6);

        engine.run("text").await.unwrap();
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn reasoner_failure_propagates() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![]));
        let search = Arc::new(RecordingSearch::new(true));
        let engine = engine(reasoner, search, 6);

        assert!(matches!(
            engine.run("text").await,
            Err(AnalysisError::Unexpected(_))
        ));
    }

    #[test]
    fn claim_list_parses_fenced_arrays() {
        let transcript = vec![Turn {
            role: Role::ClaimExtractor,
            content: "```json\n[\"a\", \"b\"]\n```".into(),
            seq: 0,
        }];
        assert_eq!(latest_claim_list(&transcript), vec!["a", "b"]);
    }

    #[test]
    fn claim_list_uses_latest_extractor_turn() {
        let transcript = vec![
            Turn {
                role: Role::ClaimExtractor,
                content: r#"["old"]"#.into(),
                seq: 0,
            },
            Turn {
                role: Role::ClaimExtractor,
                content: r#"["new"]"#.into(),
                seq: 1,
            },
        ];
        assert_eq!(latest_claim_list(&transcript), vec!["new"]);
    }
}
