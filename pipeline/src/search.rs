//! Web search contract consumed by the Evidence Gatherer role.
//!
//! The search backend is an external collaborator; the engine only specifies
//! how it is invoked (one query per extracted claim) and how its output is
//! formatted into the conversation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// A single ranked result snippet.
#[derive(Debug, Clone, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Outcome of one search query.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results(Vec<Snippet>),
    NoResults,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> SearchOutcome;
}

/// Format an outcome the way the conversation consumes it: a numbered block
/// of the top three snippets, or the no-results sentence.
pub fn format_outcome(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::NoResults => "No search results found.".to_string(),
        SearchOutcome::Results(snippets) => {
            let mut formatted = Vec::new();
            for (i, result) in snippets.iter().take(3).enumerate() {
                formatted.push(format!("Result {}:", i + 1));
                formatted.push(format!("  Title: {}", result.title));
                formatted.push(format!("  Link: {}", result.link));
                formatted.push(format!("  Snippet: {}", result.snippet));
            }
            formatted.join("\n")
        }
    }
}

/// HTTP client for a deployed search service.
///
/// Search unavailability degrades to `NoResults` rather than sinking the
/// whole deliberation — the gatherer still speaks, with nothing to cite.
pub struct HttpSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<Snippet>,
}

#[async_trait]
impl SearchProvider for HttpSearchClient {
    async fn search(&self, query: &str) -> SearchOutcome {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query)]);

        let body: SearchResponse = match request.send().await {
            Ok(resp) => match resp.json().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(query, error = %e, "search response unreadable — proceeding without results");
                    return SearchOutcome::NoResults;
                }
            },
            Err(e) => {
                warn!(query, error = %e, "search request failed — proceeding without results");
                return SearchOutcome::NoResults;
            }
        };

        if body.results.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Results(body.results)
        }
    }
}
