//! Final report shape, termination detection, and recovery parsing.
//!
//! Detection and recovery are deliberately lenient in different ways:
//! detection only checks that a turn *looks like* the final report (a JSON
//! mapping carrying the three report keys), while recovery must produce a
//! fully typed [`FactReport`] or fail loudly — the engine never fabricates a
//! result from unparseable output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AnalysisError;

/// Literal end-of-conversation marker some reasoners append to their final
/// turn; stripped before parsing.
pub const TERMINATION_MARKER: &str = "TERMINATE";

const FENCE_LABEL: &str = "```json";
const FENCE: &str = "```";
const REQUIRED_KEYS: [&str; 3] = ["claims", "report", "overall_score"];

/// One scored claim in the final report.
///
/// Scores are carried through exactly as produced — no clamping or rounding;
/// range validation belongs to callers that want it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFinding {
    pub claim: String,
    pub evidence_summary: String,
    pub score: f64,
}

/// The structured report whose appearance in a turn ends the deliberation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactReport {
    pub claims: Vec<ClaimFinding>,
    pub report: String,
    pub overall_score: f64,
}

/// Whether a turn's content is the conversation-ending report.
///
/// Takes the inner content of a fenced ```json block when present (the raw
/// content otherwise), parses it as JSON, and requires a mapping carrying
/// all three report keys. Any parse failure or missing key means the
/// round-robin continues.
pub fn is_final_report(content: &str) -> bool {
    let candidate = fenced_json_inner(content).unwrap_or(content);
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => REQUIRED_KEYS.iter().all(|k| map.contains_key(*k)),
        _ => false,
    }
}

/// Recover the structured report from the terminating turn's raw content.
///
/// Strips fence markers and the end-of-conversation marker, then parses; on
/// failure, falls back to the outermost `{...}` span. When both attempts
/// fail the raw text is handed back inside the error for diagnosis.
pub fn parse_final_report(content: &str) -> Result<FactReport, AnalysisError> {
    let cleaned = content
        .replace(FENCE_LABEL, "")
        .replace(FENCE, "")
        .replace(TERMINATION_MARKER, "");
    let cleaned = cleaned.trim();

    if let Ok(report) = serde_json::from_str::<FactReport>(cleaned) {
        return Ok(report);
    }

    if let Some(span) = outermost_object(cleaned) {
        if let Ok(report) = serde_json::from_str::<FactReport>(span) {
            return Ok(report);
        }
    }

    Err(AnalysisError::MalformedAgentOutput {
        raw: content.to_string(),
    })
}

/// Inner content of the first fenced ```json block, if any.
pub(crate) fn fenced_json_inner(text: &str) -> Option<&str> {
    let start = text.find(FENCE_LABEL)?;
    let inner_start = start + FENCE_LABEL.len();
    let end = text[inner_start..].find(FENCE)?;
    Some(text[inner_start..inner_start + end].trim())
}

/// First `{` to last `}` — the widest span that could be a JSON object.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"claims": [], "report": "x", "overall_score": 0}"#;

    #[test]
    fn fenced_minimal_report_terminates() {
        let content = format!("```json\n{MINIMAL}\n```");
        assert!(is_final_report(&content));
    }

    #[test]
    fn bare_report_terminates() {
        assert!(is_final_report(MINIMAL));
    }

    #[test]
    fn missing_key_does_not_terminate() {
        assert!(!is_final_report(r#"{"claims": [], "report": "x"}"#));
    }

    #[test]
    fn non_object_does_not_terminate() {
        assert!(!is_final_report(r#"["claims", "report", "overall_score"]"#));
        assert!(!is_final_report("I am still thinking about the claims."));
    }

    #[test]
    fn invalid_json_does_not_terminate() {
        assert!(!is_final_report(r#"{"claims": [,], "report": "overall_score""#));
    }

    #[test]
    fn recovers_exact_minimal_object() {
        let content = format!("```json\n{MINIMAL}\n```");
        let report = parse_final_report(&content).unwrap();
        assert_eq!(report.claims.len(), 0);
        assert_eq!(report.report, "x");
        assert_eq!(report.overall_score, 0.0);
    }

    #[test]
    fn strips_termination_marker() {
        let content = format!("{MINIMAL}\nTERMINATE");
        let report = parse_final_report(&content).unwrap();
        assert_eq!(report.report, "x");
    }

    #[test]
    fn recovers_embedded_object_from_malformed_body() {
        let content = format!("Of course! Here is my verdict: {MINIMAL} — hope that helps.");
        let report = parse_final_report(&content).unwrap();
        assert_eq!(report.report, "x");
    }

    #[test]
    fn unrecoverable_output_carries_raw_text() {
        let content = "no json anywhere";
        match parse_final_report(content) {
            Err(AnalysisError::MalformedAgentOutput { raw }) => assert_eq!(raw, content),
            other => panic!("expected MalformedAgentOutput, got {other:?}"),
        }
    }

    #[test]
    fn detection_can_pass_while_recovery_fails() {
        // Looks like the report (all three keys) but claims entries are not
        // well-formed findings — detection ends the conversation, recovery
        // must still refuse to fabricate.
        let content = r#"{"claims": [{"claim": "x"}], "report": "r", "overall_score": 1}"#;
        assert!(is_final_report(content));
        assert!(matches!(
            parse_final_report(content),
            Err(AnalysisError::MalformedAgentOutput { .. })
        ));
    }

    #[test]
    fn out_of_range_scores_pass_through() {
        let content = r#"{"claims": [{"claim": "c", "evidence_summary": "e", "score": 150.0}],
                          "report": "r", "overall_score": -3.5}"#;
        let report = parse_final_report(content).unwrap();
        assert_eq!(report.claims[0].score, 150.0);
        assert_eq!(report.overall_score, -3.5);
    }

    #[test]
    fn fenced_inner_extraction_trims() {
        let text = "prefix ```json\n  {\"a\": 1}  \n``` suffix";
        assert_eq!(fenced_json_inner(text), Some("{\"a\": 1}"));
    }
}
