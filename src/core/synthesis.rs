//! Unified decision building.
//!
//! Merges all advisor analyses, the conflict list and the discussion
//! log into one final narrative. The synthesis capability does the
//! writing when it is available; a deterministic fallback takes over on
//! any error so the builder itself can never fail.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use crate::adapters::{SynthesisRequest, Synthesizer};
use crate::domain::{AnalysisResult, ConflictRecord, DiscussionRound};

/// Longest excerpt of one advisor's analysis passed to the synthesizer
/// or rendered by the fallback.
const EXCERPT_CHARS: usize = 400;

/// Builds the final unified narrative for a run.
pub struct DecisionBuilder {
    synthesizer: Option<Box<dyn Synthesizer>>,
    timeout: Duration,
}

impl DecisionBuilder {
    pub fn new(synthesizer: Option<Box<dyn Synthesizer>>, timeout: Duration) -> Self {
        Self {
            synthesizer,
            timeout,
        }
    }

    /// A builder with no synthesis capability; always uses the fallback.
    pub fn fallback_only() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    /// Produce the unified response. Infallible: a synthesis error or
    /// absence degrades to the deterministic fallback.
    pub async fn build(
        &self,
        query: &str,
        advisor_results: &BTreeMap<String, AnalysisResult>,
        discussion_log: &[DiscussionRound],
        conflicts: &[ConflictRecord],
    ) -> String {
        let request = SynthesisRequest {
            query: query.to_string(),
            advisor_excerpts: advisor_results
                .iter()
                .filter(|(_, r)| !r.failed)
                .map(|(id, r)| (id.clone(), truncate_excerpt(&r.analysis_text, EXCERPT_CHARS)))
                .collect(),
            conflict_count: conflicts.len(),
            discussion_round_count: discussion_log.len(),
        };

        if let Some(ref synthesizer) = self.synthesizer {
            match synthesizer.synthesize(&request, self.timeout).await {
                Ok(narrative) => return narrative,
                Err(e) => {
                    warn!(error = %e, "Synthesis failed, using deterministic fallback");
                }
            }
        }

        fallback_response(query, advisor_results)
    }
}

/// Deterministic narrative used when the synthesis capability is
/// unavailable or errors. Never fails and never returns empty text.
pub fn fallback_response(
    query: &str,
    advisor_results: &BTreeMap<String, AnalysisResult>,
) -> String {
    let mut out = format!("Unified recommendation for: {}\n\n", query.trim());

    for (advisor_id, result) in advisor_results {
        if result.failed {
            continue;
        }
        out.push_str(&format!(
            "{}: {}\n",
            advisor_id,
            truncate_excerpt(&result.analysis_text, EXCERPT_CHARS)
        ));
    }

    out.push_str(
        "\nTaken together, a balanced plan that starts conservatively and is \
         reviewed as circumstances change is recommended.",
    );
    out
}

/// Truncate to a character budget, appending an ellipsis when text was
/// dropped. Operates on characters, not bytes, so multibyte currency
/// symbols cannot split.
fn truncate_excerpt(text: &str, limit: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _: &SynthesisRequest, _: Duration) -> anyhow::Result<String> {
            bail!("capability offline")
        }
    }

    struct EchoSynthesizer;

    #[async_trait]
    impl Synthesizer for EchoSynthesizer {
        async fn synthesize(
            &self,
            request: &SynthesisRequest,
            _: Duration,
        ) -> anyhow::Result<String> {
            Ok(format!(
                "synthesized {} excerpts for '{}'",
                request.advisor_excerpts.len(),
                request.query
            ))
        }
    }

    fn results() -> BTreeMap<String, AnalysisResult> {
        let mut map = BTreeMap::new();
        map.insert(
            "risk".to_string(),
            AnalysisResult::new("risk", "Stay conservative.", 0.8, vec![]),
        );
        map.insert(
            "strategy".to_string(),
            AnalysisResult::new("strategy", "Lean into equity.", 0.7, vec![]),
        );
        map
    }

    #[tokio::test]
    async fn test_synthesizer_output_used_when_available() {
        let builder = DecisionBuilder::new(Some(Box::new(EchoSynthesizer)), Duration::from_secs(5));
        let response = builder.build("what now?", &results(), &[], &[]).await;
        assert_eq!(response, "synthesized 2 excerpts for 'what now?'");
    }

    #[tokio::test]
    async fn test_synthesis_error_never_propagates() {
        let builder =
            DecisionBuilder::new(Some(Box::new(FailingSynthesizer)), Duration::from_secs(5));
        let response = builder.build("what now?", &results(), &[], &[]).await;
        assert!(!response.is_empty());
        assert!(response.contains("risk: Stay conservative."));
    }

    #[tokio::test]
    async fn test_fallback_only_builder() {
        let builder = DecisionBuilder::fallback_only();
        let response = builder.build("q", &results(), &[], &[]).await;
        assert!(response.contains("Unified recommendation for: q"));
    }

    #[test]
    fn test_fallback_with_no_advisors_is_non_empty() {
        let response = fallback_response("q", &BTreeMap::new());
        assert!(!response.trim().is_empty());
    }

    #[test]
    fn test_fallback_skips_failed_advisors() {
        let mut map = results();
        map.insert(
            "position".to_string(),
            AnalysisResult::failure("position", "timed out"),
        );
        let response = fallback_response("q", &map);
        assert!(!response.contains("timed out"));
        assert!(response.contains("risk:"));
    }

    #[test]
    fn test_excerpt_truncation() {
        let long = "x".repeat(1_000);
        let excerpt = truncate_excerpt(&long, 400);
        assert_eq!(excerpt.chars().count(), 403); // 400 + "..."
    }
}
