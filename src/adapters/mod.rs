//! Adapter interfaces for the external capabilities the pipeline
//! consumes: advisors that analyze a query, and the synthesis
//! capability that merges their analyses into one narrative.
//!
//! Both are the only operations in the pipeline that cross a
//! network/process boundary; every call carries an explicit timeout and
//! every failure is recovered locally by the orchestrator.

pub mod http;
pub mod static_;
pub mod subprocess;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use http::{HttpAdvisor, HttpSynthesizer};
pub use static_::StaticAdvisor;
pub use subprocess::SubprocessAdvisor;

/// Raw report returned by an advisor capability.
///
/// Plain-text backends leave `confidence` unset; the panel supplies a
/// default in that case.
#[derive(Debug, Clone)]
pub struct AdvisorReport {
    /// The free-text analysis
    pub analysis: String,

    /// Self-reported confidence, if the backend provides one
    pub confidence: Option<f64>,

    /// Key takeaways, if the backend provides them
    pub key_insights: Vec<String>,
}

impl AdvisorReport {
    /// Create a report with just analysis text; insights are derived
    /// from the text.
    pub fn from_text(analysis: String) -> Self {
        let key_insights = derive_key_insights(&analysis);
        Self {
            analysis,
            confidence: None,
            key_insights,
        }
    }
}

/// An independent capability producing one analysis for a query.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Stable advisor identifier, unique within a panel
    fn id(&self) -> &str;

    /// Human-readable role description (e.g. "risk assessment")
    fn role(&self) -> &str;

    /// Analyze a query. May fail or exceed `timeout`; the orchestrator
    /// substitutes a degraded result in both cases.
    async fn analyze(&self, query: &str, context: &str, timeout: Duration)
        -> Result<AdvisorReport>;
}

/// Input to the synthesis capability.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub query: String,

    /// (advisor_id, bounded analysis excerpt) pairs
    pub advisor_excerpts: Vec<(String, String)>,

    pub conflict_count: usize,
    pub discussion_round_count: usize,
}

/// The capability that merges all advisor analyses into one narrative.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produce the unified narrative. Errors trigger the deterministic
    /// fallback in the decision builder.
    async fn synthesize(&self, request: &SynthesisRequest, timeout: Duration) -> Result<String>;
}

/// Pull short takeaways out of plain analysis text: bullet lines first,
/// then leading sentences, capped at the insight limit.
pub fn derive_key_insights(text: &str) -> Vec<String> {
    let cap = crate::domain::analysis::MAX_KEY_INSIGHTS;
    let mut insights: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with('-') || line.starts_with('*') || line.starts_with("• ")
        })
        .map(|line| line.trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|line| !line.is_empty())
        .take(cap)
        .collect();

    if insights.is_empty() {
        insights = text
            .split_terminator(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| s.len() > 20)
            .take(2)
            .map(|s| s.to_string())
            .collect();
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insights_from_bullets() {
        let text = "Summary paragraph.\n- Pay down the loan first\n- Keep an emergency fund\n* Start a SIP";
        let insights = derive_key_insights(text);
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0], "Pay down the loan first");
    }

    #[test]
    fn test_insights_fallback_to_sentences() {
        let text = "You should allocate forty thousand to the emergency fund. \
                    The remainder can go into a conservative index fund. Ok.";
        let insights = derive_key_insights(text);
        assert_eq!(insights.len(), 2);
        assert!(insights[0].starts_with("You should allocate"));
    }

    #[test]
    fn test_insights_capped() {
        let text = (0..12)
            .map(|i| format!("- point {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let insights = derive_key_insights(&text);
        assert_eq!(insights.len(), crate::domain::analysis::MAX_KEY_INSIGHTS);
    }
}
