//! One advisor's output for one query.

use serde::{Deserialize, Serialize};

/// Maximum number of key insights carried per analysis.
pub const MAX_KEY_INSIGHTS: usize = 7;

/// The analysis produced by a single advisor.
///
/// When the advisor capability errored or timed out, `failed` is set,
/// `confidence` is forced to zero and `analysis_text` carries a
/// diagnostic message instead of an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Stable advisor identifier, unique within a run
    pub advisor_id: String,

    /// Free-text analysis (or a diagnostic message when `failed`)
    pub analysis_text: String,

    /// Advisor confidence in its own analysis, 0.0-1.0
    pub confidence: f64,

    /// Short takeaways, at most [`MAX_KEY_INSIGHTS`]
    pub key_insights: Vec<String>,

    /// Whether the advisor capability errored or timed out
    #[serde(default)]
    pub failed: bool,
}

impl AnalysisResult {
    /// Create a successful analysis result.
    ///
    /// Confidence is clamped to [0, 1] and insights are capped.
    pub fn new(
        advisor_id: impl Into<String>,
        analysis_text: impl Into<String>,
        confidence: f64,
        mut key_insights: Vec<String>,
    ) -> Self {
        key_insights.truncate(MAX_KEY_INSIGHTS);
        Self {
            advisor_id: advisor_id.into(),
            analysis_text: analysis_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            key_insights,
            failed: false,
        }
    }

    /// Create the degraded substitute for a failed or timed-out advisor.
    pub fn failure(advisor_id: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            advisor_id: advisor_id.into(),
            analysis_text: diagnostic.into(),
            confidence: 0.0,
            key_insights: Vec::new(),
            failed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        let result = AnalysisResult::new("risk", "text", 1.7, vec![]);
        assert_eq!(result.confidence, 1.0);

        let result = AnalysisResult::new("risk", "text", -0.2, vec![]);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_insights_capped() {
        let insights: Vec<String> = (0..12).map(|i| format!("insight {}", i)).collect();
        let result = AnalysisResult::new("strategy", "text", 0.8, insights);
        assert_eq!(result.key_insights.len(), MAX_KEY_INSIGHTS);
    }

    #[test]
    fn test_failure_zeroes_confidence() {
        let result = AnalysisResult::failure("risk", "timed out after 30s");
        assert!(result.failed);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.analysis_text, "timed out after 30s");
    }
}
