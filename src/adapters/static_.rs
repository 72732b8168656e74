//! Static advisor adapter.
//!
//! Returns a canned analysis regardless of the query. Used by offline
//! demo panels and throughout the test suite, where deterministic
//! advisor text is needed to exercise extraction and conflict paths.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::{Advisor, AdvisorReport};

/// Advisor with a fixed, configured analysis.
pub struct StaticAdvisor {
    advisor_id: String,
    role: String,
    analysis: String,
    confidence: f64,
    /// Optional artificial latency, for exercising timeout handling
    delay: Option<Duration>,
}

impl StaticAdvisor {
    pub fn new(
        advisor_id: impl Into<String>,
        role: impl Into<String>,
        analysis: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            advisor_id: advisor_id.into(),
            role: role.into(),
            analysis: analysis.into(),
            confidence: confidence.clamp(0.0, 1.0),
            delay: None,
        }
    }

    /// Delay the response; responses slower than the advisor timeout
    /// exercise the degradation path.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Advisor for StaticAdvisor {
    fn id(&self) -> &str {
        &self.advisor_id
    }

    fn role(&self) -> &str {
        &self.role
    }

    async fn analyze(
        &self,
        _query: &str,
        _context: &str,
        _timeout: Duration,
    ) -> Result<AdvisorReport> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(AdvisorReport {
            analysis: self.analysis.clone(),
            confidence: Some(self.confidence),
            key_insights: super::derive_key_insights(&self.analysis),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_advisor_returns_canned_text() {
        let advisor = StaticAdvisor::new("risk", "risk", "Keep risk conservative.", 0.9);
        let report = advisor
            .analyze("anything", "", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(report.analysis, "Keep risk conservative.");
        assert_eq!(report.confidence, Some(0.9));
    }
}
