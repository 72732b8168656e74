//! HTTP advisor and synthesizer adapters.
//!
//! Both speak a small JSON protocol: POST the request, read a typed
//! response. Timeouts are enforced per request and surface as ordinary
//! errors for the orchestrator's substitution path.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Advisor, AdvisorReport, SynthesisRequest, Synthesizer};

/// Advisor backed by a remote JSON endpoint.
pub struct HttpAdvisor {
    advisor_id: String,
    role: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    advisor_id: &'a str,
    role: &'a str,
    query: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    analysis: String,
    confidence: Option<f64>,
    #[serde(default)]
    key_insights: Vec<String>,
}

impl HttpAdvisor {
    pub fn new(
        advisor_id: impl Into<String>,
        role: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            advisor_id: advisor_id.into(),
            role: role.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Advisor for HttpAdvisor {
    fn id(&self) -> &str {
        &self.advisor_id
    }

    fn role(&self) -> &str {
        &self.role
    }

    async fn analyze(
        &self,
        query: &str,
        context: &str,
        timeout: Duration,
    ) -> Result<AdvisorReport> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&AnalyzeRequest {
                advisor_id: &self.advisor_id,
                role: &self.role,
                query,
                context,
            })
            .send()
            .await
            .with_context(|| format!("Advisor '{}' request failed", self.advisor_id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Advisor '{}' returned HTTP {}",
                self.advisor_id,
                response.status()
            );
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .with_context(|| format!("Advisor '{}' returned malformed JSON", self.advisor_id))?;

        let key_insights = if body.key_insights.is_empty() {
            super::derive_key_insights(&body.analysis)
        } else {
            body.key_insights
        };

        Ok(AdvisorReport {
            analysis: body.analysis,
            confidence: body.confidence,
            key_insights,
        })
    }
}

/// Synthesis capability backed by a remote JSON endpoint.
pub struct HttpSynthesizer {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    query: &'a str,
    advisor_excerpts: &'a [(String, String)],
    conflict_count: usize,
    discussion_round_count: usize,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    response: String,
}

impl HttpSynthesizer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&SynthesizeRequest {
                query: &request.query,
                advisor_excerpts: &request.advisor_excerpts,
                conflict_count: request.conflict_count,
                discussion_round_count: request.discussion_round_count,
            })
            .send()
            .await
            .context("Synthesis request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Synthesizer returned HTTP {}", response.status());
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .context("Synthesizer returned malformed JSON")?;

        if body.response.trim().is_empty() {
            anyhow::bail!("Synthesizer returned an empty narrative");
        }

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_advisor_identity() {
        let advisor = HttpAdvisor::new("strategy", "strategy planning", "http://localhost:9");
        assert_eq!(advisor.id(), "strategy");
        assert_eq!(advisor.role(), "strategy planning");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Port 9 (discard) is not listening in the test environment
        let advisor = HttpAdvisor::new("strategy", "strategy", "http://127.0.0.1:9/analyze");
        let result = advisor
            .analyze("q", "", Duration::from_millis(250))
            .await;
        assert!(result.is_err());
    }
}
