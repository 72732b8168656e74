//! Main orchestrator for collaboration runs.
//!
//! Sequences the four pipeline stages: concurrent advisor fan-out,
//! signal extraction + conflict detection, discussion simulation, and
//! unified decision building. The contract is `run` never fails: every
//! failure mode degrades to a best-effort session.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::Advisor;
use crate::domain::events::sanitize_text;
use crate::domain::{
    AnalysisResult, CollaborationSession, ConflictRecord, ConflictType, ExtractedSignals,
    SessionMetrics, Severity, StreamEvent, StreamEventType,
};

use super::conflict::ConflictDetector;
use super::discussion::DiscussionSimulator;
use super::extract::SignalExtractor;
use super::panel::PanelMember;
use super::store::SessionStore;
use super::stream::{EventSink, NullSink};
use super::synthesis::{fallback_response, DecisionBuilder};

/// Weight of average advisor confidence in the collaboration score.
const CONFIDENCE_WEIGHT: f64 = 0.6;
/// Weight of the consensus rate in the collaboration score.
const CONSENSUS_WEIGHT: f64 = 0.4;

/// Main pipeline orchestrator.
pub struct Orchestrator {
    members: Vec<PanelMember>,
    extractor: Arc<dyn SignalExtractor>,
    detector: ConflictDetector,
    simulator: DiscussionSimulator,
    builder: DecisionBuilder,
    store: Arc<dyn SessionStore>,
    /// Confidence assigned to advisors whose backend reports none
    default_confidence: f64,
}

impl Orchestrator {
    pub fn new(
        members: Vec<PanelMember>,
        extractor: Arc<dyn SignalExtractor>,
        detector: ConflictDetector,
        builder: DecisionBuilder,
        store: Arc<dyn SessionStore>,
        default_confidence: f64,
    ) -> Self {
        Self {
            members,
            extractor,
            detector,
            simulator: DiscussionSimulator::new(),
            builder,
            store,
            default_confidence: default_confidence.clamp(0.0, 1.0),
        }
    }

    /// Run the full pipeline without streaming.
    pub async fn run(&self, query: &str) -> CollaborationSession {
        self.run_with_sink(query, &NullSink).await
    }

    /// Run the full pipeline, reporting each completed artifact to the
    /// sink. Never returns an error: unexpected failures produce a
    /// degraded session, and a gone consumer produces a cancelled one.
    #[instrument(skip(self, query, sink), fields(advisors = self.members.len()))]
    pub async fn run_with_sink(&self, query: &str, sink: &dyn EventSink) -> CollaborationSession {
        let session_id = Uuid::new_v4();

        match self.try_run(session_id, query, sink).await {
            Ok(session) => session,
            Err(e) => self.degraded_session(session_id, query, e, sink).await,
        }
    }

    async fn try_run(
        &self,
        session_id: Uuid,
        query: &str,
        sink: &dyn EventSink,
    ) -> Result<CollaborationSession> {
        info!(%session_id, "Starting collaboration run");
        let mut session = CollaborationSession::new(session_id, query);

        let advisor_ids: Vec<&str> = self.members.iter().map(|m| m.advisor.id()).collect();
        let mut live = sink.emit(StreamEvent::new(
            session_id,
            StreamEventType::SessionStarted,
            format!("Consulting {} advisors", self.members.len()),
            json!({ "query": sanitize_text(query), "advisors": advisor_ids }),
        ));

        // Stage 1: concurrent advisor fan-out with per-advisor timeouts.
        // A slow or failing advisor degrades to a substitute result and
        // never aborts the run.
        session.advisor_results = self.consult_advisors(session_id, query).await;
        for result in session.advisor_results.values() {
            live &= sink.emit(StreamEvent::new(
                session_id,
                StreamEventType::AdvisorCompleted,
                format!("Advisor '{}' completed", result.advisor_id),
                json!({
                    "advisor_id": result.advisor_id,
                    "analysis": sanitize_text(&result.analysis_text),
                    "confidence": result.confidence,
                    "key_insights": result.key_insights,
                    "failed": result.failed,
                }),
            ));
        }
        if !live {
            return Ok(self.cancel(session).await);
        }

        // Stage 2: extraction + detection over the complete signal set.
        // Signals are keyed by advisor id, so completion order cannot
        // influence the detector's output.
        let signals = self.extract_signals(&session.advisor_results);
        session.conflicts = self.detector.detect(&signals, &session.advisor_results);
        info!(
            %session_id,
            conflicts = session.conflicts.len(),
            "Conflict detection complete"
        );
        for conflict in &session.conflicts {
            live &= sink.emit(StreamEvent::new(
                session_id,
                StreamEventType::ConflictDetected,
                format!(
                    "{} detected ({} severity)",
                    conflict.conflict_type.as_str(),
                    conflict.severity.as_str()
                ),
                serde_json::to_value(conflict).unwrap_or_default(),
            ));
        }
        if !live {
            return Ok(self.cancel(session).await);
        }

        // Stage 3: simulated resolution discussions.
        session.discussion_log =
            self.simulator
                .simulate(&session.advisor_results, &session.conflicts, query);
        for round in &session.discussion_log {
            live &= sink.emit(StreamEvent::new(
                session_id,
                StreamEventType::DiscussionRound,
                format!("Discussion round {}", round.round),
                serde_json::to_value(round).unwrap_or_default(),
            ));
        }
        if !live {
            return Ok(self.cancel(session).await);
        }

        // Stage 4: unified decision. The builder is infallible.
        session.unified_response = self
            .builder
            .build(
                query,
                &session.advisor_results,
                &session.discussion_log,
                &session.conflicts,
            )
            .await;
        session.metrics = compute_metrics(&session);
        session.mark_completed();

        sink.emit(StreamEvent::new(
            session_id,
            StreamEventType::UnifiedDecision,
            "Unified decision ready",
            json!({
                "response": sanitize_text(&session.unified_response),
                "collaboration_score": session.metrics.collaboration_score,
                "consensus": session.metrics.consensus,
            }),
        ));

        self.store
            .put(session.clone())
            .await
            .context("Failed to store completed session")?;

        sink.emit(StreamEvent::new(
            session_id,
            StreamEventType::SessionCompleted,
            "Session stored",
            json!({
                "session_id": session_id,
                "metrics": serde_json::to_value(&session.metrics).unwrap_or_default(),
            }),
        ));

        info!(
            %session_id,
            score = session.metrics.collaboration_score,
            "Collaboration run completed"
        );
        Ok(session)
    }

    /// Invoke every advisor concurrently with the same query. Each task
    /// is isolated: timeout, error, or panic substitutes a degraded
    /// result for that advisor only.
    async fn consult_advisors(
        &self,
        session_id: Uuid,
        query: &str,
    ) -> BTreeMap<String, AnalysisResult> {
        let mut handles = Vec::with_capacity(self.members.len());

        for member in &self.members {
            let advisor: Arc<dyn Advisor> = Arc::clone(&member.advisor);
            let advisor_id = advisor.id().to_string();
            let context = member.context.clone();
            let call_timeout = member.timeout;
            let query = query.to_string();
            let default_confidence = self.default_confidence;

            let handle = tokio::spawn(async move {
                let started = std::time::Instant::now();
                let outcome = timeout(
                    call_timeout,
                    advisor.analyze(&query, &context, call_timeout),
                )
                .await;

                match outcome {
                    Ok(Ok(report)) => {
                        debug!(
                            advisor = %advisor.id(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Advisor completed"
                        );
                        AnalysisResult::new(
                            advisor.id(),
                            report.analysis,
                            report.confidence.unwrap_or(default_confidence),
                            report.key_insights,
                        )
                    }
                    Ok(Err(e)) => {
                        warn!(advisor = %advisor.id(), error = %e, "Advisor failed");
                        AnalysisResult::failure(
                            advisor.id(),
                            format!("Advisor unavailable: {}", e),
                        )
                    }
                    Err(_) => {
                        warn!(
                            advisor = %advisor.id(),
                            timeout_ms = call_timeout.as_millis() as u64,
                            "Advisor timed out"
                        );
                        AnalysisResult::failure(
                            advisor.id(),
                            format!("Advisor timed out after {:?}", call_timeout),
                        )
                    }
                }
            });

            handles.push((advisor_id, handle));
        }

        let mut results = BTreeMap::new();
        for (advisor_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(%session_id, advisor = %advisor_id, error = %e, "Advisor task panicked");
                    AnalysisResult::failure(&advisor_id, "Advisor task panicked")
                }
            };
            results.insert(result.advisor_id.clone(), result);
        }

        results
    }

    /// Recompute signals from every non-failed analysis.
    fn extract_signals(
        &self,
        results: &BTreeMap<String, AnalysisResult>,
    ) -> BTreeMap<String, ExtractedSignals> {
        results
            .iter()
            .filter(|(_, r)| !r.failed)
            .map(|(id, r)| (id.clone(), self.extractor.extract(&r.analysis_text)))
            .collect()
    }

    /// The caller abandoned the stream: stop emitting, keep the partial
    /// session for diagnostics.
    async fn cancel(&self, mut session: CollaborationSession) -> CollaborationSession {
        warn!(session_id = %session.session_id, "Consumer gone, cancelling run");
        session.mark_cancelled();

        if let Err(e) = self.store.put(session.clone()).await {
            warn!(error = %e, "Failed to store cancelled session");
        }
        session
    }

    /// Something unexpected escaped a stage: surface it as a
    /// system-error diagnostic on a best-effort session.
    async fn degraded_session(
        &self,
        session_id: Uuid,
        query: &str,
        error: anyhow::Error,
        sink: &dyn EventSink,
    ) -> CollaborationSession {
        let error_msg = error.to_string();
        error!(%session_id, error = %error_msg, "Run degraded to fallback session");

        let mut session = CollaborationSession::new(session_id, query);
        session.conflicts.push(ConflictRecord::new(
            ConflictType::SystemError,
            Severity::High,
            Vec::new(),
            BTreeMap::new(),
            0.0,
        ));
        session.unified_response = format!(
            "The collaboration pipeline hit an unexpected error ({}). {}",
            error_msg,
            fallback_response(query, &session.advisor_results)
        );
        session.mark_failed(error_msg.clone());

        sink.emit(StreamEvent::new(
            session_id,
            StreamEventType::SessionError,
            "Run degraded to fallback session",
            json!({ "error": sanitize_text(&error_msg) }),
        ));

        if let Err(e) = self.store.put(session.clone()).await {
            warn!(error = %e, "Failed to store degraded session");
        }
        session
    }
}

/// Aggregate metrics for a finished run.
fn compute_metrics(session: &CollaborationSession) -> SessionMetrics {
    let advisors_consulted = session.advisor_results.len();
    let advisors_failed = session
        .advisor_results
        .values()
        .filter(|r| r.failed)
        .count();

    let confidences: Vec<f64> = session
        .advisor_results
        .values()
        .filter(|r| !r.failed)
        .map(|r| r.confidence)
        .collect();
    let avg_confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    let required = session
        .conflicts
        .iter()
        .filter(|c| c.resolution_required)
        .count();
    let resolved = session
        .discussion_log
        .iter()
        .filter(|r| r.status == crate::domain::RoundStatus::ConsensusReached)
        .count();

    let consensus = required == 0 || resolved >= required;
    let consensus_rate = if required == 0 {
        1.0
    } else {
        resolved as f64 / required as f64
    };

    SessionMetrics {
        collaboration_score: (CONFIDENCE_WEIGHT * avg_confidence
            + CONSENSUS_WEIGHT * consensus_rate)
            .clamp(0.0, 1.0),
        consensus,
        advisors_consulted,
        advisors_failed,
        conflicts_detected: session.conflicts.len(),
        conflicts_resolved: resolved.min(required),
        discussion_rounds: session.discussion_log.len(),
    }
}
