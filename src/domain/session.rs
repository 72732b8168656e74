//! The complete record of one pipeline run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::AnalysisResult;
use super::conflict::ConflictRecord;
use super::discussion::DiscussionRound;

/// Full record of one collaboration run.
///
/// Created when a run starts, fully populated once the unified decision
/// is built, immutable thereafter. Retained in the session store until
/// explicitly cleared or the process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationSession {
    /// Unique identifier for this run
    pub session_id: Uuid,

    /// The user query that started the run
    pub query: String,

    /// Analysis per advisor, keyed by advisor id
    pub advisor_results: BTreeMap<String, AnalysisResult>,

    /// Detected conflicts, ranked by severity then score
    pub conflicts: Vec<ConflictRecord>,

    /// Simulated discussion rounds, in emission order
    pub discussion_log: Vec<DiscussionRound>,

    /// The final unified narrative
    pub unified_response: String,

    /// When the run started
    pub created_at: DateTime<Utc>,

    /// When the run finished (if it has)
    pub completed_at: Option<DateTime<Utc>>,

    /// Final state of the run
    pub state: SessionState,

    /// Aggregate metrics computed at completion
    pub metrics: SessionMetrics,
}

impl CollaborationSession {
    /// Create an empty session for a freshly started run.
    pub fn new(session_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            session_id,
            query: query.into(),
            advisor_results: BTreeMap::new(),
            conflicts: Vec::new(),
            discussion_log: Vec::new(),
            unified_response: String::new(),
            created_at: Utc::now(),
            completed_at: None,
            state: SessionState::Running,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, SessionState::Running)
    }

    pub fn mark_completed(&mut self) {
        self.state = SessionState::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = SessionState::Failed {
            error: error.into(),
        };
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        self.state = SessionState::Cancelled;
        self.completed_at = Some(Utc::now());
    }
}

/// State of a collaboration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SessionState {
    /// Currently executing
    Running,

    /// Completed successfully (possibly with degraded advisors)
    Completed,

    /// An unexpected error was caught; the session is best-effort
    Failed { error: String },

    /// The caller abandoned the stream mid-run
    Cancelled,
}

/// Aggregate metrics for a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Blend of advisor confidence and consensus rate, 0.0-1.0
    pub collaboration_score: f64,

    /// Whether every resolution-required conflict reached consensus
    pub consensus: bool,

    pub advisors_consulted: usize,
    pub advisors_failed: usize,
    pub conflicts_detected: usize,
    pub conflicts_resolved: usize,
    pub discussion_rounds: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = CollaborationSession::new(Uuid::new_v4(), "how should I invest?");
        assert!(!session.is_finished());
        assert!(session.completed_at.is_none());

        session.mark_completed();
        assert!(session.is_finished());
        assert_eq!(session.state, SessionState::Completed);
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn test_failed_state_carries_error() {
        let mut session = CollaborationSession::new(Uuid::new_v4(), "q");
        session.mark_failed("detector blew up");

        match &session.state {
            SessionState::Failed { error } => assert_eq!(error, "detector blew up"),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_state_serialization_tag() {
        let mut session = CollaborationSession::new(Uuid::new_v4(), "q");
        session.mark_cancelled();

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"status\":\"cancelled\""));
    }
}
