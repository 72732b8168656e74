//! Event streaming tests.
//!
//! Stage ordering, payload sanitization, and cancellation when the
//! consumer abandons the stream.

use std::sync::Arc;
use std::time::Duration;

use concord::adapters::StaticAdvisor;
use concord::core::panel::PanelMember;
use concord::core::{
    ConflictDetector, DecisionBuilder, EventStreamer, KeywordSignalExtractor, MemorySessionStore,
    Orchestrator, SessionStore,
};
use concord::domain::{SessionState, StreamEvent, StreamEventType};

fn member(id: &str, analysis: &str, confidence: f64) -> PanelMember {
    PanelMember {
        advisor: Arc::new(StaticAdvisor::new(id, id, analysis, confidence)),
        timeout: Duration::from_secs(5),
        context: String::new(),
    }
}

fn streamer(members: Vec<PanelMember>, store: Arc<MemorySessionStore>) -> EventStreamer {
    EventStreamer::new(Arc::new(Orchestrator::new(
        members,
        Arc::new(KeywordSignalExtractor::default()),
        ConflictDetector::default(),
        DecisionBuilder::fallback_only(),
        store,
        0.7,
    )))
}

fn conflicting_members() -> Vec<PanelMember> {
    vec![
        member(
            "strategy",
            "Invest aggressively in equity, committing ₹40K monthly over the decade.",
            0.7,
        ),
        member(
            "risk",
            "Stay conservative: repay the loan debt immediately and park ₹5 lakh safely.",
            0.8,
        ),
    ]
}

async fn collect_events(
    members: Vec<PanelMember>,
) -> (Vec<StreamEvent>, concord::domain::CollaborationSession) {
    let store = Arc::new(MemorySessionStore::new());
    let streamer = streamer(members, store);
    let (mut rx, handle) = streamer.stream("How should I allocate?");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let session = handle.await.unwrap();
    (events, session)
}

#[tokio::test]
async fn test_stage_ordering_with_conflicts() {
    let (events, session) = collect_events(conflicting_members()).await;

    assert_eq!(session.state, SessionState::Completed);
    assert!(!session.conflicts.is_empty());

    // Every event carries this run's id
    assert!(events.iter().all(|e| e.session_id == session.session_id));

    // Stage-k events are never emitted after any stage-(k+1) event
    let stages: Vec<u8> = events.iter().map(|e| e.stage()).collect();
    let mut sorted = stages.clone();
    sorted.sort_unstable();
    assert_eq!(stages, sorted, "stages out of order: {:?}", stages);

    // All four stages are represented, completion last
    assert!(events
        .iter()
        .any(|e| e.event_type == StreamEventType::AdvisorCompleted));
    assert!(events
        .iter()
        .any(|e| e.event_type == StreamEventType::ConflictDetected));
    assert!(events
        .iter()
        .any(|e| e.event_type == StreamEventType::DiscussionRound));
    assert!(events
        .iter()
        .any(|e| e.event_type == StreamEventType::UnifiedDecision));
    assert_eq!(
        events.last().unwrap().event_type,
        StreamEventType::SessionCompleted
    );
}

#[tokio::test]
async fn test_event_counts_match_session_contents() {
    let (events, session) = collect_events(conflicting_members()).await;

    let count = |t: StreamEventType| events.iter().filter(|e| e.event_type == t).count();

    assert_eq!(
        count(StreamEventType::AdvisorCompleted),
        session.advisor_results.len()
    );
    assert_eq!(
        count(StreamEventType::ConflictDetected),
        session.conflicts.len()
    );
    assert_eq!(
        count(StreamEventType::DiscussionRound),
        session.discussion_log.len()
    );
    assert_eq!(count(StreamEventType::UnifiedDecision), 1);
}

#[tokio::test]
async fn test_unsafe_text_is_sanitized_and_encodable() {
    let members = vec![member(
        "risk",
        "Line one\u{0} with a bell\u{7}.\nStay conservative with \"quotes\" and ₹5 lakh.",
        0.8,
    )];
    let (events, _) = collect_events(members).await;

    let advisor_event = events
        .iter()
        .find(|e| e.event_type == StreamEventType::AdvisorCompleted)
        .unwrap();

    let analysis = advisor_event.data["analysis"].as_str().unwrap();
    assert!(!analysis.contains('\u{0}'));
    assert!(!analysis.contains('\u{7}'));

    // encoded form is a single line with escaped quotes
    let encoded = advisor_event.encode();
    assert!(!encoded.contains('\n'));
    let reparsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(reparsed["type"], "advisor_completed");
}

#[tokio::test]
async fn test_dropped_receiver_cancels_run() {
    let store = Arc::new(MemorySessionStore::new());
    let streamer = streamer(conflicting_members(), Arc::clone(&store));

    let (rx, handle) = streamer.stream("query");
    drop(rx);

    let session = handle.await.unwrap();
    assert_eq!(session.state, SessionState::Cancelled);

    // no conflict was computed after cancellation
    assert!(session.conflicts.is_empty());
    assert!(session.unified_response.is_empty());

    // the partial session is still stored for diagnostics
    let stored = store.get(session.session_id).await.unwrap();
    assert_eq!(stored.state, SessionState::Cancelled);
}
