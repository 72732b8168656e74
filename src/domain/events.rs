//! Stream event envelope.
//!
//! Each discrete artifact of a run (an advisor's completion, a detected
//! conflict, a discussion round, the final narrative) is wrapped in a
//! [`StreamEvent`] and emitted the moment it is available. Consumers must
//! treat unknown event types as forward-compatible no-ops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One event in a run's incremental-delivery stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The run this event belongs to
    pub session_id: Uuid,

    /// Type of event (a plain string on the wire)
    #[serde(rename = "type")]
    pub event_type: StreamEventType,

    /// Human-readable title
    pub title: String,

    /// Event payload
    pub data: serde_json::Value,

    /// When this event was produced (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// Key format: "{session_id}:{type}:{payload_hash}"
    pub idempotency_key: String,
}

impl StreamEvent {
    /// Create an event with the current timestamp and a derived key.
    pub fn new(
        session_id: Uuid,
        event_type: StreamEventType,
        title: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        let idempotency_key = format!(
            "{}:{}:{}",
            session_id,
            event_type.as_str(),
            hash_payload(&data.to_string())
        );

        Self {
            session_id,
            event_type,
            title: title.into(),
            data,
            timestamp: Utc::now(),
            idempotency_key,
        }
    }

    /// Pipeline stage this event belongs to. Stage-k events are never
    /// emitted after any stage-(k+1) event.
    pub fn stage(&self) -> u8 {
        self.event_type.stage()
    }

    /// Render the event as a single line of JSON, safe for
    /// line-delimited transports. serde_json escapes quotes and control
    /// characters, so the output never contains a raw newline.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Serialization of Value/String/DateTime cannot fail in
            // practice; keep the stream alive if it somehow does.
            format!(
                "{{\"type\":\"session_error\",\"title\":\"unencodable event\",\"session_id\":\"{}\"}}",
                self.session_id
            )
        })
    }
}

/// Types of events emitted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// The run has started
    SessionStarted,

    /// One advisor finished (or was substituted after failure)
    AdvisorCompleted,

    /// One conflict was detected
    ConflictDetected,

    /// One discussion round was simulated
    DiscussionRound,

    /// The unified narrative is ready
    UnifiedDecision,

    /// The run finished and the session is stored
    SessionCompleted,

    /// The run degraded to a best-effort session
    SessionError,

    /// Forward-compatibility catch-all for consumers
    Unknown,
}

// Hand-written so unrecognized type strings decode to `Unknown`
// instead of failing the whole envelope.
impl<'de> Deserialize<'de> for StreamEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "session_started" => Self::SessionStarted,
            "advisor_completed" => Self::AdvisorCompleted,
            "conflict_detected" => Self::ConflictDetected,
            "discussion_round" => Self::DiscussionRound,
            "unified_decision" => Self::UnifiedDecision,
            "session_completed" => Self::SessionCompleted,
            "session_error" => Self::SessionError,
            _ => Self::Unknown,
        })
    }
}

impl StreamEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::AdvisorCompleted => "advisor_completed",
            Self::ConflictDetected => "conflict_detected",
            Self::DiscussionRound => "discussion_round",
            Self::UnifiedDecision => "unified_decision",
            Self::SessionCompleted => "session_completed",
            Self::SessionError => "session_error",
            Self::Unknown => "unknown",
        }
    }

    /// Stage index used by the ordering guarantee.
    pub fn stage(&self) -> u8 {
        match self {
            Self::SessionStarted | Self::AdvisorCompleted => 1,
            Self::ConflictDetected => 2,
            Self::DiscussionRound => 3,
            Self::UnifiedDecision => 4,
            Self::SessionCompleted | Self::SessionError | Self::Unknown => 5,
        }
    }
}

/// Strip raw control characters from a text field before it is embedded
/// in an event payload. Newlines and tabs survive (the JSON encoder
/// escapes them); everything else control-ish is dropped.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Hash a payload (first 16 hex chars of SHA256).
pub fn hash_payload(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_roundtrip() {
        let event = StreamEvent::new(
            Uuid::new_v4(),
            StreamEventType::AdvisorCompleted,
            "Advisor risk completed",
            serde_json::json!({"advisor_id": "risk", "confidence": 0.8}),
        );

        let json = event.encode();
        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type, StreamEventType::AdvisorCompleted);
        assert_eq!(parsed.data["advisor_id"], "risk");
    }

    #[test]
    fn test_encode_is_single_line() {
        let event = StreamEvent::new(
            Uuid::new_v4(),
            StreamEventType::UnifiedDecision,
            "Decision",
            serde_json::json!({"text": "line one\nline \"two\""}),
        );

        let encoded = event.encode();
        assert!(!encoded.contains('\n'));
        assert!(encoded.contains("line one\\nline \\\"two\\\""));
    }

    #[test]
    fn test_unknown_type_is_forward_compatible() {
        let json = r#""some_future_event""#;
        let parsed: StreamEventType = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, StreamEventType::Unknown);
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        let dirty = "safe\u{0} text\u{7}\nwith newline";
        let clean = sanitize_text(dirty);
        assert_eq!(clean, "safe text\nwith newline");
    }

    #[test]
    fn test_stage_ordering_values() {
        assert!(StreamEventType::AdvisorCompleted.stage() < StreamEventType::ConflictDetected.stage());
        assert!(StreamEventType::ConflictDetected.stage() < StreamEventType::DiscussionRound.stage());
        assert!(StreamEventType::DiscussionRound.stage() < StreamEventType::UnifiedDecision.stage());
    }

    #[test]
    fn test_idempotency_key_stable() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let data = serde_json::json!({"advisor_id": "risk"});
        let a = StreamEvent::new(id, StreamEventType::AdvisorCompleted, "t", data.clone());
        let b = StreamEvent::new(id, StreamEventType::AdvisorCompleted, "t", data);
        assert_eq!(a.idempotency_key, b.idempotency_key);
        assert!(a
            .idempotency_key
            .starts_with("550e8400-e29b-41d4-a716-446655440000:advisor_completed:"));
    }
}
