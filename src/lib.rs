//! concord - multi-advisor collaboration and conflict-resolution engine
//!
//! Takes one user query, dispatches it to several independent advisor
//! capabilities concurrently, detects disagreements between their
//! outputs, simulates a bounded resolution discussion, and produces one
//! unified decision - optionally streaming every intermediate step to
//! the caller as it happens.
//!
//! # Architecture
//!
//! The pipeline is strictly staged:
//! - Stage 1: advisor fan-out (the only concurrent stage)
//! - Stage 2: signal extraction + conflict detection (pure, deterministic)
//! - Stage 3: discussion simulation (pure, deterministic)
//! - Stage 4: unified decision (with an infallible fallback)
//!
//! Failures degrade instead of propagating: a slow advisor becomes a
//! substituted result, a broken synthesizer becomes a deterministic
//! narrative, anything else becomes a best-effort error session.
//!
//! # Modules
//!
//! - `adapters`: External capabilities (advisors, synthesis)
//! - `core`: Pipeline logic (extraction, detection, discussion,
//!   orchestration, streaming, storage)
//! - `domain`: Data structures (analyses, signals, conflicts, sessions,
//!   stream events)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run a query through a panel, streaming events
//! concord run household --query "How should I use a 5 lakh bonus?" --stream
//!
//! # Inspect a stored session
//! concord status <session-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{
    ConflictDetector, DecisionBuilder, DetectionThresholds, DiscussionSimulator, EventStreamer,
    FileSessionStore, KeywordSignalExtractor, MemorySessionStore, Orchestrator, Panel,
    SessionStore, SignalExtractor,
};
pub use crate::domain::{
    AnalysisResult, CollaborationSession, ConflictRecord, ConflictType, DiscussionRound,
    ExtractedSignals, SessionState, Severity, StreamEvent, StreamEventType,
};
