//! Core pipeline logic.
//!
//! This module contains:
//! - Panel: Advisor panel definitions and loading
//! - Extract: Heuristic signal extraction
//! - Conflict: Conflict detection and thresholds
//! - Discussion: Simulated resolution discussions
//! - Synthesis: Unified decision building
//! - Orchestrator: Stage sequencing and failure degradation
//! - Stream: Incremental event delivery
//! - Store: Session storage

pub mod conflict;
pub mod discussion;
pub mod extract;
pub mod orchestrator;
pub mod panel;
pub mod store;
pub mod stream;
pub mod synthesis;

// Re-export commonly used types
pub use conflict::{ConflictDetector, DetectionThresholds};
pub use discussion::DiscussionSimulator;
pub use extract::{KeywordSignalExtractor, SignalExtractor};
pub use orchestrator::Orchestrator;
pub use panel::{AdvisorKind, AdvisorSpec, Panel, PanelMember, SynthesisSpec};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};
pub use stream::{ChannelSink, EventSink, EventStreamer, NullSink};
pub use synthesis::DecisionBuilder;
