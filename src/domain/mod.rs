//! Data structures for the collaboration pipeline.
//!
//! Everything in here is plain data: advisor analyses, the signals
//! heuristically extracted from them, detected conflicts, simulated
//! discussion rounds, the completed session record, and the stream
//! event envelope.

pub mod analysis;
pub mod conflict;
pub mod discussion;
pub mod events;
pub mod session;
pub mod signals;

pub use analysis::AnalysisResult;
pub use conflict::{ConflictRecord, ConflictType, Severity};
pub use discussion::{DiscussionRound, Position, RoundStatus};
pub use events::{StreamEvent, StreamEventType};
pub use session::{CollaborationSession, SessionMetrics, SessionState};
pub use signals::{ExtractedSignals, RiskTolerance, StrategyPriority, TimingPreference};
