//! Simulated discussion rounds for conflict resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::conflict::ConflictType;

/// One round of the simulated resolution discussion.
///
/// Rounds come in triples per conflict: position presentation,
/// collaborative exchange, consensus attempt. A run without conflicts
/// produces a single `NoConflicts` round instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionRound {
    /// Round number within the conflict (1, 2 or 3)
    pub round: u8,

    /// The conflict this round addresses; absent for the no-conflicts round
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_type: Option<ConflictType>,

    /// What happened in this round
    pub status: RoundStatus,

    /// Advisor stances; present only in round 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<BTreeMap<String, Position>>,

    /// Whether consensus was reached; present only in round 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_reached: Option<bool>,

    /// Compromise statement; present only when consensus was reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compromise_solution: Option<String>,

    /// Human-readable summary of the round
    pub summary: String,
}

/// One advisor's stance in a position-presentation round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// The sentences of the advisor's analysis most relevant to the conflict
    pub stance: String,

    /// Confidence copied from the advisor's `AnalysisResult`
    pub confidence: f64,
}

/// Status of a discussion round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Each involved advisor states its position
    PositionPresentation,

    /// Involved advisors exchange positions
    CollaborativeDiscussion,

    /// A compromise was produced
    ConsensusReached,

    /// No compromise was produced
    NoConsensus,

    /// The run had no conflicts to discuss
    NoConflicts,
}

impl DiscussionRound {
    /// The single entry emitted when the detector found nothing.
    pub fn no_conflicts() -> Self {
        Self {
            round: 1,
            conflict_type: None,
            status: RoundStatus::NoConflicts,
            positions: None,
            consensus_reached: Some(true),
            compromise_solution: None,
            summary: "All advisors are in agreement; no resolution needed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflicts_round() {
        let round = DiscussionRound::no_conflicts();
        assert_eq!(round.round, 1);
        assert_eq!(round.status, RoundStatus::NoConflicts);
        assert_eq!(round.consensus_reached, Some(true));
        assert!(round.conflict_type.is_none());
    }

    #[test]
    fn test_round_serialization_skips_absent_fields() {
        let round = DiscussionRound::no_conflicts();
        let json = serde_json::to_string(&round).unwrap();
        assert!(json.contains("no_conflicts"));
        assert!(!json.contains("positions"));
        assert!(!json.contains("compromise_solution"));
    }
}
