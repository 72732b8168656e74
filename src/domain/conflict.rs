//! Detected disagreements between advisors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A disagreement detected between two or more advisors' signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// What kind of disagreement this is
    pub conflict_type: ConflictType,

    /// Coarse ranking of how serious it is
    pub severity: Severity,

    /// Advisors involved, sorted by id; always at least two
    /// (except for `SystemError` diagnostics)
    pub agents_involved: Vec<String>,

    /// Raw signal value per involved advisor
    pub details: BTreeMap<String, String>,

    /// Whether the discussion simulator should attempt a resolution
    pub resolution_required: bool,

    /// Magnitude of the disagreement; used only for ranking
    pub conflict_score: f64,
}

impl ConflictRecord {
    pub fn new(
        conflict_type: ConflictType,
        severity: Severity,
        mut agents_involved: Vec<String>,
        details: BTreeMap<String, String>,
        conflict_score: f64,
    ) -> Self {
        agents_involved.sort();
        Self {
            conflict_type,
            severity,
            agents_involved,
            details,
            // Confidence disagreement is informational only
            resolution_required: conflict_type != ConflictType::ConfidenceDisagreement,
            conflict_score,
        }
    }
}

/// Kinds of disagreement the detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    BudgetDisagreement,
    RiskToleranceConflict,
    TimingConflict,
    StrategyPriorityConflict,
    ConfidenceDisagreement,
    SystemError,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetDisagreement => "budget_disagreement",
            Self::RiskToleranceConflict => "risk_tolerance_conflict",
            Self::TimingConflict => "timing_conflict",
            Self::StrategyPriorityConflict => "strategy_priority_conflict",
            Self::ConfidenceDisagreement => "confidence_disagreement",
            Self::SystemError => "system_error",
        }
    }
}

/// Conflict severity; the `Ord` derive gives Low < Medium < High,
/// which the detector relies on when ranking its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_agents_sorted() {
        let record = ConflictRecord::new(
            ConflictType::BudgetDisagreement,
            Severity::High,
            vec!["strategy".into(), "financial_position".into(), "risk".into()],
            BTreeMap::new(),
            1.5,
        );
        assert_eq!(
            record.agents_involved,
            vec!["financial_position", "risk", "strategy"]
        );
    }

    #[test]
    fn test_confidence_disagreement_is_informational() {
        let record = ConflictRecord::new(
            ConflictType::ConfidenceDisagreement,
            Severity::Low,
            vec!["a".into(), "b".into()],
            BTreeMap::new(),
            0.4,
        );
        assert!(!record.resolution_required);

        let record = ConflictRecord::new(
            ConflictType::TimingConflict,
            Severity::Medium,
            vec!["a".into(), "b".into()],
            BTreeMap::new(),
            2.0,
        );
        assert!(record.resolution_required);
    }
}
