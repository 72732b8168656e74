//! Conflict detection across advisor signals.
//!
//! Detection is a pure function of the set of extracted signals: same
//! inputs always yield the same conflict list in the same order,
//! regardless of advisor completion order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    AnalysisResult, ConflictRecord, ConflictType, ExtractedSignals, Severity, StrategyPriority,
};

/// Numeric cutoffs used by the detector.
///
/// The values reproduce the original system's behavior. They were never
/// validated against real disagreement data there, so they are exposed
/// as configuration rather than re-tuned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Relative difference `(max-min)/min` above which budget
    /// recommendations disagree (default: 0.5)
    #[serde(default = "default_budget_relative_diff")]
    pub budget_relative_diff: f64,

    /// Ordinal distance on the 1-3 category scales at or above which
    /// risk/timing categories disagree (default: 2)
    #[serde(default = "default_ordinal_spread")]
    pub ordinal_spread: u8,

    /// Confidence spread above which an informational disagreement is
    /// reported (default: 0.3)
    #[serde(default = "default_confidence_spread")]
    pub confidence_spread: f64,

    /// Monetary candidates below this are discarded as stray numbers
    /// (default: 1,000)
    #[serde(default = "default_min_plausible_amount")]
    pub min_plausible_amount: f64,

    /// Monetary candidates above this are discarded as stray numbers
    /// (default: 1,000,000,000)
    #[serde(default = "default_max_plausible_amount")]
    pub max_plausible_amount: f64,
}

fn default_budget_relative_diff() -> f64 {
    0.5
}
fn default_ordinal_spread() -> u8 {
    2
}
fn default_confidence_spread() -> f64 {
    0.3
}
fn default_min_plausible_amount() -> f64 {
    1_000.0
}
fn default_max_plausible_amount() -> f64 {
    1_000_000_000.0
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            budget_relative_diff: default_budget_relative_diff(),
            ordinal_spread: default_ordinal_spread(),
            confidence_spread: default_confidence_spread(),
            min_plausible_amount: default_min_plausible_amount(),
            max_plausible_amount: default_max_plausible_amount(),
        }
    }
}

/// Compares signals pairwise/across all advisors and emits ranked
/// conflict records.
pub struct ConflictDetector {
    thresholds: DetectionThresholds,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DetectionThresholds::default())
    }
}

impl ConflictDetector {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// Detect all disagreements. Output is sorted severity descending,
    /// ties broken by conflict score descending.
    pub fn detect(
        &self,
        signals: &BTreeMap<String, ExtractedSignals>,
        results: &BTreeMap<String, AnalysisResult>,
    ) -> Vec<ConflictRecord> {
        let mut conflicts = Vec::new();

        if let Some(conflict) = self.detect_budget(signals) {
            conflicts.push(conflict);
        }
        if let Some(conflict) = self.detect_risk(signals) {
            conflicts.push(conflict);
        }
        if let Some(conflict) = self.detect_timing(signals) {
            conflicts.push(conflict);
        }
        if let Some(conflict) = self.detect_strategy(signals) {
            conflicts.push(conflict);
        }
        if let Some(conflict) = self.detect_confidence(results) {
            conflicts.push(conflict);
        }

        conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(
                    b.conflict_score
                        .partial_cmp(&a.conflict_score)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.conflict_type.cmp(&b.conflict_type))
        });

        conflicts
    }

    fn detect_budget(
        &self,
        signals: &BTreeMap<String, ExtractedSignals>,
    ) -> Option<ConflictRecord> {
        let amounts: Vec<(&String, f64)> = signals
            .iter()
            .filter_map(|(id, s)| s.budget_amount.map(|a| (id, a)))
            .collect();

        if amounts.len() < 2 {
            return None;
        }

        let min = amounts.iter().map(|(_, a)| *a).fold(f64::INFINITY, f64::min);
        let max = amounts
            .iter()
            .map(|(_, a)| *a)
            .fold(f64::NEG_INFINITY, f64::max);
        if min <= 0.0 {
            return None;
        }

        let relative_diff = (max - min) / min;
        if relative_diff <= self.thresholds.budget_relative_diff {
            return None;
        }

        let details = amounts
            .iter()
            .map(|(id, a)| ((*id).clone(), format!("{}", a)))
            .collect();

        Some(ConflictRecord::new(
            ConflictType::BudgetDisagreement,
            Severity::High,
            amounts.iter().map(|(id, _)| (*id).clone()).collect(),
            details,
            relative_diff,
        ))
    }

    fn detect_risk(&self, signals: &BTreeMap<String, ExtractedSignals>) -> Option<ConflictRecord> {
        let known: Vec<(&String, u8, &'static str)> = signals
            .iter()
            .filter_map(|(id, s)| {
                s.risk_tolerance
                    .ordinal()
                    .map(|o| (id, o, s.risk_tolerance.as_str()))
            })
            .collect();

        self.ordinal_conflict(known, ConflictType::RiskToleranceConflict)
    }

    fn detect_timing(
        &self,
        signals: &BTreeMap<String, ExtractedSignals>,
    ) -> Option<ConflictRecord> {
        let known: Vec<(&String, u8, &'static str)> = signals
            .iter()
            .filter_map(|(id, s)| {
                s.timing_preference
                    .ordinal()
                    .map(|o| (id, o, s.timing_preference.as_str()))
            })
            .collect();

        self.ordinal_conflict(known, ConflictType::TimingConflict)
    }

    /// Shared ordinal-spread rule for risk tolerance and timing.
    fn ordinal_conflict(
        &self,
        known: Vec<(&String, u8, &'static str)>,
        conflict_type: ConflictType,
    ) -> Option<ConflictRecord> {
        if known.len() < 2 {
            return None;
        }

        let min = known.iter().map(|(_, o, _)| *o).min()?;
        let max = known.iter().map(|(_, o, _)| *o).max()?;
        let spread = max - min;
        if spread < self.thresholds.ordinal_spread {
            return None;
        }

        let details = known
            .iter()
            .map(|(id, _, label)| ((*id).clone(), label.to_string()))
            .collect();

        Some(ConflictRecord::new(
            conflict_type,
            Severity::Medium,
            known.iter().map(|(id, _, _)| (*id).clone()).collect(),
            details,
            spread as f64,
        ))
    }

    /// Only the debt-focus vs investment-focus pairing is flagged;
    /// other combinations of priorities coexist without conflict.
    fn detect_strategy(
        &self,
        signals: &BTreeMap<String, ExtractedSignals>,
    ) -> Option<ConflictRecord> {
        let polar: Vec<(&String, StrategyPriority)> = signals
            .iter()
            .filter(|(_, s)| {
                matches!(
                    s.strategy_priority,
                    StrategyPriority::DebtFocus | StrategyPriority::InvestmentFocus
                )
            })
            .map(|(id, s)| (id, s.strategy_priority))
            .collect();

        let has_debt = polar
            .iter()
            .any(|(_, p)| *p == StrategyPriority::DebtFocus);
        let has_investment = polar
            .iter()
            .any(|(_, p)| *p == StrategyPriority::InvestmentFocus);
        if !(has_debt && has_investment) {
            return None;
        }

        let details = polar
            .iter()
            .map(|(id, p)| ((*id).clone(), p.as_str().to_string()))
            .collect();

        Some(ConflictRecord::new(
            ConflictType::StrategyPriorityConflict,
            Severity::High,
            polar.iter().map(|(id, _)| (*id).clone()).collect(),
            details,
            1.0,
        ))
    }

    fn detect_confidence(
        &self,
        results: &BTreeMap<String, AnalysisResult>,
    ) -> Option<ConflictRecord> {
        let confidences: Vec<(&String, f64)> = results
            .iter()
            .filter(|(_, r)| !r.failed)
            .map(|(id, r)| (id, r.confidence))
            .collect();

        if confidences.len() < 2 {
            return None;
        }

        let min = confidences
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::INFINITY, f64::min);
        let max = confidences
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::NEG_INFINITY, f64::max);

        let spread = max - min;
        if spread <= self.thresholds.confidence_spread {
            return None;
        }

        let details = confidences
            .iter()
            .map(|(id, c)| ((*id).clone(), format!("{:.2}", c)))
            .collect();

        Some(ConflictRecord::new(
            ConflictType::ConfidenceDisagreement,
            Severity::Low,
            confidences.iter().map(|(id, _)| (*id).clone()).collect(),
            details,
            spread,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskTolerance, TimingPreference};

    fn signals_with_budget(amount: f64) -> ExtractedSignals {
        ExtractedSignals {
            budget_amount: Some(amount),
            ..Default::default()
        }
    }

    fn result(id: &str, confidence: f64) -> AnalysisResult {
        AnalysisResult::new(id, "text", confidence, vec![])
    }

    #[test]
    fn test_budget_disagreement() {
        let mut signals = BTreeMap::new();
        signals.insert("financial_position".to_string(), signals_with_budget(500_000.0));
        signals.insert("strategy".to_string(), signals_with_budget(550_000.0));
        signals.insert("risk".to_string(), signals_with_budget(40_000.0));

        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert_eq!(conflicts.len(), 1);

        let conflict = &conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::BudgetDisagreement);
        assert_eq!(conflict.severity, Severity::High);
        assert_eq!(conflict.agents_involved.len(), 3);
        assert!((conflict.conflict_score - 12.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_budget_values_no_conflict() {
        let mut signals = BTreeMap::new();
        signals.insert("a".to_string(), ExtractedSignals::default());
        signals.insert("b".to_string(), ExtractedSignals::default());

        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_close_budgets_no_conflict() {
        let mut signals = BTreeMap::new();
        signals.insert("a".to_string(), signals_with_budget(500_000.0));
        signals.insert("b".to_string(), signals_with_budget(550_000.0));

        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_risk_spread_rule() {
        let mut signals = BTreeMap::new();
        signals.insert(
            "a".to_string(),
            ExtractedSignals {
                risk_tolerance: RiskTolerance::Conservative,
                ..Default::default()
            },
        );
        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                risk_tolerance: RiskTolerance::Aggressive,
                ..Default::default()
            },
        );

        // spread 2: conflict
        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::RiskToleranceConflict);
        assert_eq!(conflicts[0].severity, Severity::Medium);

        // spread 1: no conflict
        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                risk_tolerance: RiskTolerance::Moderate,
                ..Default::default()
            },
        );
        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_timing_spread_rule() {
        let mut signals = BTreeMap::new();
        signals.insert(
            "a".to_string(),
            ExtractedSignals {
                timing_preference: TimingPreference::Immediate,
                ..Default::default()
            },
        );
        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                timing_preference: TimingPreference::LongTerm,
                ..Default::default()
            },
        );

        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TimingConflict);
    }

    #[test]
    fn test_strategy_polar_pair_only() {
        let mut signals = BTreeMap::new();
        signals.insert(
            "a".to_string(),
            ExtractedSignals {
                strategy_priority: StrategyPriority::DebtFocus,
                ..Default::default()
            },
        );
        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                strategy_priority: StrategyPriority::SavingsFocus,
                ..Default::default()
            },
        );

        // debt vs savings is not the flagged pairing
        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert!(conflicts.is_empty());

        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                strategy_priority: StrategyPriority::InvestmentFocus,
                ..Default::default()
            },
        );
        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].conflict_type,
            ConflictType::StrategyPriorityConflict
        );
        assert_eq!(conflicts[0].severity, Severity::High);
    }

    #[test]
    fn test_confidence_disagreement_is_informational() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", 0.95));
        results.insert("b".to_string(), result("b", 0.40));

        let conflicts = ConflictDetector::default().detect(&BTreeMap::new(), &results);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].conflict_type,
            ConflictType::ConfidenceDisagreement
        );
        assert_eq!(conflicts[0].severity, Severity::Low);
        assert!(!conflicts[0].resolution_required);
    }

    #[test]
    fn test_failed_advisors_excluded_from_confidence() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a", 0.8));
        results.insert("b".to_string(), AnalysisResult::failure("b", "timed out"));

        let conflicts = ConflictDetector::default().detect(&BTreeMap::new(), &results);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_output_ranking() {
        let mut signals = BTreeMap::new();
        signals.insert(
            "a".to_string(),
            ExtractedSignals {
                budget_amount: Some(40_000.0),
                risk_tolerance: RiskTolerance::Conservative,
                strategy_priority: StrategyPriority::DebtFocus,
                ..Default::default()
            },
        );
        signals.insert(
            "b".to_string(),
            ExtractedSignals {
                budget_amount: Some(550_000.0),
                risk_tolerance: RiskTolerance::Aggressive,
                strategy_priority: StrategyPriority::InvestmentFocus,
                ..Default::default()
            },
        );

        let conflicts = ConflictDetector::default().detect(&signals, &BTreeMap::new());
        assert_eq!(conflicts.len(), 3);

        // High first, budget (score 12.75) ahead of strategy (1.0),
        // medium risk conflict last
        assert_eq!(conflicts[0].conflict_type, ConflictType::BudgetDisagreement);
        assert_eq!(
            conflicts[1].conflict_type,
            ConflictType::StrategyPriorityConflict
        );
        assert_eq!(
            conflicts[2].conflict_type,
            ConflictType::RiskToleranceConflict
        );
    }

    #[test]
    fn test_detection_is_deterministic() {
        let mut signals = BTreeMap::new();
        signals.insert("z".to_string(), signals_with_budget(40_000.0));
        signals.insert("a".to_string(), signals_with_budget(550_000.0));
        signals.insert("m".to_string(), signals_with_budget(500_000.0));

        let detector = ConflictDetector::default();
        let first = detector.detect(&signals, &BTreeMap::new());
        let second = detector.detect(&signals, &BTreeMap::new());

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first[0].agents_involved, vec!["a", "m", "z"]);
    }
}
