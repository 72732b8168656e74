//! Simulated resolution discussions.
//!
//! For each conflict that requires resolution, the simulator produces a
//! bounded three-round exchange: position presentation, collaborative
//! discussion, consensus attempt. No external capability is involved;
//! every round is derived deterministically from the advisor analyses
//! and the conflict record.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::extract::{
    family_count, DEBT_KEYWORDS, INVESTMENT_KEYWORDS, RISK_FAMILIES, SAVINGS_KEYWORDS,
    TIMING_FAMILIES,
};
use crate::domain::{
    AnalysisResult, ConflictRecord, ConflictType, DiscussionRound, Position, RoundStatus, Severity,
};

/// Rounds simulated per conflict.
const ROUNDS_PER_CONFLICT: u8 = 3;

/// High-severity conflicts need this many completed rounds before a
/// consensus attempt is eligible.
const HIGH_SEVERITY_MIN_ROUNDS: u8 = 2;

/// Topic keywords for locating budget-relevant sentences.
const BUDGET_TOPIC: &[&str] = &[
    "budget", "amount", "allocat", "lakh", "crore", "₹", "rupee", "fund",
];

/// Produces the discussion log for a run.
#[derive(Debug, Default)]
pub struct DiscussionSimulator;

impl DiscussionSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Simulate resolution discussions for every conflict requiring
    /// one, in the order the detector ranked them. An empty conflict
    /// list yields the single no-conflicts entry.
    pub fn simulate(
        &self,
        advisor_results: &BTreeMap<String, AnalysisResult>,
        conflicts: &[ConflictRecord],
        _query: &str,
    ) -> Vec<DiscussionRound> {
        let to_resolve: Vec<&ConflictRecord> = conflicts
            .iter()
            .filter(|c| c.resolution_required)
            .collect();

        if to_resolve.is_empty() {
            return vec![DiscussionRound::no_conflicts()];
        }

        let mut log = Vec::with_capacity(to_resolve.len() * ROUNDS_PER_CONFLICT as usize);
        for conflict in to_resolve {
            debug!(
                conflict_type = conflict.conflict_type.as_str(),
                severity = conflict.severity.as_str(),
                "Simulating resolution discussion"
            );
            log.push(self.position_round(advisor_results, conflict));
            log.push(self.exchange_round(conflict));
            log.push(self.consensus_round(conflict));
        }

        log
    }

    /// Round 1: each involved advisor states the part of its analysis
    /// most relevant to the conflict topic.
    fn position_round(
        &self,
        advisor_results: &BTreeMap<String, AnalysisResult>,
        conflict: &ConflictRecord,
    ) -> DiscussionRound {
        let mut positions = BTreeMap::new();
        for advisor_id in &conflict.agents_involved {
            if let Some(result) = advisor_results.get(advisor_id) {
                positions.insert(
                    advisor_id.clone(),
                    Position {
                        stance: relevant_sentences(&result.analysis_text, conflict.conflict_type),
                        confidence: result.confidence,
                    },
                );
            }
        }

        DiscussionRound {
            round: 1,
            conflict_type: Some(conflict.conflict_type),
            status: RoundStatus::PositionPresentation,
            positions: Some(positions),
            consensus_reached: None,
            compromise_solution: None,
            summary: format!(
                "Advisors {} present their positions on the {}",
                conflict.agents_involved.join(", "),
                conflict.conflict_type.as_str()
            ),
        }
    }

    /// Round 2: structural record of the exchange; no new extraction.
    fn exchange_round(&self, conflict: &ConflictRecord) -> DiscussionRound {
        DiscussionRound {
            round: 2,
            conflict_type: Some(conflict.conflict_type),
            status: RoundStatus::CollaborativeDiscussion,
            positions: None,
            consensus_reached: None,
            compromise_solution: None,
            summary: format!(
                "{} advisors weigh each other's reasoning on the {} ({} severity)",
                conflict.agents_involved.len(),
                conflict.conflict_type.as_str(),
                conflict.severity.as_str()
            ),
        }
    }

    /// Round 3: consensus attempt. High-severity conflicts must have at
    /// least [`HIGH_SEVERITY_MIN_ROUNDS`] completed rounds behind them,
    /// which rounds 1-2 always satisfy, so consensus is reached for all
    /// severities and a compromise is looked up by conflict type.
    fn consensus_round(&self, conflict: &ConflictRecord) -> DiscussionRound {
        let completed_rounds = ROUNDS_PER_CONFLICT - 1;
        let eligible = match conflict.severity {
            Severity::High => completed_rounds >= HIGH_SEVERITY_MIN_ROUNDS,
            Severity::Medium | Severity::Low => true,
        };

        if !eligible {
            return DiscussionRound {
                round: 3,
                conflict_type: Some(conflict.conflict_type),
                status: RoundStatus::NoConsensus,
                positions: None,
                consensus_reached: Some(false),
                compromise_solution: None,
                summary: format!(
                    "No consensus reached on the {}",
                    conflict.conflict_type.as_str()
                ),
            };
        }

        DiscussionRound {
            round: 3,
            conflict_type: Some(conflict.conflict_type),
            status: RoundStatus::ConsensusReached,
            positions: None,
            consensus_reached: Some(true),
            compromise_solution: Some(compromise_for(conflict.conflict_type).to_string()),
            summary: format!(
                "Consensus reached on the {}",
                conflict.conflict_type.as_str()
            ),
        }
    }
}

/// Fixed compromise statements, keyed by conflict type.
fn compromise_for(conflict_type: ConflictType) -> &'static str {
    match conflict_type {
        ConflictType::BudgetDisagreement => {
            "Start with a phased allocation at the moderate end of the proposed \
             amounts and scale up as results come in."
        }
        ConflictType::RiskToleranceConflict => {
            "Adopt a balanced risk posture with explicit downside safeguards so \
             both the cautious and the growth positions are honored."
        }
        ConflictType::TimingConflict => {
            "Phase the plan: act on the urgent pieces now and stage the rest \
             over the longer horizon."
        }
        ConflictType::StrategyPriorityConflict => {
            "Pursue a hybrid approach that services debt while building \
             investments in parallel."
        }
        _ => "Adopt a balanced approach that weighs each advisor's position equally.",
    }
}

/// Pick the 1-2 sentences of an analysis most relevant to a conflict
/// topic, using the same keyword families the extractor matches on.
/// Falls back to the leading sentence when nothing scores.
fn relevant_sentences(analysis_text: &str, conflict_type: ConflictType) -> String {
    let sentences: Vec<&str> = analysis_text
        .split_terminator(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        return String::new();
    }

    let mut scored: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(idx, s)| (idx, topic_score(&s.to_lowercase(), conflict_type)))
        .filter(|(_, score)| *score > 0)
        .collect();

    if scored.is_empty() {
        return format!("{}.", sentences[0]);
    }

    // Highest score first, earlier sentence on ties; keep at most two,
    // re-joined in their original order.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut picked: Vec<usize> = scored.iter().take(2).map(|(idx, _)| *idx).collect();
    picked.sort_unstable();

    picked
        .iter()
        .map(|&idx| format!("{}.", sentences[idx]))
        .collect::<Vec<_>>()
        .join(" ")
}

fn topic_score(sentence: &str, conflict_type: ConflictType) -> usize {
    match conflict_type {
        ConflictType::BudgetDisagreement => family_count(sentence, BUDGET_TOPIC),
        ConflictType::RiskToleranceConflict => RISK_FAMILIES
            .iter()
            .map(|(_, kws)| family_count(sentence, kws))
            .sum(),
        ConflictType::TimingConflict => TIMING_FAMILIES
            .iter()
            .map(|(_, kws)| family_count(sentence, kws))
            .sum(),
        ConflictType::StrategyPriorityConflict => {
            family_count(sentence, DEBT_KEYWORDS)
                + family_count(sentence, INVESTMENT_KEYWORDS)
                + family_count(sentence, SAVINGS_KEYWORDS)
        }
        _ => 0,
    }
}
