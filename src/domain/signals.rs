//! Structured signals derived from an advisor's free-text analysis.
//!
//! Signals are never persisted on their own; they are recomputed from
//! `AnalysisResult.analysis_text` whenever they are needed.

use serde::{Deserialize, Serialize};

/// Normalized signals extracted from one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSignals {
    /// Normalized monetary recommendation in base currency units,
    /// absent when no confident extraction was possible
    pub budget_amount: Option<f64>,

    /// Risk-tolerance category
    pub risk_tolerance: RiskTolerance,

    /// Timing preference
    pub timing_preference: TimingPreference,

    /// Strategy priority
    pub strategy_priority: StrategyPriority,
}

/// Risk-tolerance category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
    #[default]
    Unknown,
}

impl RiskTolerance {
    /// Position on the ordinal scale used for spread checks
    /// (conservative=1, moderate=2, aggressive=3); `Unknown` has none.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            Self::Conservative => Some(1),
            Self::Moderate => Some(2),
            Self::Aggressive => Some(3),
            Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
            Self::Unknown => "unknown",
        }
    }
}

/// Timing preference for acting on the advice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingPreference {
    Immediate,
    ShortTerm,
    LongTerm,
    #[default]
    Unknown,
}

impl TimingPreference {
    /// Ordinal scale for spread checks (immediate=1, short_term=2,
    /// long_term=3); `Unknown` has none.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            Self::Immediate => Some(1),
            Self::ShortTerm => Some(2),
            Self::LongTerm => Some(3),
            Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ShortTerm => "short_term",
            Self::LongTerm => "long_term",
            Self::Unknown => "unknown",
        }
    }
}

/// Which family of actions the analysis leans towards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPriority {
    DebtFocus,
    InvestmentFocus,
    SavingsFocus,
    #[default]
    Balanced,
}

impl StrategyPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DebtFocus => "debt_focus",
            Self::InvestmentFocus => "investment_focus",
            Self::SavingsFocus => "savings_focus",
            Self::Balanced => "balanced",
        }
    }
}
