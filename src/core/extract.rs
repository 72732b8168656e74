//! Heuristic signal extraction from advisor analysis text.
//!
//! This is deliberately a dumb, deterministic keyword scanner: no
//! regex, no NLP. It sits behind the [`SignalExtractor`] trait so a
//! smarter parser can replace it without touching conflict detection or
//! discussion simulation.

use crate::core::conflict::DetectionThresholds;
use crate::domain::{ExtractedSignals, RiskTolerance, StrategyPriority, TimingPreference};

/// Seam for the heuristic parser.
pub trait SignalExtractor: Send + Sync {
    /// Parse one analysis into normalized signals. Pure and
    /// case-insensitive; same text always yields the same signals.
    fn extract(&self, analysis_text: &str) -> ExtractedSignals;
}

/// Keyword families for risk tolerance, checked in priority order;
/// the first family with a hit wins. Also reused by the discussion
/// simulator to locate risk-relevant sentences.
pub(crate) const RISK_FAMILIES: &[(RiskTolerance, &[&str])] = &[
    (
        RiskTolerance::Conservative,
        &[
            "conservative",
            "low risk",
            "low-risk",
            "capital protection",
            "risk averse",
            "risk-averse",
            "cautious",
        ],
    ),
    (
        RiskTolerance::Aggressive,
        &[
            "aggressive",
            "high risk",
            "high-risk",
            "high growth",
            "growth oriented",
            "growth-oriented",
            "equity heavy",
            "equity-heavy",
        ],
    ),
    (
        RiskTolerance::Moderate,
        &["moderate", "medium risk", "balanced risk"],
    ),
];

/// Keyword families for timing preference, in priority order.
pub(crate) const TIMING_FAMILIES: &[(TimingPreference, &[&str])] = &[
    (
        TimingPreference::Immediate,
        &[
            "immediately",
            "right away",
            "urgent",
            "as soon as possible",
            "without delay",
        ],
    ),
    (
        TimingPreference::ShortTerm,
        &[
            "short term",
            "short-term",
            "within a year",
            "next few months",
            "six months",
        ],
    ),
    (
        TimingPreference::LongTerm,
        &[
            "long term",
            "long-term",
            "retirement",
            "over the years",
            "decade",
        ],
    ),
];

/// Keyword families scored by frequency for strategy priority.
/// Stems are used so "savings"/"saving" and "invest"/"investment"
/// count once per occurrence.
pub(crate) const DEBT_KEYWORDS: &[&str] = &["debt", "loan", "emi", "repay", "liabilit"];
pub(crate) const INVESTMENT_KEYWORDS: &[&str] =
    &["invest", "equity", "mutual fund", "sip", "stock", "portfolio"];
pub(crate) const SAVINGS_KEYWORDS: &[&str] =
    &["saving", "emergency fund", "deposit", "liquid"];

/// The default extractor: currency scanning plus keyword matching.
pub struct KeywordSignalExtractor {
    /// Monetary candidates below this are treated as stray numbers
    min_amount: f64,
    /// Monetary candidates above this are treated as stray numbers
    max_amount: f64,
}

impl KeywordSignalExtractor {
    pub fn new(thresholds: &DetectionThresholds) -> Self {
        Self {
            min_amount: thresholds.min_plausible_amount,
            max_amount: thresholds.max_plausible_amount,
        }
    }
}

impl Default for KeywordSignalExtractor {
    fn default() -> Self {
        Self::new(&DetectionThresholds::default())
    }
}

impl SignalExtractor for KeywordSignalExtractor {
    fn extract(&self, analysis_text: &str) -> ExtractedSignals {
        let text = analysis_text.to_lowercase();

        ExtractedSignals {
            budget_amount: self.extract_amount(&text),
            risk_tolerance: first_family_hit(&text, RISK_FAMILIES, RiskTolerance::Unknown),
            timing_preference: first_family_hit(&text, TIMING_FAMILIES, TimingPreference::Unknown),
            strategy_priority: score_strategy(&text),
        }
    }
}

impl KeywordSignalExtractor {
    /// Find every currency-amount mention, normalize to base units, and
    /// take the median of the plausible candidates.
    fn extract_amount(&self, text: &str) -> Option<f64> {
        let chars: Vec<char> = text.chars().collect();
        let mut candidates = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if !chars[i].is_ascii_digit() {
                i += 1;
                continue;
            }

            let (value, end) = parse_number(&chars, i);
            let has_marker = currency_marker_before(&chars, i);
            let (multiplier, after_unit) = unit_after(&chars, end);

            // A bare number is not a monetary mention; it needs a
            // currency marker or a unit suffix to qualify.
            if has_marker || multiplier.is_some() {
                let normalized = value * multiplier.unwrap_or(1.0);
                if normalized >= self.min_amount && normalized <= self.max_amount {
                    candidates.push(normalized);
                }
            }

            i = after_unit.max(end);
        }

        median(&mut candidates)
    }
}

/// First category whose keyword set has a hit, in family order.
fn first_family_hit<T: Copy>(text: &str, families: &[(T, &[&str])], fallback: T) -> T {
    for (category, keywords) in families {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *category;
        }
    }
    fallback
}

/// Frequency scoring across the three strategy keyword families.
/// The strictly highest count wins; ties and all-zero yield Balanced.
fn score_strategy(text: &str) -> StrategyPriority {
    let debt = family_count(text, DEBT_KEYWORDS);
    let investment = family_count(text, INVESTMENT_KEYWORDS);
    let savings = family_count(text, SAVINGS_KEYWORDS);

    let top = debt.max(investment).max(savings);
    if top == 0 {
        return StrategyPriority::Balanced;
    }

    let winners = [debt, investment, savings]
        .iter()
        .filter(|&&c| c == top)
        .count();
    if winners > 1 {
        return StrategyPriority::Balanced;
    }

    if debt == top {
        StrategyPriority::DebtFocus
    } else if investment == top {
        StrategyPriority::InvestmentFocus
    } else {
        StrategyPriority::SavingsFocus
    }
}

pub(crate) fn family_count(text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .map(|kw| text.match_indices(kw).count())
        .sum()
}

/// Parse a number starting at `start`: digits with optional comma
/// grouping (Indian or western) and at most one decimal point.
/// Returns the value and the index one past the number.
fn parse_number(chars: &[char], start: usize) -> (f64, usize) {
    let mut end = start;
    let mut raw = String::new();
    let mut seen_point = false;

    while end < chars.len() {
        let c = chars[end];
        if c.is_ascii_digit() {
            raw.push(c);
        } else if c == ',' && end + 1 < chars.len() && chars[end + 1].is_ascii_digit() {
            // grouping separator, skip
        } else if c == '.'
            && !seen_point
            && end + 1 < chars.len()
            && chars[end + 1].is_ascii_digit()
        {
            seen_point = true;
            raw.push('.');
        } else {
            break;
        }
        end += 1;
    }

    (raw.parse().unwrap_or(0.0), end)
}

/// Does a currency marker directly precede the number? Recognizes the
/// rupee sign and the words "rs", "rs.", "inr", "rupees".
fn currency_marker_before(chars: &[char], num_start: usize) -> bool {
    let mut i = num_start;
    while i > 0 && chars[i - 1].is_whitespace() {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    if chars[i - 1] == '₹' {
        return true;
    }

    // Collect the word (letters and a trailing dot) ending at i
    let mut start = i;
    while start > 0 && (chars[start - 1].is_alphabetic() || chars[start - 1] == '.') {
        start -= 1;
    }
    if start == i {
        return false;
    }

    let word: String = chars[start..i].iter().collect();
    matches!(
        word.trim_end_matches('.'),
        "rs" | "inr" | "rupees" | "rupee"
    )
}

/// Unit suffix after the number: "k"/"thousand" ×1e3, "lakh"/"lac"
/// ×1e5, "crore"/"cr" ×1e7. The suffix may be glued ("40k") or a
/// separate word ("5 lakh"). Returns the multiplier (if any) and the
/// index one past the consumed suffix.
fn unit_after(chars: &[char], num_end: usize) -> (Option<f64>, usize) {
    let mut i = num_end;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }

    let mut end = i;
    while end < chars.len() && chars[end].is_alphabetic() {
        end += 1;
    }
    if end == i {
        return (None, num_end);
    }

    let word: String = chars[i..end].iter().collect();
    let multiplier = match word.as_str() {
        "k" | "thousand" => Some(1_000.0),
        "lakh" | "lakhs" | "lac" | "lacs" => Some(100_000.0),
        "crore" | "crores" | "cr" => Some(10_000_000.0),
        _ => None,
    };

    match multiplier {
        Some(m) => (Some(m), end),
        None => (None, num_end),
    }
}

/// Median; mean of the two middle values for even counts.
fn median(values: &mut Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
