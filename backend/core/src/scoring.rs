//! Overall similarity and the accept/flag threshold.

use serde::Serialize;

use crate::types::ComparisonRecord;

/// Minimum similarity for a form (or a single field) to be accepted.
pub const ACCEPT_THRESHOLD: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDecision {
    Accepted,
    Flagged,
}

impl MatchDecision {
    /// Plain `>=` on the value as computed. A mean that is 0.90 only in real
    /// arithmetic, such as `(0.95 + 0.85) / 2`, comes out as
    /// `0.8999999999999999` and is flagged.
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= ACCEPT_THRESHOLD {
            Self::Accepted
        } else {
            Self::Flagged
        }
    }
}

/// Mean similarity over records whose master value is neither empty nor
/// `N/A`. Zero when no record qualifies. Always within `[0, 1]`.
pub fn overall_similarity(records: &[ComparisonRecord]) -> f64 {
    let scored: Vec<f64> = records
        .iter()
        .filter(|r| r.is_scored())
        .map(|r| clamp_unit(r.similarity))
        .collect();

    if scored.is_empty() {
        return 0.0;
    }
    clamp_unit(scored.iter().sum::<f64>() / scored.len() as f64)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
