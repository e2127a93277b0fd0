//! Trust Score Accumulator
//!
//! `score = clamp(100 - sum(penalty), 0, 100)` over the whole ledger.
//! The running value is kept incrementally; `recompute` re-derives it from
//! the full ledger and must always agree with the running value.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_TRUST_SCORE;
use crate::logic::incident::{IncidentClass, IncidentLedger, IncidentRecord};

/// Running trust score (saturating deduction counter)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustScore {
    deducted: u64,
}

impl TrustScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one incident's penalty, returning the new score
    pub fn apply(&mut self, class: IncidentClass) -> u8 {
        self.deducted = self.deducted.saturating_add(class.penalty() as u64);
        self.value()
    }

    /// Current score, always within [0, 100]
    pub fn value(&self) -> u8 {
        clamp_score(self.deducted)
    }

    /// Raw sum of penalties (may exceed 100)
    pub fn deducted(&self) -> u64 {
        self.deducted
    }

    /// Full recomputation from a ledger
    pub fn recompute(ledger: &IncidentLedger) -> u8 {
        score_for(ledger.all())
    }
}

/// Score of an arbitrary record sequence
pub fn score_for<'a, I>(records: I) -> u8
where
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let deducted = records
        .into_iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.penalty() as u64));
    clamp_score(deducted)
}

fn clamp_score(deducted: u64) -> u8 {
    let max = MAX_TRUST_SCORE as u64;
    (max - deducted.min(max)) as u8
}

// ============================================================================
// EXPLANATION
// ============================================================================

/// Per-class contribution to the deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub class: IncidentClass,
    pub count: u32,
    pub penalty_each: u32,
    pub total: u64,
    pub description: String,
}

/// Human-readable breakdown of a score (audit dashboard)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: u8,
    pub deductions: Vec<Deduction>,
    pub total_deducted: u64,
    pub score: u8,
}

pub fn breakdown(ledger: &IncidentLedger) -> ScoreBreakdown {
    let deductions: Vec<Deduction> = ledger
        .summary()
        .into_iter()
        .map(|(class, count)| Deduction {
            class,
            count,
            penalty_each: class.penalty(),
            total: count as u64 * class.penalty() as u64,
            description: class.description().to_string(),
        })
        .collect();

    let total_deducted = deductions.iter().map(|d| d.total).sum();

    ScoreBreakdown {
        base: MAX_TRUST_SCORE,
        deductions,
        total_deducted,
        score: clamp_score(total_deducted),
    }
}
