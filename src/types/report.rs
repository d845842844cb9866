//! Analysis report returned to the presentation layer.

use serde::{Deserialize, Serialize};
use super::unit::UnitId;

/// Why a relation was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Two relations directly conflict.
    Contradiction,
    /// The relation closed a cycle.
    Cycle,
    /// The spatial relation has no temporal meaning.
    NonTemporalRelation,
    /// The pair was recorded more than once with different chronologies.
    Multiple,
    /// The record could not be interpreted.
    Faulty,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contradiction => write!(f, "CONTRADICTION"),
            Self::Cycle => write!(f, "CYCLE"),
            Self::NonTemporalRelation => write!(f, "NON_TEMPORAL_RELATION"),
            Self::Multiple => write!(f, "MULTIPLE"),
            Self::Faulty => write!(f, "FAULTY"),
        }
    }
}

/// A relation removed during ingest or analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedRelation {
    /// Source unit of the removed relation.
    pub from: UnitId,
    /// Related unit of the removed relation.
    pub to: UnitId,
    /// Reason for the removal.
    pub reason: ReasonCode,
}

/// A cycle found during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Node sequence of the cycle as detected.
    pub original_cycle: Vec<UnitId>,
    /// Whether the cycle was broken.
    pub solved: bool,
}

/// Outcome of a consistency analysis.
///
/// `removed` is deduplicated by `(from, to)`; the first reason wins.
/// `result` is false iff some cycle could not be solved, in which case the
/// matrix must not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Cycles found, in detection order.
    pub cycles: Vec<CycleRecord>,
    /// Relations dropped, in removal order.
    pub removed: Vec<RemovedRelation>,
    /// Fatal diagnostics.
    pub errors: Vec<String>,
    /// False when the matrix cannot be rendered.
    pub result: bool,
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self {
            cycles: Vec::new(),
            removed: Vec::new(),
            errors: Vec::new(),
            result: true,
        }
    }
}

impl AnalysisReport {
    /// Create an empty, successful report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a removed relation. Returns false if the pair was already recorded.
    pub fn record_removed(&mut self, from: &UnitId, to: &UnitId, reason: ReasonCode) -> bool {
        if self.removed.iter().any(|r| &r.from == from && &r.to == to) {
            return false;
        }
        self.removed.push(RemovedRelation {
            from: from.clone(),
            to: to.clone(),
            reason,
        });
        true
    }

    /// Record a cycle that was broken (or was already broken).
    pub fn record_solved_cycle(&mut self, cycle: Vec<UnitId>) {
        self.cycles.push(CycleRecord {
            original_cycle: cycle,
            solved: true,
        });
    }

    /// Record a cycle that could not be broken. Marks the report as failed.
    pub fn record_unsolved_cycle(&mut self, cycle: Vec<UnitId>) {
        let first = cycle.first().map(UnitId::to_string).unwrap_or_default();
        let last = cycle.last().map(UnitId::to_string).unwrap_or_default();
        self.errors.push(format!(
            "Cannot solve cycle {first}->{last}. Matrix cannot be rendered."
        ));
        self.cycles.push(CycleRecord {
            original_cycle: cycle,
            solved: false,
        });
        self.result = false;
    }

    /// Whether the matrix may be rendered.
    pub fn is_renderable(&self) -> bool {
        self.result
    }

    /// Removed relations with the given reason.
    pub fn removed_with(&self, reason: ReasonCode) -> impl Iterator<Item = &RemovedRelation> {
        self.removed.iter().filter(move |r| r.reason == reason)
    }

    /// Whether nothing was removed and no cycle was found.
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.removed.is_empty() && self.errors.is_empty()
    }
}
