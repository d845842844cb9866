//! Consistency analysis of a relation store.
//!
//! ## Passes
//!
//! 1. Contradictions: `A -> B` together with `B -> A`, or together with
//!    `A ~ B`. Directed relations win over contemporary ones.
//! 2. Structural cycles: every elementary cycle of the later relation is
//!    enumerated and broken one edge at a time.
//! 3. Contemporary cycles: later edges mixed with contemporary edges, found by
//!    a depth-first search from every root under a wall-clock watchdog.
//!
//! Each pass relies on the guarantees of the previous one, so the order is
//! fixed. Running the resolver on its own output removes nothing.
//!
//! In the report, removals and cycles of the contemporary pass are listed
//! before those of the first two passes.

pub mod contradiction;
pub mod cycles;
pub mod contemporary;
pub mod reduction;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::MatrixConfig;
use crate::store::RelationStore;
use crate::types::AnalysisReport;

/// Report error added when the contemporary pass cannot run.
pub const CONTEMPORARY_PASS_SKIPPED: &str =
    "Contemporary cycles were not analyzed because structural cycles remain.";

pub use contradiction::remove_contradictions;
pub use cycles::{elementary_cycles, resolve_structural_cycles};
pub use contemporary::resolve_contemporary_cycles;
pub use reduction::{reduce_transitive, ReductionError};

/// Error type for analysis operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The contemporary-cycle search exceeded its time budget.
    #[error("Contemporary cycle search exceeded {limit_ms} ms; matrix too dense to analyze")]
    ContemporaryTimeout {
        /// Configured budget in milliseconds.
        limit_ms: u64,
    },
}

/// Runs the three consistency passes over a store.
#[derive(Debug, Clone)]
pub struct ConsistencyResolver {
    timeout: Duration,
    trace: bool,
}

impl Default for ConsistencyResolver {
    fn default() -> Self {
        Self::new(&MatrixConfig::default())
    }
}

impl ConsistencyResolver {
    /// Create a resolver from configuration.
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            timeout: config.contemporary_timeout(),
            trace: config.trace,
        }
    }

    /// Resolve `store` in place and return a fresh report.
    pub fn resolve(&self, store: &mut RelationStore) -> Result<AnalysisReport, AnalysisError> {
        let mut report = AnalysisReport::new();
        self.resolve_into(store, &mut report)?;
        Ok(report)
    }

    /// Resolve `store` in place, appending to an existing report.
    pub fn resolve_into(
        &self,
        store: &mut RelationStore,
        report: &mut AnalysisReport,
    ) -> Result<(), AnalysisError> {
        let removed_start = report.removed.len();
        let cycles_start = report.cycles.len();

        let contradictions = remove_contradictions(store, report);
        debug!(removed = contradictions, "contradiction pass complete");

        let cycles_before = report.cycles.len();
        resolve_structural_cycles(store, report, self.trace);
        debug!(
            cycles = report.cycles.len() - cycles_before,
            renderable = report.result,
            "structural cycle pass complete"
        );

        // The search assumes an acyclic later relation
        if report.result {
            let removed_before = report.removed.len();
            let cycles_before = report.cycles.len();
            resolve_contemporary_cycles(store, report, self.timeout, self.trace)?;
            let (removed, cycles) = (
                report.removed.len() - removed_before,
                report.cycles.len() - cycles_before,
            );
            report.removed[removed_start..].rotate_right(removed);
            report.cycles[cycles_start..].rotate_right(cycles);
            debug!(cycles, removed, "contemporary cycle pass complete");
        } else {
            warn!("skipping contemporary cycle pass on cyclic matrix");
            report.errors.push(CONTEMPORARY_PASS_SKIPPED.to_string());
        }

        info!(
            units = store.len(),
            cycles = report.cycles.len(),
            removed = report.removed.len(),
            renderable = report.result,
            "consistency analysis complete"
        );
        Ok(())
    }
}
