//! Contemporary-cycle pass.
//!
//! With the later relation acyclic, contemporary edges can still close a cycle
//! when mixed with later edges (`A > B`, `B ~ C`, `C > A`). A depth-first
//! search from every root follows later edges first, then contemporaries other
//! than the one it arrived through. Reaching a node that is still on the stack
//! is a collision: the contemporary edge that led there is dropped.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::store::{RelationStore, UnitIdx};
use crate::types::{AnalysisReport, ReasonCode};
use super::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
}

struct Search<'a> {
    store: &'a mut RelationStore,
    report: &'a mut AnalysisReport,
    marks: Vec<Mark>,
    stack: Vec<UnitIdx>,
    started: Instant,
    limit: Duration,
    verbose: bool,
}

/// Find and break contemporary cycles.
///
/// Nodes return to unvisited when the search unwinds, so every path from a
/// root is explored. The search is bounded by `limit`; exceeding it is fatal.
/// Returns the number of cycles recorded.
pub fn resolve_contemporary_cycles(
    store: &mut RelationStore,
    report: &mut AnalysisReport,
    limit: Duration,
    verbose: bool,
) -> Result<usize, AnalysisError> {
    let roots = store.root_indices();
    let before = report.cycles.len();
    let mut search = Search {
        marks: vec![Mark::Unvisited; store.len()],
        store,
        report,
        stack: Vec::new(),
        started: Instant::now(),
        limit,
        verbose,
    };

    for root in roots {
        search.visit(root, None)?;
    }

    Ok(search.report.cycles.len() - before)
}

impl Search<'_> {
    /// Returns the colliding node, if any.
    fn visit(
        &mut self,
        node: UnitIdx,
        predecessor: Option<UnitIdx>,
    ) -> Result<Option<UnitIdx>, AnalysisError> {
        if self.started.elapsed() >= self.limit {
            return Err(AnalysisError::ContemporaryTimeout {
                limit_ms: self.limit.as_millis() as u64,
            });
        }

        match self.marks[node.index()] {
            Mark::InProgress => return Ok(Some(node)),
            Mark::Unvisited => {}
        }

        self.stack.push(node);
        self.marks[node.index()] = Mark::InProgress;

        for child in self.store.later_idx(node).to_vec() {
            if let Some(collision) = self.visit(child, None)? {
                self.stack.pop();
                self.marks[node.index()] = Mark::Unvisited;
                return Ok(Some(collision));
            }
        }

        for other in self.store.contemporaries_idx(node).to_vec() {
            if Some(other) == predecessor || !self.store.has_contemporary_idx(node, other) {
                continue;
            }
            if let Some(collision) = self.visit(other, Some(node))? {
                self.break_cycle(node, other, collision);
            }
        }

        self.stack.pop();
        self.marks[node.index()] = Mark::Unvisited;
        Ok(None)
    }

    fn break_cycle(&mut self, node: UnitIdx, other: UnitIdx, collision: UnitIdx) {
        if let Some(start) = self.stack.iter().position(|&n| n == collision) {
            let cycle = self.stack[start..]
                .iter()
                .map(|&n| self.store.id_of(n).clone())
                .collect::<Vec<_>>();
            if self.verbose {
                trace!(cycle = ?cycle, "contemporary cycle");
            }
            self.report.record_solved_cycle(cycle);
        }

        self.store.remove_contemporary_idx(node, other);
        let (n, o) = (self.store.id_of(node).clone(), self.store.id_of(other).clone());
        self.report.record_removed(&n, &o, ReasonCode::Cycle);
        self.report.record_removed(&o, &n, ReasonCode::Cycle);
    }
}
