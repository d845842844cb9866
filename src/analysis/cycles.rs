//! Structural cycle pass over the later relation.
//!
//! Cycles are enumerated with Johnson's algorithm. Start vertices and
//! successors are visited in arena order, so the enumeration order is stable.

use tracing::{trace, warn};

use crate::store::{RelationStore, UnitIdx};
use crate::types::{AnalysisReport, ReasonCode, UnitId};

/// Enumerate every elementary cycle of the later relation, as id sequences.
pub fn elementary_cycles(store: &RelationStore) -> Vec<Vec<UnitId>> {
    johnson(store)
        .into_iter()
        .map(|cycle| to_ids(store, &cycle))
        .collect()
}

/// Break every structural cycle.
///
/// For each enumerated cycle the first existing edge between consecutive
/// candidate nodes is removed and the cycles are recounted. If the count did
/// not drop, the first candidate is discarded and the next edge tried. A cycle
/// with no removable edge left is recorded unsolved, which makes the matrix
/// unrenderable. Returns the number of cycles enumerated.
pub fn resolve_structural_cycles(
    store: &mut RelationStore,
    report: &mut AnalysisReport,
    verbose: bool,
) -> usize {
    let cycles = johnson(store);
    let found = cycles.len();
    let mut remaining = found;

    for cycle in cycles {
        let ids = to_ids(store, &cycle);

        if !is_closed(store, &cycle) {
            if verbose {
                trace!(cycle = ?ids, "cycle already broken");
            }
            report.record_solved_cycle(ids);
            continue;
        }

        let mut candidates = cycle;
        let mut solved = false;
        while !candidates.is_empty() {
            let Some((from, to)) = first_edge(store, &candidates) else {
                break;
            };
            store.remove_later_idx(from, to);
            report.record_removed(store.id_of(from), store.id_of(to), ReasonCode::Cycle);
            if verbose {
                trace!(from = %store.id_of(from), to = %store.id_of(to), "removed cycle edge");
            }

            let now = johnson(store).len();
            if now < remaining {
                remaining = now;
                solved = true;
                break;
            }
            candidates.remove(0);
        }

        if solved {
            report.record_solved_cycle(ids);
        } else {
            warn!(cycle = ?ids, "unsolvable cycle");
            report.record_unsolved_cycle(ids);
        }
    }

    found
}

fn to_ids(store: &RelationStore, cycle: &[UnitIdx]) -> Vec<UnitId> {
    cycle.iter().map(|&i| store.id_of(i).clone()).collect()
}

fn is_closed(store: &RelationStore, cycle: &[UnitIdx]) -> bool {
    (0..cycle.len()).all(|i| store.has_later_idx(cycle[i], cycle[(i + 1) % cycle.len()]))
}

fn first_edge(store: &RelationStore, nodes: &[UnitIdx]) -> Option<(UnitIdx, UnitIdx)> {
    (0..nodes.len())
        .map(|i| (nodes[i], nodes[(i + 1) % nodes.len()]))
        .find(|&(from, to)| from != to && store.has_later_idx(from, to))
}

pub(crate) fn johnson(store: &RelationStore) -> Vec<Vec<UnitIdx>> {
    let adj: Vec<Vec<usize>> = store
        .indices()
        .map(|i| store.later_idx(i).iter().map(|t| t.index()).collect())
        .collect();
    let nodes: Vec<UnitIdx> = store.indices().collect();

    Johnson::new(&adj)
        .run()
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|i| nodes[i]).collect())
        .collect()
}

struct Johnson<'a> {
    adj: &'a [Vec<usize>],
    start: usize,
    members: Vec<bool>,
    blocked: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
    stack: Vec<usize>,
    cycles: Vec<Vec<usize>>,
}

impl<'a> Johnson<'a> {
    fn new(adj: &'a [Vec<usize>]) -> Self {
        let n = adj.len();
        Self {
            adj,
            start: 0,
            members: vec![false; n],
            blocked: vec![false; n],
            blocked_by: vec![Vec::new(); n],
            stack: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<usize>> {
        let n = self.adj.len();
        let mut s = 0;
        while s < n {
            let Some(component) = strongly_connected(self.adj, s)
                .into_iter()
                .filter(|c| c.len() > 1)
                .min_by_key(|c| c.iter().copied().min().unwrap_or(usize::MAX))
            else {
                break;
            };

            self.start = component.iter().copied().min().unwrap_or(s);
            self.members.iter_mut().for_each(|m| *m = false);
            for &v in &component {
                self.members[v] = true;
                self.blocked[v] = false;
                self.blocked_by[v].clear();
            }
            self.circuit(self.start);
            s = self.start + 1;
        }
        self.cycles
    }

    fn circuit(&mut self, v: usize) -> bool {
        let adj = self.adj;
        let mut found = false;
        self.stack.push(v);
        self.blocked[v] = true;

        for &w in &adj[v] {
            if !self.members[w] {
                continue;
            }
            if w == self.start {
                self.cycles.push(self.stack.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for &w in &adj[v] {
                if self.members[w] && !self.blocked_by[w].contains(&v) {
                    self.blocked_by[w].push(v);
                }
            }
        }

        self.stack.pop();
        found
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        for w in std::mem::take(&mut self.blocked_by[u]) {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}

/// Tarjan's strongly connected components of the subgraph induced by
/// vertices `>= from`.
fn strongly_connected(adj: &[Vec<usize>], from: usize) -> Vec<Vec<usize>> {
    struct Tarjan<'a> {
        adj: &'a [Vec<usize>],
        from: usize,
        counter: usize,
        index: Vec<Option<usize>>,
        low: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        components: Vec<Vec<usize>>,
    }

    impl Tarjan<'_> {
        fn visit(&mut self, v: usize) {
            let adj = self.adj;
            self.index[v] = Some(self.counter);
            self.low[v] = self.counter;
            self.counter += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            for &w in &adj[v] {
                if w < self.from {
                    continue;
                }
                match self.index[w] {
                    None => {
                        self.visit(w);
                        self.low[v] = self.low[v].min(self.low[w]);
                    }
                    Some(index) if self.on_stack[w] => {
                        self.low[v] = self.low[v].min(index);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.low[v]) == self.index[v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }

    let n = adj.len();
    let mut tarjan = Tarjan {
        adj,
        from,
        counter: 0,
        index: vec![None; n],
        low: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        components: Vec::new(),
    };
    for v in from..n {
        if tarjan.index[v].is_none() {
            tarjan.visit(v);
        }
    }
    tarjan.components
}
