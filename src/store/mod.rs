//! Relation storage.
//!
//! Units live in an arena addressed by [`UnitIdx`]; ids map to indices through
//! a `BTreeMap`. Removing a relation deletes an index from a relation list and
//! never invalidates a unit slot.
//!
//! ## Ordering
//!
//! Every relation list keeps insertion order. All traversals of the analysis
//! walk units in arena order and relations in list order, so the same input
//! always yields the same report and layout.

pub mod ingest;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::types::{GridPosition, Relation, StratigraphicUnit, UnitId};

pub use ingest::RecordIngest;

/// Stable arena index of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitIdx(usize);

impl UnitIdx {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Slot {
    /// Unit metadata; relation lists are kept empty here.
    unit: StratigraphicUnit,
    later: Vec<UnitIdx>,
    earlier: Vec<UnitIdx>,
    contemporary: Vec<UnitIdx>,
}

/// Units and their later/contemporary relations.
///
/// Mutations report failure as `false` instead of erroring: unknown units,
/// self relations, duplicates and missing edges are all refused quietly so
/// callers can log and continue.
#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    slots: Vec<Slot>,
    index: BTreeMap<UnitId, UnitIdx>,
}

impl RelationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from unit snapshots.
    ///
    /// Relations referencing unknown units create those units with their id as
    /// name. Declared contemporaries are loaded first; missing reverse
    /// references are appended afterwards.
    pub fn from_units(units: impl IntoIterator<Item = StratigraphicUnit>) -> Self {
        let units: Vec<StratigraphicUnit> = units.into_iter().collect();
        let mut store = Self::new();

        for unit in &units {
            store.add_unit(unit.clone());
        }
        for unit in &units {
            for target in &unit.later_than {
                store.ensure_unit(target);
                store.add_later(&unit.id, target);
            }
        }

        let mut declared = Vec::new();
        for unit in &units {
            let Some(a) = store.index_of(&unit.id) else { continue };
            for other in &unit.contemporary_with {
                let b = store.ensure_unit(other);
                if a != b && !store.slots[a.0].contemporary.contains(&b) {
                    store.slots[a.0].contemporary.push(b);
                    declared.push((a, b));
                }
            }
        }
        for (a, b) in declared {
            if !store.slots[b.0].contemporary.contains(&a) {
                store.slots[b.0].contemporary.push(a);
            }
        }

        store
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no units.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add a unit. Returns false if the id is already present.
    ///
    /// Relation lists on `unit` are not loaded; use [`Self::from_units`] or
    /// the `add_*` methods.
    pub fn add_unit(&mut self, mut unit: StratigraphicUnit) -> bool {
        if self.index.contains_key(&unit.id) {
            return false;
        }
        unit.later_than.clear();
        unit.contemporary_with.clear();
        let idx = UnitIdx(self.slots.len());
        self.index.insert(unit.id.clone(), idx);
        self.slots.push(Slot {
            unit,
            later: Vec::new(),
            earlier: Vec::new(),
            contemporary: Vec::new(),
        });
        true
    }

    /// Index of `id`, creating a unit named by its id when absent.
    pub fn ensure_unit(&mut self, id: &UnitId) -> UnitIdx {
        if let Some(idx) = self.index_of(id) {
            return idx;
        }
        self.add_unit(StratigraphicUnit::named_by_id(id.clone()));
        UnitIdx(self.slots.len() - 1)
    }

    /// Index of a unit id.
    pub fn index_of(&self, id: &UnitId) -> Option<UnitIdx> {
        self.index.get(id).copied()
    }

    /// Id of the unit at `idx`.
    pub fn id_of(&self, idx: UnitIdx) -> &UnitId {
        &self.slots[idx.0].unit.id
    }

    /// Unit metadata (relation lists empty).
    pub fn unit_meta(&self, idx: UnitIdx) -> &StratigraphicUnit {
        &self.slots[idx.0].unit
    }

    pub(crate) fn unit_meta_mut(&mut self, idx: UnitIdx) -> &mut StratigraphicUnit {
        &mut self.slots[idx.0].unit
    }

    /// Whether `id` is known.
    pub fn contains(&self, id: &UnitId) -> bool {
        self.index.contains_key(id)
    }

    /// All indices in arena order.
    pub fn indices(&self) -> impl Iterator<Item = UnitIdx> + '_ {
        (0..self.slots.len()).map(UnitIdx)
    }

    /// All ids in arena order.
    pub fn ids(&self) -> Vec<UnitId> {
        self.slots.iter().map(|s| s.unit.id.clone()).collect()
    }

    fn pair(&self, a: &UnitId, b: &UnitId) -> Option<(UnitIdx, UnitIdx)> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        (a != b).then_some((a, b))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation by id
    // ─────────────────────────────────────────────────────────────────────

    /// Record that `from` is later than `to`.
    pub fn add_later(&mut self, from: &UnitId, to: &UnitId) -> bool {
        self.pair(from, to).is_some_and(|(a, b)| self.add_later_idx(a, b))
    }

    /// Record that `a` and `b` are contemporary (both directions).
    pub fn add_contemporary(&mut self, a: &UnitId, b: &UnitId) -> bool {
        self.pair(a, b).is_some_and(|(a, b)| self.add_contemporary_idx(a, b))
    }

    /// Remove `from -> to`. Returns false if the edge did not exist.
    pub fn remove_later(&mut self, from: &UnitId, to: &UnitId) -> bool {
        self.pair(from, to).is_some_and(|(a, b)| self.remove_later_idx(a, b))
    }

    /// Remove the contemporary pair. Returns false if it did not exist.
    pub fn remove_contemporary(&mut self, a: &UnitId, b: &UnitId) -> bool {
        self.pair(a, b).is_some_and(|(a, b)| self.remove_contemporary_idx(a, b))
    }

    /// Whether `from -> to` exists.
    pub fn has_later(&self, from: &UnitId, to: &UnitId) -> bool {
        self.pair(from, to).is_some_and(|(a, b)| self.has_later_idx(a, b))
    }

    /// Whether `a` and `b` are contemporary.
    pub fn has_contemporary(&self, a: &UnitId, b: &UnitId) -> bool {
        self.pair(a, b).is_some_and(|(a, b)| self.has_contemporary_idx(a, b))
    }

    /// Assign a grid position to a unit.
    pub fn set_position(&mut self, id: &UnitId, position: GridPosition) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.slots[idx.0].unit.position = Some(position);
                true
            }
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation by index
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn add_later_idx(&mut self, from: UnitIdx, to: UnitIdx) -> bool {
        if from == to || self.has_later_idx(from, to) {
            return false;
        }
        self.slots[from.0].later.push(to);
        self.slots[to.0].earlier.push(from);
        true
    }

    pub(crate) fn add_contemporary_idx(&mut self, a: UnitIdx, b: UnitIdx) -> bool {
        if a == b || self.has_contemporary_idx(a, b) {
            return false;
        }
        self.slots[a.0].contemporary.push(b);
        self.slots[b.0].contemporary.push(a);
        true
    }

    pub(crate) fn remove_later_idx(&mut self, from: UnitIdx, to: UnitIdx) -> bool {
        let Some(pos) = self.slots[from.0].later.iter().position(|&x| x == to) else {
            return false;
        };
        self.slots[from.0].later.remove(pos);
        self.slots[to.0].earlier.retain(|&x| x != from);
        true
    }

    pub(crate) fn remove_contemporary_idx(&mut self, a: UnitIdx, b: UnitIdx) -> bool {
        let before = self.slots[a.0].contemporary.len();
        self.slots[a.0].contemporary.retain(|&x| x != b);
        let removed = self.slots[a.0].contemporary.len() != before;
        self.slots[b.0].contemporary.retain(|&x| x != a);
        removed
    }

    pub(crate) fn has_later_idx(&self, from: UnitIdx, to: UnitIdx) -> bool {
        self.slots[from.0].later.contains(&to)
    }

    pub(crate) fn has_contemporary_idx(&self, a: UnitIdx, b: UnitIdx) -> bool {
        self.slots[a.0].contemporary.contains(&b)
    }

    pub(crate) fn later_idx(&self, idx: UnitIdx) -> &[UnitIdx] {
        &self.slots[idx.0].later
    }

    pub(crate) fn contemporaries_idx(&self, idx: UnitIdx) -> &[UnitIdx] {
        &self.slots[idx.0].contemporary
    }

    pub(crate) fn root_indices(&self) -> Vec<UnitIdx> {
        self.indices().filter(|&i| self.slots[i.0].earlier.is_empty()).collect()
    }

    /// Indices reachable from `start` via later edges, excluding `start`
    /// unless it lies on a cycle. Discovery order.
    pub(crate) fn reachable_idx(&self, start: UnitIdx) -> Vec<UnitIdx> {
        let mut seen = vec![false; self.slots.len()];
        let mut found = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in &self.slots[node.0].later {
                if !seen[next.0] {
                    seen[next.0] = true;
                    found.push(next);
                    stack.push(next);
                }
            }
        }
        found
    }

    // ─────────────────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────────────────

    /// Units `id` is later than, in insertion order.
    pub fn out_edges(&self, id: &UnitId) -> Vec<UnitId> {
        self.view(id, |s| &s.later)
    }

    /// Units later than `id`, in insertion order.
    pub fn in_edges(&self, id: &UnitId) -> Vec<UnitId> {
        self.view(id, |s| &s.earlier)
    }

    /// Contemporaries of `id`, in insertion order.
    pub fn contemporaries(&self, id: &UnitId) -> Vec<UnitId> {
        self.view(id, |s| &s.contemporary)
    }

    fn view(&self, id: &UnitId, list: impl Fn(&Slot) -> &Vec<UnitIdx>) -> Vec<UnitId> {
        self.index_of(id)
            .map(|idx| list(&self.slots[idx.0]).iter().map(|&i| self.id_of(i).clone()).collect())
            .unwrap_or_default()
    }

    /// Units with no incoming later edge, in arena order.
    pub fn roots(&self) -> Vec<UnitId> {
        self.root_indices().into_iter().map(|i| self.id_of(i).clone()).collect()
    }

    /// All later edges, by unit then insertion order.
    pub fn later_edges(&self) -> Vec<Relation> {
        self.slots
            .iter()
            .flat_map(|s| {
                s.later
                    .iter()
                    .map(move |&t| Relation::new(s.unit.id.clone(), self.id_of(t).clone()))
            })
            .collect()
    }

    /// Each contemporary pair once, in order of first appearance.
    pub fn contemporary_pairs(&self) -> Vec<(UnitId, UnitId)> {
        let mut pairs = Vec::new();
        for a in self.indices() {
            for &b in &self.slots[a.0].contemporary {
                if a < b {
                    pairs.push((self.id_of(a).clone(), self.id_of(b).clone()));
                }
            }
        }
        pairs
    }

    /// Ids reachable from `id` via later edges.
    pub fn reachable_from(&self, id: &UnitId) -> BTreeSet<UnitId> {
        self.index_of(id)
            .map(|idx| {
                self.reachable_idx(idx)
                    .into_iter()
                    .map(|i| self.id_of(i).clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the later relation is acyclic.
    pub fn is_acyclic(&self) -> bool {
        let mut indegree: Vec<usize> = self.slots.iter().map(|s| s.earlier.len()).collect();
        let mut queue: VecDeque<usize> = (0..self.slots.len()).filter(|&i| indegree[i] == 0).collect();
        let mut visited = 0;
        while let Some(node) = queue.pop_front() {
            visited += 1;
            for &next in &self.slots[node].later {
                indegree[next.0] -= 1;
                if indegree[next.0] == 0 {
                    queue.push_back(next.0);
                }
            }
        }
        visited == self.slots.len()
    }

    /// Snapshot of all units with their current relation lists.
    pub fn units(&self) -> Vec<StratigraphicUnit> {
        self.slots
            .iter()
            .map(|s| {
                let mut unit = s.unit.clone();
                unit.later_than = s.later.iter().map(|&i| self.id_of(i).clone()).collect();
                unit.contemporary_with =
                    s.contemporary.iter().map(|&i| self.id_of(i).clone()).collect();
                unit
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UnitId {
        UnitId::from(s)
    }

    fn store_of(ids: &[&str]) -> RelationStore {
        let mut store = RelationStore::new();
        for i in ids {
            store.add_unit(StratigraphicUnit::named_by_id(*i));
        }
        store
    }

    #[test]
    fn test_add_and_remove_later_idempotent() {
        let mut store = store_of(&["a", "b"]);

        assert!(store.add_later(&id("a"), &id("b")));
        assert!(!store.add_later(&id("a"), &id("b")));
        assert_eq!(store.out_edges(&id("a")), vec![id("b")]);
        assert_eq!(store.in_edges(&id("b")), vec![id("a")]);

        assert!(store.remove_later(&id("a"), &id("b")));
        assert!(!store.remove_later(&id("a"), &id("b")));
        assert!(store.out_edges(&id("a")).is_empty());
        assert!(store.in_edges(&id("b")).is_empty());
    }

    #[test]
    fn test_refuses_self_and_unknown() {
        let mut store = store_of(&["a"]);

        assert!(!store.add_later(&id("a"), &id("a")));
        assert!(!store.add_later(&id("a"), &id("zz")));
        assert!(!store.add_contemporary(&id("a"), &id("a")));
        assert!(!store.remove_contemporary(&id("a"), &id("zz")));
    }

    #[test]
    fn test_contemporary_symmetric() {
        let mut store = store_of(&["a", "b"]);

        assert!(store.add_contemporary(&id("a"), &id("b")));
        assert!(!store.add_contemporary(&id("b"), &id("a")));
        assert!(store.has_contemporary(&id("b"), &id("a")));

        assert!(store.remove_contemporary(&id("b"), &id("a")));
        assert!(!store.has_contemporary(&id("a"), &id("b")));
        assert!(!store.remove_contemporary(&id("a"), &id("b")));
    }

    #[test]
    fn test_from_units_symmetrizes_and_creates_missing() {
        let store = RelationStore::from_units(vec![
            StratigraphicUnit::named_by_id("1").with_later_than(["2", "9"]),
            StratigraphicUnit::named_by_id("2").with_contemporaries(["3"]),
            StratigraphicUnit::named_by_id("3"),
        ]);

        assert_eq!(store.len(), 4);
        assert_eq!(store.contemporaries(&id("3")), vec![id("2")]);
        assert_eq!(store.unit_meta(store.index_of(&id("9")).unwrap()).name, "9");
        assert_eq!(store.roots(), vec![id("1"), id("3")]);
    }

    #[test]
    fn test_acyclic_and_reachability() {
        let mut store = store_of(&["a", "b", "c"]);
        store.add_later(&id("a"), &id("b"));
        store.add_later(&id("b"), &id("c"));
        assert!(store.is_acyclic());
        assert_eq!(
            store.reachable_from(&id("a")),
            [id("b"), id("c")].into_iter().collect()
        );

        store.add_later(&id("c"), &id("a"));
        assert!(!store.is_acyclic());
        assert!(store.roots().is_empty());
    }

    #[test]
    fn test_units_snapshot_roundtrip() {
        let units = vec![
            StratigraphicUnit::named_by_id("1").with_later_than(["2"]).with_contemporaries(["3"]),
            StratigraphicUnit::named_by_id("2"),
            StratigraphicUnit::named_by_id("3"),
        ];
        let store = RelationStore::from_units(units);
        let snapshot = store.units();

        assert_eq!(snapshot[0].later_than, vec![id("2")]);
        assert_eq!(snapshot[2].contemporary_with, vec![id("1")]);
        assert_eq!(store.contemporary_pairs(), vec![(id("1"), id("3"))]);
    }
}
