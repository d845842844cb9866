//! Transitive reduction of the later relation.

use tracing::debug;

use crate::store::RelationStore;
use crate::types::Relation;

/// Error type for transitive reduction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReductionError {
    /// The later relation still contains a cycle.
    #[error("Cannot reduce a cyclic matrix; resolve cycles first")]
    Cyclic,
}

/// Remove every later edge implied by a longer path.
///
/// Walks from the roots with an explicit worklist, processing each node once:
/// for every remaining edge `(node, child)`, any direct edge from `node` to a
/// unit reachable from `child` is dropped. Reachability is unchanged and
/// contemporary relations are untouched. Returns the removed edges in removal
/// order.
pub fn reduce_transitive(store: &mut RelationStore) -> Result<Vec<Relation>, ReductionError> {
    if !store.is_acyclic() {
        return Err(ReductionError::Cyclic);
    }

    let mut removed = Vec::new();
    let mut done = vec![false; store.len()];
    let mut worklist = store.root_indices();
    worklist.reverse();

    while let Some(node) = worklist.pop() {
        if done[node.index()] {
            continue;
        }
        done[node.index()] = true;

        for child in store.later_idx(node).to_vec() {
            if !store.has_later_idx(node, child) {
                continue;
            }
            for implied in store.reachable_idx(child) {
                if store.remove_later_idx(node, implied) {
                    removed.push(Relation::new(
                        store.id_of(node).clone(),
                        store.id_of(implied).clone(),
                    ));
                }
            }
        }

        worklist.extend(
            store
                .later_idx(node)
                .iter()
                .rev()
                .filter(|child| !done[child.index()]),
        );
    }

    debug!(removed = removed.len(), "transitive reduction complete");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StratigraphicUnit, UnitId};

    fn store_of(edges: &[(&str, &[&str])]) -> RelationStore {
        RelationStore::from_units(
            edges
                .iter()
                .map(|(id, later)| StratigraphicUnit::named_by_id(*id).with_later_than(later.iter().copied())),
        )
    }

    #[test]
    fn test_diamond() {
        let mut store = store_of(&[("T", &["1", "3"]), ("1", &["2", "3"]), ("2", &["3"]), ("3", &[])]);

        let removed = reduce_transitive(&mut store).unwrap();

        assert_eq!(removed, vec![Relation::new("T", "3"), Relation::new("1", "3")]);
        assert_eq!(
            store.later_edges(),
            vec![Relation::new("T", "1"), Relation::new("1", "2"), Relation::new("2", "3")]
        );
    }

    #[test]
    fn test_rejects_cycle_until_broken() {
        let mut store = store_of(&[("1", &["2"]), ("2", &["3"]), ("3", &["4"]), ("4", &["1"])]);

        assert_eq!(reduce_transitive(&mut store), Err(ReductionError::Cyclic));

        assert!(store.remove_later(&UnitId::from("4"), &UnitId::from("1")));
        let removed = reduce_transitive(&mut store).unwrap();
        assert!(removed.is_empty());
        assert_eq!(
            store.later_edges(),
            vec![Relation::new("1", "2"), Relation::new("2", "3"), Relation::new("3", "4")]
        );
    }

    #[test]
    fn test_contemporaries_untouched() {
        let mut store = RelationStore::from_units(vec![
            StratigraphicUnit::named_by_id("a").with_later_than(["b", "c"]),
            StratigraphicUnit::named_by_id("b").with_later_than(["c"]).with_contemporaries(["d"]),
            StratigraphicUnit::named_by_id("c"),
            StratigraphicUnit::named_by_id("d"),
        ]);

        reduce_transitive(&mut store).unwrap();

        assert!(!store.has_later(&UnitId::from("a"), &UnitId::from("c")));
        assert!(store.has_contemporary(&UnitId::from("b"), &UnitId::from("d")));
    }
}
