//! Contradiction pass.

use crate::store::RelationStore;
use crate::types::{AnalysisReport, ReasonCode};

/// Remove pairwise contradictions.
///
/// `A -> B` with `B -> A` drops both edges. `A -> B` with `A ~ B` drops the
/// contemporary pair, whether or not `B -> A` was also present. Contradictions are pairwise-local, so the result does
/// not depend on iteration order. Returns the number of relations removed.
pub fn remove_contradictions(store: &mut RelationStore, report: &mut AnalysisReport) -> usize {
    let mut removed = 0;

    for unit in store.indices().collect::<Vec<_>>() {
        for target in store.later_idx(unit).to_vec() {
            if !store.has_later_idx(unit, target) {
                continue;
            }
            let (u, t) = (store.id_of(unit).clone(), store.id_of(target).clone());

            if store.remove_later_idx(target, unit) {
                store.remove_later_idx(unit, target);
                report.record_removed(&u, &t, ReasonCode::Contradiction);
                report.record_removed(&t, &u, ReasonCode::Contradiction);
                removed += 2;
            }
            if store.remove_contemporary_idx(unit, target) {
                report.record_removed(&t, &u, ReasonCode::Contradiction);
                removed += 1;
            }
        }
    }

    removed
}
