//! Loading relation records into a [`RelationStore`].
//!
//! Each record resolves to a chronology: an explicit label wins, otherwise the
//! spatial relation type is looked up. Records that cannot be interpreted are
//! dropped and noted in the report; the rest of the batch proceeds.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::{
    AnalysisReport, Chronology, ReasonCode, RelationRecord, SpatialRelation, UnitId,
};
use super::RelationStore;

/// Incremental record loader.
#[derive(Debug, Default)]
pub struct RecordIngest {
    store: RelationStore,
    report: AnalysisReport,
    /// Chronology already loaded per (unit, related) pair.
    loaded: BTreeMap<(UnitId, UnitId), Chronology>,
}

impl RecordIngest {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a batch of records.
    pub fn load(records: &[RelationRecord]) -> (RelationStore, AnalysisReport) {
        let mut ingest = Self::new();
        for record in records {
            // Drops are already noted in the report.
            let _ = ingest.push(record);
        }
        ingest.finish()
    }

    /// Load one record. Returns the applied chronology, or the reason it was dropped.
    pub fn push(&mut self, record: &RelationRecord) -> Result<Chronology, ReasonCode> {
        self.register(&record.unit_id, record);
        self.store.ensure_unit(&record.related_unit_id);

        let outcome = self.resolve(record);
        if let Err(reason) = outcome {
            warn!(
                unit = %record.unit_id,
                related = %record.related_unit_id,
                relation_type = %record.relation_type,
                reason = %reason,
                "dropping relation record"
            );
            self.report
                .record_removed(&record.unit_id, &record.related_unit_id, reason);
        }
        outcome
    }

    /// Finish loading and hand over the store and the ingest diagnostics.
    pub fn finish(self) -> (RelationStore, AnalysisReport) {
        debug!(
            units = self.store.len(),
            dropped = self.report.removed.len(),
            "records loaded"
        );
        (self.store, self.report)
    }

    /// Create the source unit, upgrading an implicitly created one with the
    /// record's name and data.
    fn register(&mut self, id: &UnitId, record: &RelationRecord) {
        let idx = self.store.ensure_unit(id);
        let meta = self.store.unit_meta_mut(idx);
        if let Some(name) = &record.unit_name {
            if meta.name == meta.id.as_str() {
                meta.name = name.clone();
            }
        }
        if meta.data.is_none() {
            meta.data = record.data.clone();
        }
    }

    fn resolve(&mut self, record: &RelationRecord) -> Result<Chronology, ReasonCode> {
        let unit = &record.unit_id;
        let related = &record.related_unit_id;
        if unit == related {
            return Err(ReasonCode::Faulty);
        }

        let chronology = match record.chronology.as_deref().and_then(Chronology::from_label) {
            Some(chronology) => chronology,
            None => match SpatialRelation::from_str(&record.relation_type) {
                Some(relation) => relation.chronology().ok_or(ReasonCode::NonTemporalRelation)?,
                None => return Err(ReasonCode::Faulty),
            },
        };

        let key = (unit.clone(), related.clone());
        match self.loaded.get(&key) {
            Some(&previous) if previous != chronology => return Err(ReasonCode::Multiple),
            Some(_) => return Ok(chronology),
            None => {
                self.loaded.insert(key, chronology);
            }
        }

        match chronology {
            Chronology::Later => self.store.add_later(unit, related),
            Chronology::Earlier => self.store.add_later(related, unit),
            Chronology::Same => self.store.add_contemporary(unit, related),
        };
        Ok(chronology)
    }
}
