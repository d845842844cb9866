//! Core types for the matrix kernel.

pub mod unit;
pub mod edge;
pub mod record;
pub mod report;

pub use unit::{UnitId, GridPosition, StratigraphicUnit};
pub use edge::{Relation, Chronology, SpatialRelation};
pub use record::{RelationRecord, TabularRelations, RecordError};
pub use report::{AnalysisReport, CycleRecord, ReasonCode, RemovedRelation};
