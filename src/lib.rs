//! # harris-matrix-kernel
//!
//! Deterministic consistency analysis and lane layout for Harris Matrix
//! diagrams.
//!
//! The kernel answers two questions:
//!
//! > Which recorded stratigraphic relations can be drawn as one consistent
//! > sequence, and which must be dropped?
//!
//! > Where does every unit and every edge segment go on the grid?
//!
//! ## Core Contract
//!
//! 1. Ingest relation records, dropping those without temporal meaning
//! 2. Remove contradictions and break cycles, reporting every removal
//! 3. Reduce the later relation to its transitive reduction
//! 4. Snap layering coordinates to a grid and route edges in lanes
//!
//! ## Architecture
//!
//! ```text
//! RelationRecord → RecordIngest → RelationStore → ConsistencyResolver
//!                                                        ↓
//!   MatrixLayout ← build_layout ← LayeringService ← reduce_transitive
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same records + same config → identical report and layout
//! - Units keep first-appearance order; relation lists keep insertion order
//! - Layering requests carry a canonical fingerprint

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod analysis;
pub mod layering;
pub mod layout;
pub mod config;
pub mod canonical;
pub mod pipeline;

// Re-exports
pub use types::{
    UnitId, GridPosition, StratigraphicUnit, Relation, Chronology, SpatialRelation,
    RelationRecord, TabularRelations, RecordError,
    AnalysisReport, CycleRecord, ReasonCode, RemovedRelation,
};
pub use store::{RelationStore, RecordIngest, UnitIdx};
pub use analysis::{
    ConsistencyResolver, AnalysisError, ReductionError,
    remove_contradictions, elementary_cycles, resolve_structural_cycles,
    resolve_contemporary_cycles, reduce_transitive,
};
pub use layering::{
    LayeringService, LayeringRequest, LayeringNode, LayoutCoordinates, Point,
    StaticLayering, StaticLayeringError, GraphvizError,
};
pub use layout::{
    build_layout, GridAligner, LayoutError, MatrixLayout, LayoutUnit, RoutedEdge,
    RowBand, ContemporaryLink,
};
pub use config::MatrixConfig;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use pipeline::{MatrixPipeline, AnalyzedMatrix, MatrixOutput, PipelineError};

/// Schema version for all matrix kernel output types.
/// Increment on breaking changes to any schema type.
pub const MATRIX_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default configuration version identifier.
pub const DEFAULT_CONFIG_VERSION: &str = "harris_matrix_v1";
