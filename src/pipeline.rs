//! End-to-end matrix pipeline.
//!
//! ```text
//! records → RecordIngest → ConsistencyResolver → reduce_transitive
//!                                                      ↓
//!                     LayeringService (async) → build_layout → MatrixOutput
//! ```
//!
//! Analysis is synchronous. The only suspension point is the layering call,
//! during which no analysis state is mutated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};

use crate::analysis::{reduce_transitive, AnalysisError, ConsistencyResolver, ReductionError};
use crate::config::MatrixConfig;
use crate::layering::{LayeringRequest, LayeringService};
use crate::layout::{build_layout, LayoutError, MatrixLayout};
use crate::store::{RecordIngest, RelationStore};
use crate::types::{
    AnalysisReport, RecordError, Relation, RelationRecord, StratigraphicUnit, TabularRelations,
};

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Tabular records could not be decoded.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
    /// Consistency analysis failed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    /// Transitive reduction failed.
    #[error("Reduction error: {0}")]
    Reduction(#[from] ReductionError),
    /// Layout failed.
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    /// The layering service failed.
    #[error("Layering service error: {0}")]
    Layering(String),
    /// The analysis left an unsolved cycle.
    #[error("Matrix cannot be rendered: {}", .0.join("; "))]
    Unrenderable(Vec<String>),
}

impl PipelineError {
    /// Create a layering error from any error type.
    pub fn from_layering<E: std::error::Error>(e: E) -> Self {
        Self::Layering(e.to_string())
    }
}

/// Result of the synchronous analysis stage.
#[derive(Debug, Clone)]
pub struct AnalyzedMatrix {
    /// Resolved (and, when renderable, reduced) relations.
    pub store: RelationStore,
    /// Diagnostics of ingest and analysis.
    pub report: AnalysisReport,
    /// Edges removed by transitive reduction.
    pub transitive: Vec<Relation>,
}

impl AnalyzedMatrix {
    /// Request for the layering service.
    pub fn layering_request(&self) -> LayeringRequest {
        LayeringRequest::from_store(&self.store)
    }
}

/// Output handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixOutput {
    /// Diagnostics of ingest and analysis.
    pub report: AnalysisReport,
    /// Normalized units with positions assigned.
    pub units: Vec<StratigraphicUnit>,
    /// Edges removed by transitive reduction, for optional display.
    pub transitive: Vec<Relation>,
    /// Layout, absent when the matrix cannot be rendered.
    pub layout: Option<MatrixLayout>,
}

/// Runs analysis and layout against a layering service.
pub struct MatrixPipeline<L: LayeringService> {
    layering: Arc<L>,
    config: MatrixConfig,
}

impl<L: LayeringService + 'static> MatrixPipeline<L> {
    /// Create a new pipeline.
    pub fn new(layering: Arc<L>, config: MatrixConfig) -> Self {
        Self { layering, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Ingest records, resolve inconsistencies and reduce.
    pub fn analyze(&self, records: &[RelationRecord]) -> Result<AnalyzedMatrix, PipelineError> {
        let (store, report) = RecordIngest::load(records);
        self.analyze_store(store, report)
    }

    /// Decode a tabular payload, then analyze it.
    pub fn analyze_table(&self, table: TabularRelations) -> Result<AnalyzedMatrix, PipelineError> {
        self.analyze(&table.into_records()?)
    }

    /// Resolve and reduce units given directly.
    pub fn analyze_units(
        &self,
        units: Vec<StratigraphicUnit>,
    ) -> Result<AnalyzedMatrix, PipelineError> {
        self.analyze_store(RelationStore::from_units(units), AnalysisReport::new())
    }

    fn analyze_store(
        &self,
        mut store: RelationStore,
        mut report: AnalysisReport,
    ) -> Result<AnalyzedMatrix, PipelineError> {
        let span = info_span!("analyze", units = store.len(), params_hash = %self.config.params_hash());
        let _guard = span.enter();

        ConsistencyResolver::new(&self.config).resolve_into(&mut store, &mut report)?;

        let transitive = if report.is_renderable() {
            reduce_transitive(&mut store)?
        } else {
            Vec::new()
        };
        debug!(transitive = transitive.len(), "analysis stage complete");

        Ok(AnalyzedMatrix {
            store,
            report,
            transitive,
        })
    }

    /// Lay out an analyzed matrix.
    pub async fn layout(&self, analyzed: &AnalyzedMatrix) -> Result<MatrixLayout, PipelineError> {
        if !analyzed.report.is_renderable() {
            return Err(PipelineError::Unrenderable(analyzed.report.errors.clone()));
        }

        let request = analyzed.layering_request();
        let fingerprint = request.fingerprint();
        let coordinates = self
            .layering
            .layout(&request)
            .instrument(info_span!("layering", fingerprint = %fingerprint))
            .await
            .map_err(PipelineError::from_layering)?;

        Ok(build_layout(&analyzed.store, &coordinates, &self.config)?)
    }

    /// Analyze and lay out records.
    pub async fn run(&self, records: &[RelationRecord]) -> Result<MatrixOutput, PipelineError> {
        let analyzed = self.analyze(records)?;
        self.finish(analyzed).await
    }

    /// Analyze and lay out units given directly.
    pub async fn run_units(
        &self,
        units: Vec<StratigraphicUnit>,
    ) -> Result<MatrixOutput, PipelineError> {
        let analyzed = self.analyze_units(units)?;
        self.finish(analyzed).await
    }

    async fn finish(&self, mut analyzed: AnalyzedMatrix) -> Result<MatrixOutput, PipelineError> {
        let layout = if analyzed.report.is_renderable() {
            let layout = self.layout(&analyzed).await?;
            for (id, position) in layout.positions() {
                analyzed.store.set_position(&id, position);
            }
            Some(layout)
        } else {
            None
        };

        info!(
            units = analyzed.store.len(),
            removed = analyzed.report.removed.len(),
            rendered = layout.is_some(),
            "matrix pipeline complete"
        );

        Ok(MatrixOutput {
            units: analyzed.store.units(),
            report: analyzed.report,
            transitive: analyzed.transitive,
            layout,
        })
    }
}
