//! Matrix layout: grid snapping, edge routing and lane assignment.
//!
//! ## Pipeline
//!
//! ```text
//! LayoutCoordinates → GridAligner → routing (synthetic units, slots, lanes)
//!                                       ↓
//!                     compaction + contemporary links → MatrixLayout
//! ```
//!
//! ## Lattice
//!
//! Layout works on tracks and bands: unit column `c` sits on track `2c + 1`,
//! row `r` on band `2r + 1`. Even tracks are gutters where synthetic units
//! carry edges that span several rows.

pub mod grid;
pub mod lanes;
mod compaction;
mod routing;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MatrixConfig;
use crate::layering::LayoutCoordinates;
use crate::store::RelationStore;
use crate::types::{GridPosition, Relation, UnitId};

pub use grid::GridAligner;
pub use lanes::{
    center_positions, lines_cross, merge_fixed_and_floating, minimize_crossings,
    LaneAssignment, LaneCandidate, MAX_CROSSING_ITERATIONS,
};

/// Error type for layout operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The layering service returned no coordinate for a unit.
    #[error("No coordinate for unit: {0}")]
    MissingCoordinate(UnitId),
    /// The layering service returned a non-finite coordinate.
    #[error("Invalid coordinate for unit {id}: ({x}, {y})")]
    InvalidCoordinate {
        /// Unit id.
        id: UnitId,
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },
    /// The later relation still contains a cycle.
    #[error("Cannot lay out a cyclic matrix")]
    Cyclic,
}

/// A unit placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutUnit {
    /// Unit id; synthetic units are named `_<track>_<band>`.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Grid cell. For synthetic units `column` is the column right of the
    /// gutter they occupy.
    pub position: GridPosition,
    /// Lattice track.
    pub track: u32,
    /// Lattice band.
    pub band: u32,
    /// Track after compaction.
    pub display_track: u32,
    /// True for routing helpers.
    pub is_synthetic: bool,
}

/// One drawn segment of a later edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedEdge {
    /// Segment id, 1-based.
    pub id: u32,
    /// Source unit (possibly synthetic).
    pub source: UnitId,
    /// Target unit (possibly synthetic).
    pub target: UnitId,
    /// Later edge this segment belongs to.
    pub origin: Relation,
    /// Lane within the band below the source row, starting at 1.
    pub lane: u32,
    /// Slot at the source side.
    pub out_order: i64,
    /// Slot at the target side.
    pub in_order: i64,
    /// Segment this one continues.
    pub extends: Option<u32>,
    /// Continuation of this segment.
    pub next: Option<u32>,
}

/// Lanes used below a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBand {
    /// Grid row.
    pub row: u32,
    /// Highest lane in use, 0 when no edge leaves the row.
    pub max_lane: u32,
}

/// Contemporary units drawn side by side on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContemporaryLink {
    /// Grid row.
    pub row: u32,
    /// Left unit.
    pub left: UnitId,
    /// Right unit.
    pub right: UnitId,
}

/// Rendering-ready matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixLayout {
    /// Real units in store order, then synthetic units in creation order.
    pub units: Vec<LayoutUnit>,
    /// Segments by id.
    pub edges: Vec<RoutedEdge>,
    /// Lane usage per row, top down.
    pub rows: Vec<RowBand>,
    /// Contemporary pairs sharing a row.
    pub contemporaries: Vec<ContemporaryLink>,
    /// Tracks that move left after compaction.
    pub track_shifts: BTreeMap<u32, u32>,
}

impl MatrixLayout {
    /// Layout entry of a unit.
    pub fn unit(&self, id: &UnitId) -> Option<&LayoutUnit> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Segment by id.
    pub fn edge(&self, id: u32) -> Option<&RoutedEdge> {
        self.edges.get((id as usize).checked_sub(1)?)
    }

    /// Segments of one later edge, source first.
    pub fn segments_of(&self, origin: &Relation) -> Vec<&RoutedEdge> {
        let mut segments = Vec::new();
        let mut current = self
            .edges
            .iter()
            .find(|e| &e.origin == origin && e.extends.is_none());
        while let Some(edge) = current {
            segments.push(edge);
            current = edge.next.and_then(|id| self.edge(id));
        }
        segments
    }

    /// Grid positions of the real units, keyed by id.
    pub fn positions(&self) -> BTreeMap<UnitId, GridPosition> {
        self.units
            .iter()
            .filter(|u| !u.is_synthetic)
            .map(|u| (u.id.clone(), u.position))
            .collect()
    }
}

/// Lay out a reduced, acyclic store from layering coordinates.
pub fn build_layout(
    store: &RelationStore,
    coordinates: &LayoutCoordinates,
    config: &MatrixConfig,
) -> Result<MatrixLayout, LayoutError> {
    if !store.is_acyclic() {
        return Err(LayoutError::Cyclic);
    }

    let positions = GridAligner::new(config).align(&store.ids(), coordinates)?;
    let routing = routing::route(store, &positions, config.trace);
    let track_shifts = compaction::compact_tracks(&routing);
    let contemporaries = contemporary_links(store, &positions);

    let units = routing
        .nodes
        .iter()
        .map(|node| {
            let track = node.track as u32;
            let band = node.band as u32;
            LayoutUnit {
                id: node.id.clone(),
                name: node.name.clone(),
                position: match node.unit {
                    Some(idx) => positions[idx.index()],
                    None => GridPosition::new((band - 1) / 2, track / 2),
                },
                track,
                band,
                display_track: track_shifts.get(&track).copied().unwrap_or(track),
                is_synthetic: node.is_synthetic(),
            }
        })
        .collect();

    let edges = routing
        .segments
        .iter()
        .map(|s| RoutedEdge {
            id: s.id,
            source: routing.nodes[s.source].id.clone(),
            target: routing.nodes[s.target].id.clone(),
            origin: s.origin.clone(),
            lane: s.lane,
            out_order: s.out_order,
            in_order: s.in_order,
            extends: s.extends.map(|e| routing.segments[e].id),
            next: s.next.map(|n| routing.segments[n].id),
        })
        .collect();

    let layout = MatrixLayout {
        units,
        edges,
        rows: routing.rows,
        contemporaries,
        track_shifts,
    };
    debug!(
        units = layout.units.len(),
        segments = layout.edges.len(),
        rows = layout.rows.len(),
        "layout complete"
    );
    Ok(layout)
}

fn contemporary_links(store: &RelationStore, positions: &[GridPosition]) -> Vec<ContemporaryLink> {
    let mut links: Vec<(GridPosition, ContemporaryLink)> = Vec::new();
    for (a, b) in store.contemporary_pairs() {
        let (Some(ia), Some(ib)) = (store.index_of(&a), store.index_of(&b)) else {
            continue;
        };
        let (pa, pb) = (positions[ia.index()], positions[ib.index()]);
        if pa.row != pb.row {
            warn!(left = %a, right = %b, "contemporary units on different rows");
            continue;
        }
        let (left, right, at) = if pa.column <= pb.column { (a, b, pa) } else { (b, a, pb) };
        links.push((at, ContemporaryLink { row: at.row, left, right }));
    }
    links.sort_by(|x, y| x.0.cmp(&y.0));
    links.into_iter().map(|(_, link)| link).collect()
}
