//! Contract with the external graph layering service.
//!
//! The core hands over unit ids, the acyclic later edges and the groups that
//! must share a rank, and gets back one floating `(x, y)` coordinate per unit.
//! How the service computes them is opaque.
//!
//! ## Staleness
//!
//! A request carries a [`fingerprint`](LayeringRequest::fingerprint). Callers
//! that issue several requests compare fingerprints to discard late results.

pub mod dot;
pub mod static_layering;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::store::RelationStore;
use crate::types::{Relation, UnitId};

pub use dot::GraphvizError;
pub use static_layering::{StaticLayering, StaticLayeringError};

/// A unit as seen by the layering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeringNode {
    /// Unit id.
    pub id: UnitId,
    /// Display label.
    pub label: String,
}

/// Input of the layering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeringRequest {
    /// Units in arena order.
    pub units: Vec<LayeringNode>,
    /// Acyclic later edges.
    pub edges: Vec<Relation>,
    /// Groups of units that must share a rank. Each group is sorted and the
    /// groups are sorted among themselves.
    pub same_rank: Vec<Vec<UnitId>>,
}

impl LayeringRequest {
    /// Build a request from a resolved store.
    ///
    /// Same-rank groups are the connected components of the contemporary
    /// relation with at least two members.
    pub fn from_store(store: &RelationStore) -> Self {
        let units = store
            .indices()
            .map(|i| {
                let meta = store.unit_meta(i);
                LayeringNode {
                    id: meta.id.clone(),
                    label: meta.name.clone(),
                }
            })
            .collect();

        let mut component = vec![usize::MAX; store.len()];
        let mut same_rank = Vec::new();
        for start in store.indices() {
            if component[start.index()] != usize::MAX
                || store.contemporaries_idx(start).is_empty()
            {
                continue;
            }
            let group_index = same_rank.len();
            let mut group = Vec::new();
            let mut stack = vec![start];
            component[start.index()] = group_index;
            while let Some(node) = stack.pop() {
                group.push(store.id_of(node).clone());
                for &other in store.contemporaries_idx(node) {
                    if component[other.index()] == usize::MAX {
                        component[other.index()] = group_index;
                        stack.push(other);
                    }
                }
            }
            group.sort();
            same_rank.push(group);
        }
        same_rank.sort();

        Self {
            units,
            edges: store.later_edges(),
            same_rank,
        }
    }

    /// Canonical fingerprint of the request.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}

/// Floating coordinate returned by the layering service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate, growing to the right.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Output of the layering service: one point per unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutCoordinates {
    points: BTreeMap<UnitId, Point>,
}

impl LayoutCoordinates {
    /// Create an empty coordinate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the point of a unit.
    pub fn insert(&mut self, id: impl Into<UnitId>, point: Point) {
        self.points.insert(id.into(), point);
    }

    /// Point of a unit.
    pub fn get(&self, id: &UnitId) -> Option<Point> {
        self.points.get(id).copied()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point is set.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate points in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &Point)> {
        self.points.iter()
    }
}

impl<I: Into<UnitId>> FromIterator<(I, Point)> for LayoutCoordinates {
    fn from_iter<T: IntoIterator<Item = (I, Point)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().map(|(id, p)| (id.into(), p)).collect(),
        }
    }
}

/// External graph layering service.
///
/// Implementations must return a point for every requested unit such that
/// later units lie above earlier ones and same-rank groups share `y`.
#[async_trait]
pub trait LayeringService: Send + Sync {
    /// Error type for layering operations.
    type Error: std::error::Error + Send + Sync;

    /// Assign a coordinate to every unit of the request.
    async fn layout(&self, request: &LayeringRequest) -> Result<LayoutCoordinates, Self::Error>;
}
