//! Layering service backed by precomputed coordinates.

use async_trait::async_trait;

use crate::types::UnitId;
use super::{LayeringRequest, LayeringService, LayoutCoordinates};

/// Error type for the static layering service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StaticLayeringError {
    /// A requested unit has no precomputed coordinate.
    #[error("No coordinate for unit: {0}")]
    MissingUnit(UnitId),
}

/// Serves coordinates computed elsewhere, e.g. a saved Graphviz run.
///
/// Used for tests and for the command line driver.
#[derive(Debug, Clone, Default)]
pub struct StaticLayering {
    coordinates: LayoutCoordinates,
}

impl StaticLayering {
    /// Create a service answering with `coordinates`.
    pub fn new(coordinates: LayoutCoordinates) -> Self {
        Self { coordinates }
    }

    /// The stored coordinates.
    pub fn coordinates(&self) -> &LayoutCoordinates {
        &self.coordinates
    }
}

#[async_trait]
impl LayeringService for StaticLayering {
    type Error = StaticLayeringError;

    async fn layout(&self, request: &LayeringRequest) -> Result<LayoutCoordinates, Self::Error> {
        request
            .units
            .iter()
            .map(|unit| {
                self.coordinates
                    .get(&unit.id)
                    .map(|point| (unit.id.clone(), point))
                    .ok_or_else(|| StaticLayeringError::MissingUnit(unit.id.clone()))
            })
            .collect()
    }
}
