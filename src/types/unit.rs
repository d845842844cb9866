//! Stratigraphic unit types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stratigraphic unit.
///
/// Caller supplied and stable across runs. Implements `Ord` so that maps keyed
/// by unit iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Create a new UnitId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Integer cell on the matrix grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// Row index, 0 at the top (latest units).
    pub row: u32,
    /// Column index, 0 at the left.
    pub column: u32,
}

impl GridPosition {
    /// Create a new grid position.
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// A single excavation recording unit.
///
/// `later_than` is directed: this unit is later than every referenced unit.
/// `contemporary_with` is symmetric once loaded into a
/// [`RelationStore`](crate::store::RelationStore). Both lists keep insertion
/// order, which drives every traversal of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratigraphicUnit {
    /// Unit identity.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Units this unit is later than.
    #[serde(default)]
    pub later_than: Vec<UnitId>,
    /// Units deposited at the same point of the sequence.
    #[serde(default)]
    pub contemporary_with: Vec<UnitId>,
    /// Grid cell, assigned during layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    /// True for routing helpers injected by the lane assigner.
    #[serde(default)]
    pub is_synthetic: bool,
    /// Source record payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StratigraphicUnit {
    /// Create a unit without relations.
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            later_than: Vec::new(),
            contemporary_with: Vec::new(),
            position: None,
            is_synthetic: false,
            data: None,
            tags: Vec::new(),
        }
    }

    /// Create a unit whose name equals its id.
    pub fn named_by_id(id: impl Into<UnitId>) -> Self {
        let id = id.into();
        let name = id.to_string();
        Self::new(id, name)
    }

    /// Set the units this unit is later than.
    pub fn with_later_than<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<UnitId>,
    {
        self.later_than = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the contemporaries of this unit.
    pub fn with_contemporaries<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<UnitId>,
    {
        self.contemporary_with = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Attach source data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_ordering() {
        let a = UnitId::from("10");
        let b = UnitId::from("9");
        // String ordering, not numeric
        assert!(a < b);
        assert_eq!(a.to_string(), "10");
    }

    #[test]
    fn test_unit_serialization_defaults() {
        let unit: StratigraphicUnit =
            serde_json::from_str(r#"{"id": "1", "name": "Wall", "later_than": ["2"]}"#).unwrap();

        assert_eq!(unit.id, UnitId::from("1"));
        assert_eq!(unit.later_than, vec![UnitId::from("2")]);
        assert!(unit.contemporary_with.is_empty());
        assert!(!unit.is_synthetic);
        assert!(unit.position.is_none());

        let json = serde_json::to_value(&unit).unwrap();
        assert!(json.get("position").is_none());
        assert_eq!(json["id"], "1");
    }

    #[test]
    fn test_builder() {
        let unit = StratigraphicUnit::named_by_id("4")
            .with_later_than(["5", "6"])
            .with_contemporaries(["7"]);

        assert_eq!(unit.name, "4");
        assert_eq!(unit.later_than.len(), 2);
        assert_eq!(unit.contemporary_with, vec![UnitId::from("7")]);
    }
}
