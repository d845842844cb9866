//! Relation types between stratigraphic units.

use serde::{Deserialize, Serialize};
use super::unit::UnitId;

/// Directed "later than" relation: `from` is later than `to`.
///
/// Implements `Ord` for deterministic ordering: (from, to).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Later unit (drawn above).
    pub from: UnitId,
    /// Earlier unit (drawn below).
    pub to: UnitId,
}

impl Relation {
    /// Create a new relation.
    pub fn new(from: impl Into<UnitId>, to: impl Into<UnitId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Relative chronology of a unit with respect to a related unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chronology {
    /// The unit is later than the related unit.
    Later,
    /// The unit is earlier than the related unit.
    Earlier,
    /// Both units belong to the same point in the sequence.
    Same,
}

impl Chronology {
    /// Parse a chronology label by case-insensitive prefix.
    ///
    /// `"Later than"`, `"earlier"` and `"same time as"` are all accepted.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.starts_with("later") {
            Some(Self::Later)
        } else if label.starts_with("earlier") {
            Some(Self::Earlier)
        } else if label.starts_with("same") {
            Some(Self::Same)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Chronology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Later => write!(f, "later"),
            Self::Earlier => write!(f, "earlier"),
            Self::Same => write!(f, "same time as"),
        }
    }
}

/// Spatial relation recorded in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialRelation {
    /// Abuts.
    Abuts,
    /// Cuts through.
    CutsThrough,
    /// Cut.
    Cut,
    /// Cut by.
    CutBy,
    /// Above.
    Above,
    /// Below.
    Below,
    /// Bonds with.
    BondsWith,
    /// Is abutted by.
    IsAbuttedBy,
    /// Is adjacent to. Carries no temporal meaning.
    IsAdjacentTo,
}

impl SpatialRelation {
    /// Parse a spatial relation from its field vocabulary.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "abuts" => Some(Self::Abuts),
            "cuts through" => Some(Self::CutsThrough),
            "cut" => Some(Self::Cut),
            "cut by" => Some(Self::CutBy),
            "above" => Some(Self::Above),
            "below" => Some(Self::Below),
            "bonds with" => Some(Self::BondsWith),
            "is abutted by" => Some(Self::IsAbuttedBy),
            "is adjacent to" => Some(Self::IsAdjacentTo),
            _ => None,
        }
    }

    /// Chronology implied by the spatial relation, if any.
    pub fn chronology(&self) -> Option<Chronology> {
        match self {
            Self::Abuts | Self::CutsThrough | Self::Above => Some(Chronology::Later),
            Self::Cut | Self::CutBy | Self::Below | Self::IsAbuttedBy => Some(Chronology::Earlier),
            Self::BondsWith => Some(Chronology::Same),
            Self::IsAdjacentTo => None,
        }
    }
}
