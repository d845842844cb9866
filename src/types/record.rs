//! Relation records as delivered by the record-fetching collaborator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::unit::UnitId;

/// Header carrying the unit id.
pub const COLUMN_UNIT_ID: &str = "uid";
/// Header carrying the unit display name.
pub const COLUMN_UNIT_NAME: &str = "arch_context";
/// Header carrying the related unit id.
pub const COLUMN_RELATED_ID: &str = "uid_locus_2_related";
/// Header carrying the spatial relation type.
pub const COLUMN_RELATION_TYPE: &str = "relation_type";
/// Header carrying the chronology label.
pub const COLUMN_CHRONOLOGY: &str = "chronology";

/// Error type for record decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A mandatory column is absent from the headers.
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

/// One pairwise relation between two units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Source unit.
    pub unit_id: UnitId,
    /// Display name of the source unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    /// Related unit.
    pub related_unit_id: UnitId,
    /// Spatial relation type, free text from the field vocabulary.
    #[serde(default)]
    pub relation_type: String,
    /// Optional chronology label ("later", "earlier", "same time as").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chronology: Option<String>,
    /// Source payload attached to the unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RelationRecord {
    /// Create a record from a spatial relation type.
    pub fn new(
        unit_id: impl Into<UnitId>,
        related_unit_id: impl Into<UnitId>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            unit_name: None,
            related_unit_id: related_unit_id.into(),
            relation_type: relation_type.into(),
            chronology: None,
            data: None,
        }
    }

    /// Attach a chronology label.
    pub fn with_chronology(mut self, chronology: impl Into<String>) -> Self {
        self.chronology = Some(chronology.into());
        self
    }

    /// Attach a display name for the source unit.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.unit_name = Some(name.into());
        self
    }
}

/// Column-oriented relation payload (`headers` + `relations` rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRelations {
    /// Column names.
    pub headers: Vec<String>,
    /// Rows, one cell per header.
    pub relations: Vec<Vec<Value>>,
}

impl TabularRelations {
    /// Decode rows into relation records.
    ///
    /// Rows without a usable unit id or related id are skipped with a warning.
    /// The full row is attached as `data`, keyed by header.
    pub fn into_records(self) -> Result<Vec<RelationRecord>, RecordError> {
        let column = |name: &str| {
            self.headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| RecordError::MissingColumn(name.to_string()))
        };
        let uid = column(COLUMN_UNIT_ID)?;
        let related = column(COLUMN_RELATED_ID)?;
        let relation_type = column(COLUMN_RELATION_TYPE)?;
        let name = self.headers.iter().position(|h| h == COLUMN_UNIT_NAME);
        let chronology = self.headers.iter().position(|h| h == COLUMN_CHRONOLOGY);

        let mut records = Vec::with_capacity(self.relations.len());
        for (index, row) in self.relations.iter().enumerate() {
            let (Some(unit_id), Some(related_unit_id)) = (
                row.get(uid).and_then(cell_text),
                row.get(related).and_then(cell_text),
            ) else {
                warn!(row = index, "skipping relation row without unit ids");
                continue;
            };

            let data: Map<String, Value> = self
                .headers
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();

            records.push(RelationRecord {
                unit_id: UnitId::new(unit_id),
                unit_name: name.and_then(|i| row.get(i)).and_then(cell_text),
                related_unit_id: UnitId::new(related_unit_id),
                relation_type: row.get(relation_type).and_then(cell_text).unwrap_or_default(),
                chronology: chronology.and_then(|i| row.get(i)).and_then(cell_text),
                data: Some(Value::Object(data)),
            });
        }

        Ok(records)
    }
}

/// Text of a string or number cell. Empty strings and nulls yield `None`.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tabular_decoding() {
        let tabular: TabularRelations = serde_json::from_value(json!({
            "headers": ["arch_context", "uid", "chronology", "relation_type", "uid_locus_2_related"],
            "relations": [
                ["Pit fill", "u1", "", "cut by", "u2"],
                ["Wall", 7, "Later", "abuts", "u1"],
                ["Broken", null, "", "abuts", "u1"]
            ]
        }))
        .unwrap();

        let records = tabular.into_records().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].unit_id, UnitId::from("u1"));
        assert_eq!(records[0].unit_name.as_deref(), Some("Pit fill"));
        assert_eq!(records[0].related_unit_id, UnitId::from("u2"));
        assert_eq!(records[0].relation_type, "cut by");
        assert_eq!(records[0].chronology, None);

        assert_eq!(records[1].unit_id, UnitId::from("7"));
        assert_eq!(records[1].chronology.as_deref(), Some("Later"));
        assert_eq!(records[1].data.as_ref().unwrap()["arch_context"], "Wall");
    }

    #[test]
    fn test_missing_column() {
        let tabular = TabularRelations {
            headers: vec!["uid".into(), "relation_type".into()],
            relations: vec![],
        };

        assert_eq!(
            tabular.into_records(),
            Err(RecordError::MissingColumn(COLUMN_RELATED_ID.to_string()))
        );
    }
}
