//! Graphviz interchange.
//!
//! Requests render to DOT for `dot -Tjson`; the JSON output reads back into
//! [`LayoutCoordinates`]. Graphviz puts the origin at the bottom left, so `y`
//! is flipped against the bounding box height, and coordinates are scaled by
//! [`GRAPHVIZ_SCALE`].

use std::fmt::Write as _;

use serde::Deserialize;

use super::{LayeringRequest, LayoutCoordinates, Point};

/// Scale applied to imported Graphviz coordinates.
pub const GRAPHVIZ_SCALE: f64 = 1.5;

/// Error type for Graphviz import.
#[derive(Debug, thiserror::Error)]
pub enum GraphvizError {
    /// The document is not valid Graphviz JSON.
    #[error("Invalid Graphviz JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The bounding box is missing or malformed.
    #[error("Invalid bounding box: {0:?}")]
    BoundingBox(Option<String>),
    /// A node position could not be parsed.
    #[error("Invalid position for {name}: {pos}")]
    Position {
        /// Node name.
        name: String,
        /// Raw position attribute.
        pos: String,
    },
}

#[derive(Deserialize)]
struct GraphvizDocument {
    bb: Option<String>,
    #[serde(default)]
    objects: Vec<GraphvizObject>,
}

#[derive(Deserialize)]
struct GraphvizObject {
    name: String,
    pos: Option<String>,
}

fn quote(raw: &str) -> String {
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

fn parse_pair(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split(',').map(|p| p.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Some((x, y)),
        _ => None,
    }
}

impl LayeringRequest {
    /// Render the request as a Graphviz digraph.
    ///
    /// Same-rank groups become `rank = same` subgraphs, chained by light grey
    /// guide edges that keep members side by side.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "digraph matrix {{");
        let _ = writeln!(out, "  node [shape=box];");

        for unit in &self.units {
            let _ = writeln!(out, "  {} [label={}];", quote(unit.id.as_str()), quote(&unit.label));
        }
        for edge in &self.edges {
            let _ = writeln!(out, "  {} -> {};", quote(edge.from.as_str()), quote(edge.to.as_str()));
        }
        for group in &self.same_rank {
            let members: Vec<String> = group.iter().map(|id| quote(id.as_str())).collect();
            let _ = writeln!(out, "  {{ rank = same; {}; }}", members.join("; "));
            for pair in members.windows(2) {
                let _ = writeln!(
                    out,
                    "  {} -> {} [color=lightgrey, arrowhead=none, constraint=false];",
                    pair[0], pair[1]
                );
            }
        }

        out.push_str("}\n");
        out
    }
}

impl LayoutCoordinates {
    /// Read the output of `dot -Tjson`.
    ///
    /// Objects without a `pos` attribute (subgraphs) are skipped.
    pub fn from_graphviz_json(json: &str) -> Result<Self, GraphvizError> {
        let document: GraphvizDocument = serde_json::from_str(json)?;

        let height = document
            .bb
            .as_deref()
            .and_then(|bb| {
                let values: Vec<f64> = bb.split(',').map(|v| v.trim().parse().ok()).collect::<Option<_>>()?;
                (values.len() == 4).then(|| values[3])
            })
            .ok_or_else(|| GraphvizError::BoundingBox(document.bb.clone()))?;

        let mut coordinates = Self::new();
        for object in document.objects {
            let Some(pos) = object.pos else { continue };
            let (x, y) = parse_pair(&pos).ok_or_else(|| GraphvizError::Position {
                name: object.name.clone(),
                pos: pos.clone(),
            })?;
            coordinates.insert(
                object.name,
                Point::new(x * GRAPHVIZ_SCALE, (height - y) * GRAPHVIZ_SCALE),
            );
        }

        Ok(coordinates)
    }
}
