//! Snapping floating coordinates onto the integer grid.

use crate::config::MatrixConfig;
use crate::layering::LayoutCoordinates;
use crate::types::{GridPosition, UnitId};
use super::LayoutError;

/// Buckets units into rows and columns by coordinate proximity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAligner {
    column_tolerance: f64,
    row_tolerance: f64,
}

impl Default for GridAligner {
    fn default() -> Self {
        Self::new(&MatrixConfig::default())
    }
}

impl GridAligner {
    /// Create an aligner with the configured tolerances.
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            column_tolerance: config.column_tolerance,
            row_tolerance: config.row_tolerance,
        }
    }

    /// Grid position of every unit in `ids`, in the same order.
    ///
    /// Units are sorted by coordinate (stable on input order). A new bucket
    /// starts when a coordinate lies more than the tolerance past the first
    /// coordinate of the current bucket. Buckets are numbered from 0.
    pub fn align(
        &self,
        ids: &[UnitId],
        coordinates: &LayoutCoordinates,
    ) -> Result<Vec<GridPosition>, LayoutError> {
        let mut xs = Vec::with_capacity(ids.len());
        let mut ys = Vec::with_capacity(ids.len());
        for id in ids {
            let point = coordinates
                .get(id)
                .ok_or_else(|| LayoutError::MissingCoordinate(id.clone()))?;
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(LayoutError::InvalidCoordinate {
                    id: id.clone(),
                    x: point.x,
                    y: point.y,
                });
            }
            xs.push(point.x);
            ys.push(point.y);
        }

        let columns = bucket(&xs, self.column_tolerance);
        let rows = bucket(&ys, self.row_tolerance);
        Ok(rows
            .into_iter()
            .zip(columns)
            .map(|(row, column)| GridPosition::new(row, column))
            .collect())
    }
}

fn bucket(values: &[f64], tolerance: f64) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut buckets = vec![0; values.len()];
    let mut current: Option<(u32, f64)> = None;
    for i in order {
        let value = values[i];
        let index = match current {
            Some((index, anchor)) if value - anchor <= tolerance => index,
            Some((index, _)) => {
                current = Some((index + 1, value));
                index + 1
            }
            None => {
                current = Some((0, value));
                0
            }
        };
        buckets[i] = index;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layering::Point;

    fn ids(raw: &[&str]) -> Vec<UnitId> {
        raw.iter().map(|s| UnitId::from(*s)).collect()
    }

    #[test]
    fn test_align_buckets_by_tolerance() {
        let coords: LayoutCoordinates = [
            ("A", Point::new(100.0, 10.0)),
            ("B", Point::new(50.0, 60.0)),
            ("D", Point::new(150.0, 60.0)),
            ("C", Point::new(50.0, 110.0)),
            ("F", Point::new(104.0, 113.0)),
        ]
        .into_iter()
        .collect();

        let positions = GridAligner::default()
            .align(&ids(&["A", "B", "D", "C", "F"]), &coords)
            .unwrap();

        assert_eq!(
            positions,
            vec![
                GridPosition::new(0, 1),
                GridPosition::new(1, 0),
                GridPosition::new(1, 2),
                GridPosition::new(2, 0),
                GridPosition::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_bucket_anchor_is_first_coordinate() {
        // 0 and 8 share a bucket; 16 is more than 10 past the anchor 0.
        assert_eq!(bucket(&[16.0, 8.0, 0.0], 10.0), vec![1, 0, 0]);
        assert_eq!(bucket(&[], 10.0), Vec::<u32>::new());
    }

    #[test]
    fn test_missing_and_invalid_coordinates() {
        let aligner = GridAligner::default();
        let coords: LayoutCoordinates = [("a", Point::new(f64::NAN, 0.0))].into_iter().collect();

        assert!(matches!(
            aligner.align(&ids(&["a"]), &coords),
            Err(LayoutError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            aligner.align(&ids(&["b"]), &coords),
            Err(LayoutError::MissingCoordinate(_))
        ));
    }
}
