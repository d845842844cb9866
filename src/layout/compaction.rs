//! Visual column compaction.
//!
//! A track can slide two tracks to the left when, on every band, the target
//! track and the gutter in between are free, none of its units is connected
//! to a unit directly on its left, and no band has units on both of its
//! neighbouring tracks. The result maps lattice tracks to display tracks.

use std::collections::BTreeMap;

use super::routing::Routing;

type Cell = Option<(i64, usize)>;

/// Display track for every track that moves.
pub(crate) fn compact_tracks(routing: &Routing) -> BTreeMap<u32, u32> {
    let mut shifts = BTreeMap::new();
    let (Some(max_track), Some(max_band)) = (
        routing.nodes.iter().map(|n| n.track).max(),
        routing.nodes.iter().map(|n| n.band).max(),
    ) else {
        return shifts;
    };
    let (width, height) = (max_track as usize, max_band as usize);

    // cell = (original track, node)
    let mut matrix: Vec<Vec<Cell>> = vec![vec![None; width + 1]; height + 1];
    for (i, node) in routing.nodes.iter().enumerate() {
        matrix[node.band as usize][node.track as usize] = Some((node.track, i));
    }

    let left_related = |node: usize| {
        let track = routing.nodes[node].track;
        routing.segments.iter().any(|s| {
            (s.target == node && routing.nodes[s.source].track == track - 1)
                || (s.source == node && routing.nodes[s.target].track == track - 1)
        })
    };

    let mut cur = 3;
    let mut max_col = width;
    while cur <= max_col {
        let mut can = true;
        for row in matrix.iter().skip(1) {
            if row[cur].is_some() && (row[cur - 2].is_some() || row[cur - 1].is_some()) {
                can = false;
                break;
            }
            if let Some((_, node)) = row[cur] {
                can = !left_related(node);
            }
            if can && cur < max_col && row[cur + 1].is_some() && row[cur - 1].is_some() {
                can = false;
            }
            if !can {
                break;
            }
        }

        if can {
            for col in (cur - 2)..=(max_col - 2) {
                for row in matrix.iter_mut().skip(1) {
                    if col > cur - 1 || row[col + 2].is_some() {
                        row[col] = row[col + 2];
                    }
                }
            }
            max_col -= 2;
        } else {
            cur += 1;
        }
    }

    for row in matrix.iter_mut() {
        for cell in row.iter_mut().skip(max_col + 1) {
            *cell = None;
        }
    }

    for row in &matrix {
        for (col, cell) in row.iter().enumerate() {
            if let Some((track, _)) = cell {
                if *track > 0 && *track != col as i64 {
                    shifts.insert(*track as u32, col as u32);
                }
            }
        }
    }
    shifts
}
