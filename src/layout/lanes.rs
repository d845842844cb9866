//! Slot centering, slot merging and lane assignment.
//!
//! These three routines decide where edges attach to a node side (slots,
//! negative to the left, positive to the right) and which horizontal channel
//! of a row band an edge runs in (lanes, 1 at the top).
//!
//! `minimize_crossings` is a bounded heuristic. Its iteration cap and
//! tie-breaks are observable in rendered diagrams and must stay stable.

use std::collections::BTreeSet;

/// Passes over a row before accepting remaining crossings.
pub const MAX_CROSSING_ITERATIONS: usize = 5;

/// Assign symmetric slots to offsets sorted ascending.
///
/// The middle of the zero-offset run gets slot 0; entries to its left get
/// consecutive negative slots, entries to its right consecutive positive ones.
/// Without zero offsets the first positive entry gets slot 1 and no slot 0 is
/// emitted.
pub fn center_positions(sorted: &[i64]) -> Vec<i64> {
    let n = sorted.len();
    let mut positions = vec![0; n];
    let zero_start = sorted.iter().position(|&e| e == 0);
    let positive_start = sorted.iter().position(|&e| e > 0).unwrap_or(n);

    let mid = match zero_start {
        Some(start) => {
            let run = positive_start - start;
            let mut mid = start + run / 2;
            if run % 2 == 0 && n - (mid + 1) < mid {
                mid -= 1;
            }
            mid
        }
        None => {
            if positive_start < n {
                positions[positive_start] = 1;
            }
            positive_start
        }
    };

    for x in 0..mid {
        positions[x] = x as i64 - mid as i64;
    }
    if mid < n {
        let mut slot = positions[mid];
        for position in positions.iter_mut().skip(mid + 1) {
            slot += 1;
            *position = slot;
        }
    }
    positions
}

/// Move floating slots outward until none collides with a fixed slot or with
/// another floating slot.
///
/// The negative side (slots below 0) is processed from the pivot leftwards,
/// the rest from the pivot rightwards.
pub fn merge_fixed_and_floating(fixed: &[i64], floating: &[i64]) -> Vec<i64> {
    let mut slots = floating.to_vec();
    if fixed.is_empty() {
        return slots;
    }

    let pivot = slots.iter().position(|&s| s > -1).unwrap_or(slots.len());

    let mut cur = pivot;
    while cur > 0 {
        let i = cur - 1;
        let value = slots[i];
        if fixed.contains(&value) || (0..pivot).any(|j| j != i && slots[j] == value) {
            slots[i] = value - 1;
        } else {
            cur -= 1;
        }
    }

    let mut cur = pivot;
    while cur < slots.len() {
        let value = slots[cur];
        if fixed.contains(&value) || (pivot..slots.len()).any(|j| j != cur && slots[j] == value) {
            slots[cur] = value + 1;
        } else {
            cur += 1;
        }
    }

    slots
}

/// Whether two orthogonal edge paths overlap.
///
/// Each path drops from its start, runs horizontally at lane `y` from
/// `start` to `end`, then drops to its end. Paths on the same lane cross when
/// their horizontal runs overlap.
pub fn lines_cross(start1: i64, end1: i64, lane1: u32, start2: i64, end2: i64, lane2: u32) -> bool {
    let ((a_start, a_end, a_lane), (b_start, b_end, b_lane)) = if lane1 < lane2 {
        ((start1, end1, lane1), (start2, end2, lane2))
    } else {
        ((start2, end2, lane2), (start1, end1, lane1))
    };

    if (b_start > a_start && b_start <= a_end) || (b_start < a_start && b_start >= a_end) {
        return a_start != a_end;
    }
    if (a_end >= b_start && a_end < b_end) || (a_end <= b_start && a_end > b_end) {
        return true;
    }

    let spans = (a_end - a_start).abs() + (b_end - b_start).abs();
    let centers = ((b_end + b_start) - (a_end + a_start)).abs();
    a_lane == b_lane && centers < spans
}

/// An edge leaving a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneCandidate {
    /// Edge id.
    pub id: u32,
    /// Source track.
    pub from: i64,
    /// Target track.
    pub to: i64,
    /// Out slot at the source.
    pub out_order: i64,
}

/// Lane chosen for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneAssignment {
    /// Edge id.
    pub id: u32,
    /// Lane, starting at 1.
    pub lane: u32,
}

#[derive(Debug, Clone, Copy)]
struct Scaled {
    id: u32,
    from: i64,
    to: i64,
    lane: u32,
}

/// Assign lanes to the edges leaving one row.
///
/// Tracks are scaled by the slot range and offset by the out slot so that
/// edges leaving the same node stay distinct. Every crossing pair bumps one
/// edge to a new lane below both. When moving either edge would help (or
/// neither would and they share a lane) the tie is broken: same direction
/// moves the longer edge, opposite directions move the edge starting further
/// left. Pairs where no move helps are never retried. At most
/// [`MAX_CROSSING_ITERATIONS`] passes are made. Result is sorted by lane.
pub fn minimize_crossings(edges: &[LaneCandidate]) -> Vec<LaneAssignment> {
    let min = edges.iter().map(|e| e.out_order).fold(0, i64::min);
    let max = edges.iter().map(|e| e.out_order).fold(1, i64::max);
    let range = max - min;

    let mut scaled: Vec<Scaled> = edges
        .iter()
        .map(|e| Scaled {
            id: e.id,
            from: e.from * range + e.out_order,
            to: e.to * range + e.out_order,
            lane: 1,
        })
        .collect();

    let mut no_use: BTreeSet<(u32, u32)> = BTreeSet::new();
    for _ in 0..MAX_CROSSING_ITERATIONS {
        let mut crossing = false;

        for i in 0..scaled.len().saturating_sub(1) {
            for n in (i + 1)..scaled.len() {
                let (a, b) = (scaled[i], scaled[n]);
                if no_use.contains(&(a.id, b.id)) {
                    continue;
                }
                if a.from == a.to || b.from == b.to || !lines_cross(a.from, a.to, a.lane, b.from, b.to, b.lane) {
                    continue;
                }
                crossing = true;

                let new_lane = a.lane.max(b.lane) + 1;
                let mut change_a = !lines_cross(a.from, a.to, new_lane, b.from, b.to, b.lane);
                let mut change_b = !lines_cross(a.from, a.to, a.lane, b.from, b.to, new_lane);

                if (change_a && change_b) || (!change_a && !change_b && a.lane == b.lane) {
                    let dir_a = (a.to - a.from).signum();
                    let dir_b = (b.to - b.from).signum();
                    change_a = if dir_a == dir_b {
                        (a.to - a.from).abs() > (b.to - b.from).abs()
                    } else {
                        a.from < b.from
                    };
                    change_b = !change_a;
                }

                if change_a {
                    scaled[i].lane = new_lane;
                    break;
                } else if change_b {
                    scaled[n].lane = new_lane;
                } else {
                    no_use.insert((a.id, b.id));
                }
            }
        }

        if !crossing {
            break;
        }
    }

    scaled.sort_by_key(|e| e.lane);
    scaled
        .into_iter()
        .map(|e| LaneAssignment { id: e.id, lane: e.lane })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_positions() {
        let cases: &[(&[i64], &[i64])] = &[
            (&[-8, 0, 19], &[-1, 0, 1]),
            (&[-9, -8, 0, 2, 19], &[-2, -1, 0, 1, 2]),
            (&[0], &[0]),
            (&[-5], &[-1]),
            (&[5], &[1]),
            (&[1, 2, 5], &[1, 2, 3]),
            (&[-5, -2, -1], &[-3, -2, -1]),
            (&[-10, -9, -8, 19], &[-3, -2, -1, 1]),
            (&[-8, 0], &[-1, 0]),
            (&[0, 2], &[0, 1]),
            (&[0, 0], &[0, 1]),
            (&[0, 0, 0], &[-1, 0, 1]),
            (&[0, 0, 0, 0], &[-1, 0, 1, 2]),
            (&[-5, 0, 0, 2, 3], &[-2, -1, 0, 1, 2]),
            (&[-5, -3, 0, 0, 3], &[-2, -1, 0, 1, 2]),
            (&[], &[]),
        ];

        for (input, expected) in cases {
            assert_eq!(center_positions(input), expected.to_vec(), "input {input:?}");
        }
    }

    #[test]
    fn test_merge_fixed_and_floating() {
        let cases: &[(&[i64], &[i64], &[i64])] = &[
            (&[-1, 0, 1], &[-1, 0], &[-2, 2]),
            (&[-1, 0, 1, 2], &[-1, 0], &[-2, 3]),
            (&[-1, 1, 2], &[-1, 0], &[-2, 0]),
            (&[-2, -1, 1, 2], &[-1, 0, 2], &[-3, 0, 3]),
            (&[-2, -1, 1, 2], &[-1, 0, 1], &[-3, 0, 3]),
            (&[-2, -1], &[-2, -1], &[-4, -3]),
            (&[1, 2], &[1, 2], &[3, 4]),
            (&[], &[-1, 0, 1], &[-1, 0, 1]),
        ];

        for (fixed, floating, expected) in cases {
            assert_eq!(
                merge_fixed_and_floating(fixed, floating),
                expected.to_vec(),
                "fixed {fixed:?} floating {floating:?}"
            );
        }
    }

    #[test]
    fn test_lines_cross() {
        assert!(lines_cross(4, 6, 2, 6, 2, 1));
        assert!(lines_cross(4, 6, 1, 6, 2, 2));
        assert!(lines_cross(1, 3, 1, 2, 4, 2));
        assert!(lines_cross(1, 3, 1, 2, 4, 1));
        assert!(lines_cross(3, 1, 1, 2, 4, 1));
        assert!(lines_cross(7, 11, 1, 7, 13, 1));
        assert!(!lines_cross(2, 1, 1, 2, 4, 1));
    }

    fn lanes(edges: &[(u32, i64, i64, i64)]) -> Vec<(u32, u32)> {
        let candidates: Vec<LaneCandidate> = edges
            .iter()
            .map(|&(id, from, to, out_order)| LaneCandidate { id, from, to, out_order })
            .collect();
        minimize_crossings(&candidates)
            .into_iter()
            .map(|a| (a.id, a.lane))
            .collect()
    }

    #[test]
    fn test_minimize_crossings_same_direction_moves_longer() {
        assert_eq!(lanes(&[(1, 1, 5, 0), (2, 3, 7, 0)]), vec![(2, 1), (1, 2)]);
        assert_eq!(lanes(&[(1, 1, 9, 0), (2, 3, 5, 0)]), vec![(2, 1), (1, 2)]);
    }

    #[test]
    fn test_minimize_crossings_opposite_directions() {
        assert_eq!(lanes(&[(1, 7, 1, 0), (2, 3, 9, 0)]), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_minimize_crossings_ignores_straight_edges() {
        assert_eq!(lanes(&[(1, 3, 3, 0), (2, 1, 5, 0)]), vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn test_minimize_crossings_staircase() {
        assert_eq!(
            lanes(&[(1, 1, 5, 0), (2, 3, 7, 0), (3, 5, 9, 0)]),
            vec![(3, 1), (2, 2), (1, 3)]
        );
    }

    #[test]
    fn test_minimize_crossings_empty() {
        assert!(minimize_crossings(&[]).is_empty());
    }
}
