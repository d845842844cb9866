//! Edge routing over the track lattice.
//!
//! Unit column `c` sits on track `2c + 1` and row `r` on band `2r + 1`; even
//! tracks are gutters between columns. An edge spanning more than one row is
//! split at a synthetic unit on the next row, in the gutter beside its target
//! track, and the remainder continues from there. Rows are then processed top
//! down: in-slots, lanes, out-slots. Lanes are chosen while only continuing
//! segments carry an out-slot; those of real units are still 0.

use std::collections::BTreeMap;

use tracing::trace;

use crate::store::{RelationStore, UnitIdx};
use crate::types::{GridPosition, Relation, UnitId};
use super::lanes::{center_positions, merge_fixed_and_floating, minimize_crossings, LaneCandidate};
use super::RowBand;

/// A unit or synthetic routing unit on the lattice.
#[derive(Debug, Clone)]
pub(crate) struct RouteNode {
    pub(crate) id: UnitId,
    pub(crate) name: String,
    /// Store index; `None` for synthetic units.
    pub(crate) unit: Option<UnitIdx>,
    pub(crate) track: i64,
    pub(crate) band: i64,
    pub(crate) ins: Vec<usize>,
    pub(crate) outs: Vec<usize>,
}

impl RouteNode {
    pub(crate) fn is_synthetic(&self) -> bool {
        self.unit.is_none()
    }
}

/// One drawn segment of a later edge.
#[derive(Debug, Clone)]
pub(crate) struct Segment {
    /// 1-based, in creation order.
    pub(crate) id: u32,
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) from_track: i64,
    pub(crate) to_track: i64,
    pub(crate) from_band: i64,
    pub(crate) to_band: i64,
    pub(crate) lane: u32,
    pub(crate) in_order: i64,
    pub(crate) out_order: i64,
    /// Segment this one continues.
    pub(crate) extends: Option<usize>,
    /// Continuation of this segment.
    pub(crate) next: Option<usize>,
    /// The later edge this segment belongs to.
    pub(crate) origin: Relation,
}

/// Routed lattice.
#[derive(Debug, Clone, Default)]
pub(crate) struct Routing {
    pub(crate) nodes: Vec<RouteNode>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) rows: Vec<RowBand>,
}

struct Router {
    nodes: Vec<RouteNode>,
    segments: Vec<Segment>,
    /// Synthetic unit per (track, band).
    synthetic: BTreeMap<(i64, i64), usize>,
    /// Nodes sorted by (band, track).
    order: Vec<usize>,
}

/// Route every later edge of `store`. `positions` is indexed like the store.
pub(crate) fn route(store: &RelationStore, positions: &[GridPosition], verbose: bool) -> Routing {
    let mut router = Router {
        nodes: Vec::with_capacity(store.len()),
        segments: Vec::new(),
        synthetic: BTreeMap::new(),
        order: Vec::new(),
    };

    for idx in store.indices() {
        let meta = store.unit_meta(idx);
        let position = positions[idx.index()];
        router.nodes.push(RouteNode {
            id: meta.id.clone(),
            name: meta.name.clone(),
            unit: Some(idx),
            track: 2 * i64::from(position.column) + 1,
            band: 2 * i64::from(position.row) + 1,
            ins: Vec::new(),
            outs: Vec::new(),
        });
    }
    for idx in store.indices() {
        for &target in store.later_idx(idx) {
            router.connect(idx.index(), target.index(), store.id_of(idx), store.id_of(target));
        }
    }

    router.order = (0..router.nodes.len()).collect();
    router
        .order
        .sort_by_key(|&n| (router.nodes[n].band, router.nodes[n].track));

    let rows = router.split_rows();
    let mut bands = Vec::with_capacity(rows.len());
    for (members, segments) in rows {
        let band = router.nodes[members[0]].band;
        router.assign_in_slots(&members);
        router.carry_out_slots(&segments);
        router.assign_lanes(&segments);
        router.assign_out_slots(&members);

        let max_lane = segments
            .iter()
            .map(|&s| router.segments[s].lane)
            .max()
            .unwrap_or(0);
        let row = ((band - 1) / 2) as u32;
        if verbose {
            trace!(row, segments = segments.len(), max_lane, "row routed");
        }
        bands.push(RowBand { row, max_lane });
    }

    Routing {
        nodes: router.nodes,
        segments: router.segments,
        rows: bands,
    }
}

impl Router {
    fn connect(&mut self, source: usize, target: usize, from: &UnitId, to: &UnitId) -> usize {
        let index = self.segments.len();
        self.segments.push(Segment {
            id: index as u32 + 1,
            source,
            target,
            from_track: self.nodes[source].track,
            to_track: self.nodes[target].track,
            from_band: self.nodes[source].band,
            to_band: self.nodes[target].band,
            lane: 1,
            in_order: 0,
            out_order: 0,
            extends: None,
            next: None,
            origin: Relation::new(from.clone(), to.clone()),
        });
        self.nodes[source].outs.push(index);
        self.nodes[target].ins.push(index);
        index
    }

    /// Walk nodes in (band, track) order, splitting long segments as their
    /// source is reached. Returns the nodes and outgoing segments per row.
    fn split_rows(&mut self) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut rows = Vec::new();
        let Some(&first) = self.order.first() else {
            return rows;
        };

        let mut band = self.nodes[first].band;
        let mut members = Vec::new();
        let mut segments = Vec::new();
        let mut i = 0;
        while i < self.order.len() {
            let node = self.order[i];
            if self.nodes[node].band != band {
                rows.push((std::mem::take(&mut members), std::mem::take(&mut segments)));
                band = self.nodes[node].band;
                continue;
            }

            members.push(node);
            for segment in self.nodes[node].outs.clone() {
                let s = &self.segments[segment];
                if s.to_band - s.from_band > 2 {
                    self.split(segment);
                }
                segments.push(segment);
            }
            i += 1;
        }
        rows.push((members, segments));
        rows
    }

    fn split(&mut self, segment: usize) {
        let s = &self.segments[segment];
        let track = if s.from_track < s.to_track {
            s.to_track - 1
        } else {
            s.to_track + 1
        };
        let band = s.from_band + 2;
        let (target, to_track, to_band, origin) = (s.target, s.to_track, s.to_band, s.origin.clone());

        let dummy = self.synthetic_at(track, band);
        let next = self.segments.len();
        self.segments.push(Segment {
            id: next as u32 + 1,
            source: dummy,
            target,
            from_track: track,
            to_track,
            from_band: band,
            to_band,
            lane: 1,
            in_order: 0,
            out_order: 0,
            extends: Some(segment),
            next: None,
            origin,
        });
        self.nodes[dummy].outs.push(next);

        let s = &mut self.segments[segment];
        s.next = Some(next);
        s.target = dummy;
        s.to_track = track;
        s.to_band = band;
        self.nodes[dummy].ins.push(segment);
        for slot in self.nodes[target].ins.iter_mut() {
            if *slot == segment {
                *slot = next;
            }
        }
    }

    /// Synthetic unit at a lattice cell, created and slotted into the
    /// traversal order on first use.
    fn synthetic_at(&mut self, track: i64, band: i64) -> usize {
        if let Some(&node) = self.synthetic.get(&(track, band)) {
            return node;
        }

        let node = self.nodes.len();
        let id = format!("_{track}_{band}");
        self.nodes.push(RouteNode {
            id: UnitId::new(id.clone()),
            name: id,
            unit: None,
            track,
            band,
            ins: Vec::new(),
            outs: Vec::new(),
        });
        self.synthetic.insert((track, band), node);

        let at = self.order.iter().position(|&n| {
            let other = &self.nodes[n];
            (other.track > track && other.band == band) || other.band > band
        });
        match at {
            Some(at) => self.order.insert(at, node),
            None => self.order.push(node),
        }
        node
    }

    fn assign_in_slots(&mut self, members: &[usize]) {
        for &node in members {
            let ins = self.nodes[node].ins.clone();
            let (fixed, mut fresh): (Vec<usize>, Vec<usize>) = if self.nodes[node].is_synthetic() {
                ins.into_iter().partition(|&s| self.segments[s].extends.is_some())
            } else {
                (Vec::new(), ins)
            };

            fresh.sort_by(|&a, &b| {
                let (sa, sb) = (&self.segments[a], &self.segments[b]);
                let da = sa.from_track - sa.to_track;
                let db = sb.from_track - sb.to_track;
                da.cmp(&db).then_with(|| {
                    if da < 0 {
                        sb.lane.cmp(&sa.lane)
                    } else {
                        sa.lane.cmp(&sb.lane)
                    }
                })
            });

            let offsets: Vec<i64> = fresh
                .iter()
                .map(|&s| self.segments[s].from_track - self.segments[s].to_track)
                .collect();
            let pinned: Vec<i64> = fixed.iter().map(|&s| self.extended_in_order(s)).collect();
            let slots = merge_fixed_and_floating(&pinned, &center_positions(&offsets));

            for (&s, slot) in fresh.iter().zip(slots) {
                self.segments[s].in_order = slot;
            }
            for &s in &fixed {
                self.segments[s].in_order = self.extended_in_order(s);
            }
        }
    }

    /// Continuing segments leave at the slot their predecessor arrived at.
    fn carry_out_slots(&mut self, segments: &[usize]) {
        for &s in segments {
            if self.segments[s].extends.is_some() {
                self.segments[s].out_order = self.extended_in_order(s);
            }
        }
    }

    fn assign_out_slots(&mut self, members: &[usize]) {
        for &node in members {
            let mut outs = self.nodes[node].outs.clone();
            if self.nodes[node].is_synthetic() {
                for s in outs {
                    self.segments[s].out_order = self.extended_in_order(s);
                }
                continue;
            }

            outs.sort_by_key(|&s| self.segments[s].to_track - self.segments[s].from_track);
            let offsets: Vec<i64> = outs
                .iter()
                .map(|&s| self.segments[s].to_track - self.segments[s].from_track)
                .collect();
            for (&s, slot) in outs.iter().zip(center_positions(&offsets)) {
                self.segments[s].out_order = slot;
            }
        }
    }

    fn assign_lanes(&mut self, segments: &[usize]) {
        let candidates: Vec<LaneCandidate> = segments
            .iter()
            .map(|&s| {
                let segment = &self.segments[s];
                LaneCandidate {
                    id: segment.id,
                    from: segment.from_track,
                    to: segment.to_track,
                    out_order: segment.out_order,
                }
            })
            .collect();

        for assignment in minimize_crossings(&candidates) {
            self.segments[assignment.id as usize - 1].lane = assignment.lane;
        }
    }

    /// In-slot of the segment `segment` continues, 0 for first segments.
    fn extended_in_order(&self, segment: usize) -> i64 {
        self.segments[segment]
            .extends
            .map(|e| self.segments[e].in_order)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StratigraphicUnit;

    fn scenario() -> (RelationStore, Vec<GridPosition>) {
        let store = RelationStore::from_units(vec![
            StratigraphicUnit::named_by_id("A").with_later_than(["B", "D", "F"]),
            StratigraphicUnit::named_by_id("B").with_later_than(["C"]),
            StratigraphicUnit::named_by_id("D").with_later_than(["C"]),
            StratigraphicUnit::named_by_id("C"),
            StratigraphicUnit::named_by_id("F"),
        ]);
        let positions = vec![
            GridPosition::new(0, 1),
            GridPosition::new(1, 0),
            GridPosition::new(1, 2),
            GridPosition::new(2, 0),
            GridPosition::new(2, 1),
        ];
        (store, positions)
    }

    #[test]
    fn test_long_edge_split_through_gutter() {
        let (store, positions) = scenario();
        let routing = route(&store, &positions, false);

        assert_eq!(routing.nodes.len(), 6);
        let dummy = &routing.nodes[5];
        assert!(dummy.is_synthetic());
        assert_eq!(dummy.id, UnitId::from("_4_3"));
        assert_eq!((dummy.track, dummy.band), (4, 3));

        // A->F became segment 3 (A->_4_3) and segment 6 (_4_3->F)
        let first = &routing.segments[2];
        let rest = &routing.segments[5];
        assert_eq!(first.target, 5);
        assert_eq!(first.next, Some(5));
        assert_eq!(rest.extends, Some(2));
        assert_eq!(rest.origin, Relation::new("A", "F"));
        assert_eq!(routing.nodes[4].ins, vec![5]);
    }

    #[test]
    fn test_slots_and_lanes() {
        let (store, positions) = scenario();
        let routing = route(&store, &positions, false);

        // (id, lane, in_order, out_order)
        let actual: Vec<(u32, u32, i64, i64)> = routing
            .segments
            .iter()
            .map(|s| (s.id, s.lane, s.in_order, s.out_order))
            .collect();
        assert_eq!(
            actual,
            vec![
                (1, 1, 1, -1),
                (2, 1, -1, 2),
                (3, 2, -1, 1),
                (4, 1, 0, 0),
                (5, 2, 1, -1),
                (6, 1, 1, -1),
            ]
        );
        assert_eq!(
            routing.rows,
            vec![
                RowBand { row: 0, max_lane: 2 },
                RowBand { row: 1, max_lane: 2 },
                RowBand { row: 2, max_lane: 0 },
            ]
        );
    }

    #[test]
    fn test_lanes_ignore_real_out_slots() {
        // A on track 3 and B on track 7 both drop to X on track 5
        let store = RelationStore::from_units(vec![
            StratigraphicUnit::named_by_id("A").with_later_than(["X"]),
            StratigraphicUnit::named_by_id("B").with_later_than(["X"]),
            StratigraphicUnit::named_by_id("X"),
        ]);
        let positions = vec![
            GridPosition::new(0, 1),
            GridPosition::new(0, 3),
            GridPosition::new(1, 2),
        ];
        let routing = route(&store, &positions, false);

        let actual: Vec<(u32, u32, i64)> = routing
            .segments
            .iter()
            .map(|s| (s.id, s.lane, s.out_order))
            .collect();
        assert_eq!(actual, vec![(1, 1, 1), (2, 1, -1)]);
        assert_eq!(routing.rows[0], RowBand { row: 0, max_lane: 1 });
    }

    #[test]
    fn test_empty() {
        let routing = route(&RelationStore::new(), &[], false);
        assert!(routing.nodes.is_empty());
        assert!(routing.rows.is_empty());
    }
}
