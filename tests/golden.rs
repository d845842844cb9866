//! Golden tests for the matrix kernel.
//!
//! These tests verify determinism and correctness of the analysis and layout
//! pipeline end to end.

use std::sync::Arc;

use harris_matrix_kernel::{
    canonical_hash_hex, ConsistencyResolver, LayoutCoordinates, MatrixConfig, MatrixPipeline,
    Point, ReasonCode, Relation, RelationRecord, RelationStore, RowBand, StaticLayering,
    StratigraphicUnit, TabularRelations, UnitId,
};
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn unit(id: &str, later: &[&str], contemporaries: &[&str]) -> StratigraphicUnit {
    StratigraphicUnit::named_by_id(id)
        .with_later_than(later.iter().copied())
        .with_contemporaries(contemporaries.iter().copied())
}

fn id(raw: &str) -> UnitId {
    UnitId::from(raw)
}

/// ```text
///       A
///     / | \
///    B  |  D
///    |  |  |
///    C--+--'
///       F
/// ```
/// `A -> F` spans two rows and is routed through a synthetic unit.
fn routing_units() -> Vec<StratigraphicUnit> {
    vec![
        unit("A", &["B", "D", "F"], &[]),
        unit("B", &["C"], &[]),
        unit("D", &["C"], &[]),
        unit("C", &[], &[]),
        unit("F", &[], &[]),
    ]
}

fn routing_coordinates() -> LayoutCoordinates {
    [
        ("A", Point::new(100.0, 10.0)),
        ("B", Point::new(50.0, 60.0)),
        ("D", Point::new(150.0, 60.0)),
        ("C", Point::new(50.0, 110.0)),
        ("F", Point::new(100.0, 110.0)),
    ]
    .into_iter()
    .collect()
}

fn routing_pipeline() -> MatrixPipeline<StaticLayering> {
    MatrixPipeline::new(
        Arc::new(StaticLayering::new(routing_coordinates())),
        MatrixConfig::default(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_same_input_same_output_100_runs() {
    let pipeline = routing_pipeline();
    let first = pipeline.run_units(routing_units()).await.unwrap();
    let first_hash = canonical_hash_hex(&first);

    for _ in 0..100 {
        let output = pipeline.run_units(routing_units()).await.unwrap();
        assert_eq!(output, first);
        assert_eq!(canonical_hash_hex(&output), first_hash);
    }
}

#[test]
fn test_resolver_report_stable_100_runs() {
    let units = vec![
        unit("1", &["2", "3"], &["4"]),
        unit("2", &["3", "4"], &[]),
        unit("3", &[], &["4", "1"]),
        unit("4", &["1"], &["3", "1"]),
    ];
    let resolver = ConsistencyResolver::default();

    let mut store = RelationStore::from_units(units.clone());
    let first = resolver.resolve(&mut store).unwrap();
    let first_edges = store.later_edges();

    for _ in 0..100 {
        let mut store = RelationStore::from_units(units.clone());
        let report = resolver.resolve(&mut store).unwrap();
        assert_eq!(report, first);
        assert_eq!(store.later_edges(), first_edges);
    }
}

#[test]
fn test_layering_fingerprint_stability() {
    let pipeline = routing_pipeline();
    let a = pipeline.analyze_units(routing_units()).unwrap();
    let b = pipeline.analyze_units(routing_units()).unwrap();

    assert_eq!(a.layering_request().fingerprint(), b.layering_request().fingerprint());

    let changed = pipeline
        .analyze_units({
            let mut units = routing_units();
            units[4] = unit("F", &["C"], &[]);
            units
        })
        .unwrap();
    assert_ne!(
        a.layering_request().fingerprint(),
        changed.layering_request().fingerprint()
    );
}

#[test]
fn test_config_change_changes_params_hash() {
    let base = MatrixConfig::default();
    let wider = MatrixConfig::default().with_tolerances(20.0, 5.0);

    assert_ne!(base.params_hash(), wider.params_hash());
    assert_eq!(base.params_hash(), base.clone().with_trace(true).params_hash());
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_contradiction_scenario() {
    let analyzed = routing_pipeline()
        .analyze_units(vec![
            unit("1", &["2", "3"], &[]),
            unit("2", &["3", "4"], &[]),
            unit("3", &["4"], &[]),
            unit("4", &["3"], &[]),
        ])
        .unwrap();

    let report = &analyzed.report;
    assert!(report.result);
    assert!(report.cycles.is_empty());
    assert_eq!(report.removed.len(), 2);
    assert!(report.removed.iter().all(|r| r.reason == ReasonCode::Contradiction));
    assert!(!analyzed.store.has_later(&id("3"), &id("4")));
    assert!(!analyzed.store.has_later(&id("4"), &id("3")));
}

#[test]
fn test_structural_cycles_then_reduction() {
    let analyzed = routing_pipeline()
        .analyze_units(vec![
            unit("1", &["2", "3"], &[]),
            unit("2", &["3"], &[]),
            unit("3", &["4"], &[]),
            unit("4", &["1"], &[]),
        ])
        .unwrap();

    let report = &analyzed.report;
    assert!(report.result);
    assert_eq!(report.cycles.len(), 2);
    assert!(report.cycles.iter().all(|c| c.solved));
    let removed: Vec<(&str, &str)> = report
        .removed
        .iter()
        .map(|r| (r.from.as_str(), r.to.as_str()))
        .collect();
    assert_eq!(removed, vec![("1", "2"), ("1", "3")]);
    assert!(report.removed.iter().all(|r| r.reason == ReasonCode::Cycle));

    assert!(analyzed.transitive.is_empty());
    assert!(analyzed.store.is_acyclic());
}

#[test]
fn test_contemporary_cycle_resolved_once() {
    let mut store = RelationStore::from_units(vec![
        unit("1", &["2", "3"], &[]),
        unit("2", &["13"], &[]),
        unit("3", &["4"], &["10"]),
        unit("4", &["6"], &["5"]),
        unit("5", &["6", "7"], &["4"]),
        unit("6", &["11"], &["7", "8"]),
        unit("7", &[], &["6"]),
        unit("8", &[], &["6", "9"]),
        unit("9", &["10"], &["8"]),
        unit("10", &[], &["3"]),
        unit("11", &[], &[]),
        unit("13", &[], &[]),
    ]);
    let resolver = ConsistencyResolver::default();

    let report = resolver.resolve(&mut store).unwrap();

    assert!(report.result);
    assert_eq!(report.cycles.len(), 1);
    assert_eq!(
        report.cycles[0].original_cycle,
        vec![id("3"), id("4"), id("6"), id("8"), id("9"), id("10")]
    );
    assert_eq!(report.removed.len(), 2);
    assert!(report.removed.iter().all(|r| r.reason == ReasonCode::Cycle));
    assert!(!store.has_contemporary(&id("3"), &id("10")));

    assert!(resolver.resolve(&mut store).unwrap().is_clean());
}

#[test]
fn test_diamond_reduction() {
    let analyzed = routing_pipeline()
        .analyze_units(vec![
            unit("T", &["1", "3"], &[]),
            unit("1", &["2", "3"], &[]),
            unit("2", &["3"], &[]),
            unit("3", &[], &[]),
        ])
        .unwrap();

    assert!(analyzed.report.is_clean());
    assert_eq!(
        analyzed.transitive,
        vec![Relation::new("T", "3"), Relation::new("1", "3")]
    );
    assert_eq!(
        analyzed.store.later_edges(),
        vec![Relation::new("T", "1"), Relation::new("1", "2"), Relation::new("2", "3")]
    );
}

#[test]
fn test_tabular_records() {
    let table: TabularRelations = serde_json::from_value(json!({
        "headers": ["uid", "arch_context", "uid_locus_2_related", "relation_type", "chronology"],
        "relations": [
            ["1", "Wall", "2", "above", null],
            ["2", "Floor", "3", "abuts", null],
            ["3", "Pit", "4", "is adjacent to", null],
            ["4", "Fill", "2", "below", "same time as"],
            [null, "Lost", "2", "above", null]
        ]
    }))
    .unwrap();
    let records = table.into_records().unwrap();
    assert_eq!(records.len(), 4);

    let analyzed = routing_pipeline().analyze(&records).unwrap();

    assert!(analyzed.report.result);
    assert_eq!(analyzed.report.removed.len(), 1);
    assert_eq!(analyzed.report.removed[0].reason, ReasonCode::NonTemporalRelation);
    assert!(analyzed.report.cycles.is_empty());

    let request = analyzed.layering_request();
    let labels: Vec<&str> = request.units.iter().map(|u| u.label.as_str()).collect();
    assert_eq!(labels, vec!["Wall", "Floor", "Pit", "Fill"]);
    assert_eq!(request.edges, vec![Relation::new("1", "2"), Relation::new("2", "3")]);
    assert_eq!(request.same_rank, vec![vec![id("2"), id("4")]]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_routed_layout() {
    let output = routing_pipeline().run_units(routing_units()).await.unwrap();
    let layout = output.layout.unwrap();

    assert_eq!(layout.edges.len(), 6);
    let lanes: Vec<u32> = layout.edges.iter().map(|e| e.lane).collect();
    assert_eq!(lanes, vec![1, 1, 2, 1, 2, 1]);
    assert_eq!(
        layout.rows,
        vec![
            RowBand { row: 0, max_lane: 2 },
            RowBand { row: 1, max_lane: 2 },
            RowBand { row: 2, max_lane: 0 },
        ]
    );

    let synthetic: Vec<&str> = layout
        .units
        .iter()
        .filter(|u| u.is_synthetic)
        .map(|u| u.id.as_str())
        .collect();
    assert_eq!(synthetic, vec!["_4_3"]);

    let segments = layout.segments_of(&Relation::new("A", "F"));
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].target, id("F"));

    // Positions flow back into the unit snapshot
    let f = output.units.iter().find(|u| u.id == id("F")).unwrap();
    assert_eq!(f.position, layout.unit(&id("F")).map(|u| u.position));
    assert!(output.units.iter().all(|u| !u.is_synthetic));
}

#[tokio::test]
async fn test_graphviz_coordinates() {
    let json = r#"{
        "name": "matrix",
        "bb": "0,0,200,120",
        "objects": [
            {"name": "A", "pos": "66,112"},
            {"name": "B", "pos": "33,80"},
            {"name": "D", "pos": "100,80"},
            {"name": "C", "pos": "33,48"},
            {"name": "F", "pos": "66,48"}
        ]
    }"#;
    let coordinates = LayoutCoordinates::from_graphviz_json(json).unwrap();
    let pipeline = MatrixPipeline::new(
        Arc::new(StaticLayering::new(coordinates)),
        MatrixConfig::default(),
    );

    let from_graphviz = pipeline.run_units(routing_units()).await.unwrap();
    let reference = routing_pipeline().run_units(routing_units()).await.unwrap();

    assert_eq!(from_graphviz.layout, reference.layout);
}

#[tokio::test]
async fn test_layering_failure_surfaces() {
    let pipeline = MatrixPipeline::new(
        Arc::new(StaticLayering::default()),
        MatrixConfig::default(),
    );

    // The record is dropped but both units still need coordinates
    let err = pipeline
        .run(&[RelationRecord::new("1", "2", "fills")])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No coordinate for unit: 1"));
}
