//! Integration tests for the graph analyses over ingested snapshots.
//!
//! These tests drive topological ordering, blast-radius tracing, and the
//! structural risk detectors through the public API, starting from raw
//! extraction records the way the CLI does: promote records, then analyze.

use std::collections::{BTreeMap, HashMap};

use rstest::rstest;
use trellis::{
    DegreeDirection, Edge, EdgeKind, EdgeRecord, Entity, EntityKind, EntityRecord,
    MAX_UPSTREAM_BOUNDARIES, MemoryGraphStore, OrgId, RepoId, RiskConfig, Severity, analyze_risks,
    build_blast_radius_summary, detect_cycles, detect_degree_risks, entity_hash,
    materialize_records, topological_sort_entities, write_entities_to_graph,
};

const REPO: &str = "payments";

fn scope() -> (OrgId, RepoId) {
    (OrgId::new("acme"), RepoId::new(REPO))
}

fn rec(kind: EntityKind, name: &str, file_path: &str, exported: bool) -> EntityRecord {
    EntityRecord {
        id: None,
        kind,
        name: name.to_string(),
        file_path: Some(file_path.to_string()),
        start_line: Some(1),
        end_line: Some(40),
        signature: None,
        language: Some("typescript".to_string()),
        exported,
        parent: None,
        body: None,
        is_async: false,
        parameter_count: None,
        return_type: None,
        complexity: None,
    }
}

fn id_of(kind: EntityKind, name: &str, file_path: &str) -> String {
    entity_hash(REPO, Some(file_path), kind, name, None)
}

fn call(from: (EntityKind, &str, &str), to: (EntityKind, &str, &str)) -> EdgeRecord {
    let from_id = id_of(from.0, from.1, from.2);
    let to_id = id_of(to.0, to.1, to.2);
    EdgeRecord {
        from_id: from.0.partition().qualify(&from_id),
        to_id: to.0.partition().qualify(&to_id),
        kind: EdgeKind::Calls,
        metadata: BTreeMap::new(),
    }
}

fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
    entities
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("no entity named {name}"))
}

/// Build the payments-service extraction used across the analysis tests.
///
/// Call graph (call edges point at what a change can reach):
/// ```text
///   luhnCheck -> validateCard -> chargeCard -> POST /api/charge (api_route)
///                                    ^
///                                    |
///                              recordLedger
///
///   tempDebug   (uncalled, unexported)
/// ```
fn payments_graph() -> (Vec<EntityRecord>, Vec<EdgeRecord>) {
    let entities = vec![
        rec(EntityKind::Function, "luhnCheck", "src/card.ts", true),
        rec(EntityKind::Function, "validateCard", "src/card.ts", true),
        rec(EntityKind::Function, "chargeCard", "src/charge.ts", true),
        rec(EntityKind::Function, "recordLedger", "src/ledger.ts", true),
        rec(EntityKind::Function, "tempDebug", "src/charge.ts", false),
        rec(EntityKind::ApiRoute, "POST /api/charge", "src/routes.ts", true),
    ];
    let edges = vec![
        call(
            (EntityKind::Function, "luhnCheck", "src/card.ts"),
            (EntityKind::Function, "validateCard", "src/card.ts"),
        ),
        call(
            (EntityKind::Function, "validateCard", "src/card.ts"),
            (EntityKind::Function, "chargeCard", "src/charge.ts"),
        ),
        call(
            (EntityKind::Function, "recordLedger", "src/ledger.ts"),
            (EntityKind::Function, "chargeCard", "src/charge.ts"),
        ),
        call(
            (EntityKind::Function, "chargeCard", "src/charge.ts"),
            (EntityKind::ApiRoute, "POST /api/charge", "src/routes.ts"),
        ),
    ];
    (entities, edges)
}

// ============================================================================
// Topological Ordering
// ============================================================================

#[test]
fn call_chain_orders_callees_before_callers() {
    let (org, repo) = scope();
    let records = vec![
        rec(EntityKind::Function, "a", "src/x.ts", true),
        rec(EntityKind::Function, "b", "src/x.ts", true),
        rec(EntityKind::Function, "c", "src/x.ts", true),
    ];
    let edges = vec![
        call(
            (EntityKind::Function, "a", "src/x.ts"),
            (EntityKind::Function, "b", "src/x.ts"),
        ),
        call(
            (EntityKind::Function, "b", "src/x.ts"),
            (EntityKind::Function, "c", "src/x.ts"),
        ),
    ];
    let (entities, edges) = materialize_records(&org, &repo, records, edges);

    let levels = topological_sort_entities(entities, &edges);

    let names: Vec<Vec<&str>> = levels
        .iter()
        .map(|level| level.iter().map(|e| e.name.as_str()).collect())
        .collect();
    assert_eq!(names, vec![vec!["c"], vec!["b"], vec!["a"]]);
}

#[test]
fn every_call_edge_points_to_an_earlier_level() {
    let (org, repo) = scope();
    let (records, edge_records) = payments_graph();
    let (entities, edges) = materialize_records(&org, &repo, records, edge_records);

    let levels = topological_sort_entities(entities.clone(), &edges);

    let mut level_of: HashMap<&str, usize> = HashMap::new();
    for (index, level) in levels.iter().enumerate() {
        for entity in level {
            level_of.insert(entity.id.as_str(), index);
        }
    }

    let placed: usize = levels.iter().map(Vec::len).sum();
    assert_eq!(placed, entities.len(), "every entity appears exactly once");

    for edge in edges.iter().filter(|e| e.kind == EdgeKind::Calls) {
        let from = level_of[edge.from_entity_id()];
        let to = level_of[edge.to_entity_id()];
        assert!(to < from, "callee must be leveled before its caller");
    }

    // Sinks land in level zero: the route and the uncalled helper.
    let route_id = id_of(EntityKind::ApiRoute, "POST /api/charge", "src/routes.ts");
    let debug_id = id_of(EntityKind::Function, "tempDebug", "src/charge.ts");
    assert_eq!(level_of[route_id.as_str()], 0);
    assert_eq!(level_of[debug_id.as_str()], 0);
}

// ============================================================================
// Blast Radius
// ============================================================================

#[tokio::test]
async fn date_helper_blast_reaches_the_users_route() {
    let (org, repo) = scope();
    let records = vec![
        rec(EntityKind::Function, "formatDate", "src/date.ts", true),
        rec(EntityKind::ApiRoute, "GET /api/users", "src/routes.ts", true),
    ];
    let edges = vec![call(
        (EntityKind::Function, "formatDate", "src/date.ts"),
        (EntityKind::ApiRoute, "GET /api/users", "src/routes.ts"),
    )];
    let (entities, _) = materialize_records(&org, &repo, records.clone(), edges.clone());
    let affected = vec![find(&entities, "formatDate").clone()];

    let store = MemoryGraphStore::new();
    write_entities_to_graph(&store, &org, &repo, records, edges, None)
        .await
        .expect("ingest failed");

    let summary = build_blast_radius_summary(&store, &org, &affected)
        .await
        .expect("blast analysis failed");

    assert_eq!(summary.len(), 1);
    let hit = &summary[0].upstream_boundaries[0];
    assert_eq!(hit.kind, EntityKind::ApiRoute);
    assert_eq!(hit.name, "GET /api/users");
    assert!(hit.path.contains("formatDate"), "path names the origin");
    assert!(hit.path.contains("GET /api/users"), "path names the boundary");
}

#[tokio::test]
async fn seven_reachable_boundaries_report_at_most_five() {
    let (org, repo) = scope();
    let mut records = vec![rec(EntityKind::Function, "publishAll", "src/pub.ts", true)];
    let mut edges = Vec::new();
    for n in 0..7 {
        let route = format!("GET /api/feed/{n}");
        records.push(rec(EntityKind::ApiRoute, &route, "src/routes.ts", true));
        edges.push(call(
            (EntityKind::Function, "publishAll", "src/pub.ts"),
            (EntityKind::ApiRoute, &route, "src/routes.ts"),
        ));
    }
    let (entities, _) = materialize_records(&org, &repo, records.clone(), edges.clone());
    let affected = vec![find(&entities, "publishAll").clone()];

    let store = MemoryGraphStore::new();
    write_entities_to_graph(&store, &org, &repo, records, edges, None)
        .await
        .expect("ingest failed");

    let summary = build_blast_radius_summary(&store, &org, &affected)
        .await
        .expect("blast analysis failed");

    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].upstream_boundaries.len(), MAX_UPSTREAM_BOUNDARIES);
}

#[tokio::test]
async fn payments_blast_reports_callers_and_elided_paths() {
    let (org, repo) = scope();
    let (records, edge_records) = payments_graph();
    let (entities, _) = materialize_records(&org, &repo, records.clone(), edge_records.clone());
    let affected = vec![
        find(&entities, "luhnCheck").clone(),
        find(&entities, "chargeCard").clone(),
    ];

    let store = MemoryGraphStore::new();
    write_entities_to_graph(&store, &org, &repo, records, edge_records, None)
        .await
        .expect("ingest failed");

    let summary = build_blast_radius_summary(&store, &org, &affected)
        .await
        .expect("blast analysis failed");
    assert_eq!(summary.len(), 2);

    let luhn = summary.iter().find(|e| e.entity.name == "luhnCheck").unwrap();
    assert_eq!(luhn.caller_count, 0);
    assert_eq!(
        luhn.upstream_boundaries[0].path,
        "luhnCheck → ... → POST /api/charge"
    );

    let charge = summary.iter().find(|e| e.entity.name == "chargeCard").unwrap();
    assert_eq!(charge.caller_count, 2, "validateCard and recordLedger");
    assert_eq!(
        charge.upstream_boundaries[0].path,
        "chargeCard → POST /api/charge"
    );
}

// ============================================================================
// Risk Report
// ============================================================================

#[test]
fn stale_debug_helper_is_the_only_finding() {
    let (org, repo) = scope();
    let (records, edge_records) = payments_graph();
    let (entities, edges) = materialize_records(&org, &repo, records, edge_records);

    let report = analyze_risks(&entities, &edges, &RiskConfig::default());

    assert_eq!(report.dead_code.len(), 1);
    assert_eq!(report.dead_code[0].name, "tempDebug");
    assert_eq!(report.dead_code[0].file_path.as_deref(), Some("src/charge.ts"));
    assert!(report.cycles.is_empty());
    assert!(report.degree_risks.is_empty());
    assert_eq!(report.total_findings(), 1);
}

#[test]
fn mutual_recursion_is_reported_as_one_cycle() {
    let (org, repo) = scope();
    let records = vec![
        rec(EntityKind::Function, "parseExpr", "src/parse.ts", true),
        rec(EntityKind::Function, "parseTerm", "src/parse.ts", true),
    ];
    let edge_records = vec![
        call(
            (EntityKind::Function, "parseExpr", "src/parse.ts"),
            (EntityKind::Function, "parseTerm", "src/parse.ts"),
        ),
        call(
            (EntityKind::Function, "parseTerm", "src/parse.ts"),
            (EntityKind::Function, "parseExpr", "src/parse.ts"),
        ),
    ];
    let (entities, edges) = materialize_records(&org, &repo, records, edge_records);

    let findings = detect_cycles(&entities, &edges, 20);

    assert_eq!(findings.len(), 1);
    let expr_id = id_of(EntityKind::Function, "parseExpr", "src/parse.ts");
    let term_id = id_of(EntityKind::Function, "parseTerm", "src/parse.ts");
    assert!(findings[0].entity_ids.contains(&expr_id));
    assert!(findings[0].entity_ids.contains(&term_id));
}

fn fan_out_snapshot(count: usize) -> (Vec<Entity>, Vec<Edge>) {
    let (org, repo) = scope();
    let mut records = vec![rec(EntityKind::Function, "hub", "src/hub.ts", true)];
    let mut edges = Vec::new();
    for n in 0..count {
        let name = format!("helper{n:02}");
        records.push(rec(EntityKind::Function, &name, "src/helpers.ts", true));
        edges.push(call(
            (EntityKind::Function, "hub", "src/hub.ts"),
            (EntityKind::Function, &name, "src/helpers.ts"),
        ));
    }
    materialize_records(&org, &repo, records, edges)
}

fn fan_in_snapshot(count: usize) -> (Vec<Entity>, Vec<Edge>) {
    let (org, repo) = scope();
    let mut records = vec![rec(EntityKind::Function, "sink", "src/sink.ts", true)];
    let mut edges = Vec::new();
    for n in 0..count {
        let name = format!("caller{n:02}");
        records.push(rec(EntityKind::Function, &name, "src/callers.ts", true));
        edges.push(call(
            (EntityKind::Function, &name, "src/callers.ts"),
            (EntityKind::Function, "sink", "src/sink.ts"),
        ));
    }
    materialize_records(&org, &repo, records, edges)
}

#[rstest]
#[case(9, None)]
#[case(10, Some(Severity::Medium))]
#[case(14, Some(Severity::Medium))]
#[case(15, Some(Severity::High))]
fn fan_out_severity_follows_thresholds(
    #[case] degree: usize,
    #[case] expected: Option<Severity>,
) {
    let (entities, edges) = fan_out_snapshot(degree);
    let hub_id = id_of(EntityKind::Function, "hub", "src/hub.ts");

    let severity = detect_degree_risks(&entities, &edges)
        .into_iter()
        .find(|f| f.entity_id == hub_id && f.direction == DegreeDirection::FanOut)
        .map(|f| f.severity);

    assert_eq!(severity, expected);
}

#[rstest]
#[case(9, None)]
#[case(10, Some(Severity::Medium))]
#[case(19, Some(Severity::Medium))]
#[case(20, Some(Severity::High))]
fn fan_in_severity_follows_thresholds(
    #[case] degree: usize,
    #[case] expected: Option<Severity>,
) {
    let (entities, edges) = fan_in_snapshot(degree);
    let sink_id = id_of(EntityKind::Function, "sink", "src/sink.ts");

    let severity = detect_degree_risks(&entities, &edges)
        .into_iter()
        .find(|f| f.entity_id == sink_id && f.direction == DegreeDirection::FanIn)
        .map(|f| f.severity);

    assert_eq!(severity, expected);
}
