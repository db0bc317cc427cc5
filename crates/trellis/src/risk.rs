//! Structural risk detectors over an in-memory graph snapshot.
//!
//! All three detectors are pure functions over `(entities, edges)` slices;
//! nothing here touches the store. Edges whose endpoints are absent from the
//! entity set simply never match.
//!
//! | Detector | Signal | Threshold |
//! |----------|--------|-----------|
//! | [`detect_dead_code`] | no inbound edges, unexported, not an entry point | n/a |
//! | [`detect_cycles`] | loops over `calls`/`imports` edges | [`RiskConfig::max_cycles`] reported |
//! | [`detect_degree_risks`] fan-out | outbound `calls` degree | >=10 medium, >=15 high |
//! | [`detect_degree_risks`] fan-in | inbound `calls` degree | >=10 medium, >=20 high |
//!
//! Cycle search runs with an explicit stack so traversal depth is bounded by
//! heap, not the call stack. Found cycles are rotated so the smallest id
//! leads, then deduplicated, so the same loop entered from different start
//! nodes reports once.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{
    CycleFinding, DeadCodeFinding, DegreeDirection, DegreeFinding, Edge, EdgeKind, Entity,
    RiskReport, Severity,
};

/// Default cap on distinct reported cycles.
pub const DEFAULT_MAX_CYCLES: usize = 20;

const FAN_OUT_MEDIUM: usize = 10;
const FAN_OUT_HIGH: usize = 15;
const FAN_IN_MEDIUM: usize = 10;
const FAN_IN_HIGH: usize = 20;

/// Tuning knobs for the risk detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskConfig {
    /// Stop cycle search after this many distinct cycles.
    pub max_cycles: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

/// Run every detector and bundle the findings.
#[must_use]
pub fn analyze_risks(entities: &[Entity], edges: &[Edge], config: &RiskConfig) -> RiskReport {
    RiskReport {
        dead_code: detect_dead_code(entities, edges),
        cycles: detect_cycles(entities, edges, config.max_cycles),
        degree_risks: detect_degree_risks(entities, edges),
    }
}

/// Flag entities nothing points at that are neither exported nor
/// externally visible entry points nor structural scaffolding.
///
/// Findings are sorted by entity id.
#[must_use]
pub fn detect_dead_code(entities: &[Entity], edges: &[Edge]) -> Vec<DeadCodeFinding> {
    let referenced: HashSet<&str> = edges.iter().map(Edge::to_entity_id).collect();

    let mut findings: Vec<DeadCodeFinding> = entities
        .iter()
        .filter(|entity| !referenced.contains(entity.id.as_str()))
        .filter(|entity| !entity.exported)
        .filter(|entity| !entity.kind.is_boundary() && !entity.kind.is_structural())
        .map(|entity| DeadCodeFinding {
            entity_id: entity.id.clone(),
            name: entity.name.clone(),
            kind: entity.kind,
            file_path: entity.file_path.clone(),
        })
        .collect();
    findings.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    findings
}

/// Find call/import cycles with an iterative depth-first search.
///
/// Stops after `max_cycles` distinct cycles. Each cycle lists its members in
/// traversal order, rotated so the smallest id leads.
#[must_use]
pub fn detect_cycles(entities: &[Entity], edges: &[Edge], max_cycles: usize) -> Vec<CycleFinding> {
    if max_cycles == 0 || entities.is_empty() {
        return Vec::new();
    }

    let ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();

    // Unique-pair adjacency over calls and imports, neighbors sorted so
    // traversal order is deterministic.
    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();
    for edge in edges {
        if !matches!(edge.kind, EdgeKind::Calls | EdgeKind::Imports) {
            continue;
        }
        let from = edge.from_entity_id();
        let to = edge.to_entity_id();
        if !ids.contains(from) || !ids.contains(to) {
            continue;
        }
        if seen_pairs.insert((from, to)) {
            adjacency.entry(from).or_default().push(to);
        }
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort_unstable();
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut seen_cycles: HashSet<Vec<String>> = HashSet::new();
    let mut findings: Vec<CycleFinding> = Vec::new();

    let starts: Vec<&str> = adjacency.keys().copied().collect();
    'search: for start in starts {
        if visited.contains(start) {
            continue;
        }
        visited.insert(start);

        // Explicit DFS state: (node, next-neighbor cursor) frames plus the
        // current path and its membership set.
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        let mut path: Vec<&str> = vec![start];
        let mut on_path: HashSet<&str> = HashSet::new();
        on_path.insert(start);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let next = adjacency
                .get(node)
                .and_then(|neighbors| neighbors.get(frame.1))
                .copied();

            if let Some(neighbor) = next {
                frame.1 += 1;
                if on_path.contains(neighbor) {
                    // Back edge: the cycle is the path slice from the
                    // neighbor's first occurrence through the current node.
                    if let Some(pos) = path.iter().position(|id| *id == neighbor) {
                        let cycle = normalize_cycle(&path[pos..]);
                        if seen_cycles.insert(cycle.clone()) {
                            findings.push(CycleFinding { entity_ids: cycle });
                            if findings.len() >= max_cycles {
                                break 'search;
                            }
                        }
                    }
                } else if !visited.contains(neighbor) {
                    visited.insert(neighbor);
                    on_path.insert(neighbor);
                    path.push(neighbor);
                    stack.push((neighbor, 0));
                }
            } else {
                stack.pop();
                on_path.remove(node);
                path.pop();
            }
        }
    }

    findings
}

/// Flag fan-out hotspots ("god function" candidates) and fan-in hotspots
/// ("high-risk change surface" candidates) over `calls` edges.
///
/// Findings are sorted high severity first, then by entity id.
#[must_use]
pub fn detect_degree_risks(entities: &[Entity], edges: &[Edge]) -> Vec<DegreeFinding> {
    let by_id: HashMap<&str, &Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut fan_out: HashMap<&str, usize> = HashMap::new();
    let mut fan_in: HashMap<&str, usize> = HashMap::new();
    for edge in edges.iter().filter(|edge| edge.kind == EdgeKind::Calls) {
        let from = edge.from_entity_id();
        let to = edge.to_entity_id();
        if by_id.contains_key(from) {
            *fan_out.entry(from).or_insert(0) += 1;
        }
        if by_id.contains_key(to) {
            *fan_in.entry(to).or_insert(0) += 1;
        }
    }

    let mut findings = Vec::new();
    for (id, &degree) in &fan_out {
        let (Some(entity), Some(severity)) = (by_id.get(id), fan_out_severity(degree)) else {
            continue;
        };
        findings.push(DegreeFinding {
            entity_id: entity.id.clone(),
            name: entity.name.clone(),
            direction: DegreeDirection::FanOut,
            degree,
            severity,
        });
    }
    for (id, &degree) in &fan_in {
        let (Some(entity), Some(severity)) = (by_id.get(id), fan_in_severity(degree)) else {
            continue;
        };
        findings.push(DegreeFinding {
            entity_id: entity.id.clone(),
            name: entity.name.clone(),
            direction: DegreeDirection::FanIn,
            degree,
            severity,
        });
    }

    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    findings
}

fn fan_out_severity(degree: usize) -> Option<Severity> {
    if degree >= FAN_OUT_HIGH {
        Some(Severity::High)
    } else if degree >= FAN_OUT_MEDIUM {
        Some(Severity::Medium)
    } else {
        None
    }
}

fn fan_in_severity(degree: usize) -> Option<Severity> {
    if degree >= FAN_IN_HIGH {
        Some(Severity::High)
    } else if degree >= FAN_IN_MEDIUM {
        Some(Severity::Medium)
    } else {
        None
    }
}

/// Rotate a cycle so the smallest id leads, preserving traversal order.
fn normalize_cycle(members: &[&str]) -> Vec<String> {
    let min_pos = members
        .iter()
        .enumerate()
        .min_by_key(|&(_, id)| id)
        .map_or(0, |(pos, _)| pos);

    let mut rotated: Vec<String> = Vec::with_capacity(members.len());
    rotated.extend(members[min_pos..].iter().map(|id| (*id).to_string()));
    rotated.extend(members[..min_pos].iter().map(|id| (*id).to_string()));
    rotated
}
