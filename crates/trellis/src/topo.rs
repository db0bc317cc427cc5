//! Dependency leveling for processing order.
//!
//! [`topological_sort_entities`] groups entities into levels such that every
//! entity's callees sit in an earlier level. Downstream consumers walk the
//! levels in order and can process each level's members in parallel: by the
//! time a function is reached, everything it calls has already been handled.
//!
//! Only `calls` edges participate. Edges whose endpoints fall outside the
//! given entity set are ignored, as are self-calls (a node can never wait on
//! itself). Call cycles are broken deterministically by emitting the
//! lowest-id blocked entity as its own single-element level and continuing.
//!
//! Output order is deterministic: levels are sorted by entity id, and the
//! same input always yields the same leveling.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::types::{Edge, EdgeKind, Entity};

/// Group `entities` into dependency levels, callees before callers.
///
/// Returns one `Vec<Entity>` per level, each sorted by entity id. Every
/// input entity appears in exactly one level, cycles included.
#[must_use]
pub fn topological_sort_entities(entities: Vec<Entity>, edges: &[Edge]) -> Vec<Vec<Entity>> {
    if entities.is_empty() {
        return Vec::new();
    }

    let mut remaining: BTreeMap<String, Entity> = entities
        .into_iter()
        .map(|entity| (entity.id.clone(), entity))
        .collect();

    // Out-degree per node over unique call pairs, plus the reverse adjacency
    // (callee -> callers) used to release callers when a callee is emitted.
    let mut out_degree: HashMap<String, usize> =
        remaining.keys().map(|id| (id.clone(), 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for edge in edges.iter().filter(|edge| edge.kind == EdgeKind::Calls) {
        let from = edge.from_entity_id();
        let to = edge.to_entity_id();
        if from == to || !remaining.contains_key(from) || !remaining.contains_key(to) {
            continue;
        }
        if !seen_pairs.insert((from.to_string(), to.to_string())) {
            continue;
        }
        if let Some(degree) = out_degree.get_mut(from) {
            *degree += 1;
        }
        dependents
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
    }

    let mut levels: Vec<Vec<Entity>> = Vec::new();
    while !remaining.is_empty() {
        let ready: Vec<String> = remaining
            .keys()
            .filter(|id| out_degree.get(*id).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();

        if ready.is_empty() {
            // Every remaining node waits on another: a call cycle. Emit the
            // lowest id alone and let the loop make progress again.
            if let Some((victim_id, victim)) = remaining.pop_first() {
                debug!(id = %victim_id, "breaking call cycle");
                release_callers(&dependents, &mut out_degree, &victim_id);
                levels.push(vec![victim]);
            }
            continue;
        }

        let mut level = Vec::with_capacity(ready.len());
        for id in &ready {
            if let Some(entity) = remaining.remove(id) {
                release_callers(&dependents, &mut out_degree, id);
                level.push(entity);
            }
        }
        levels.push(level);
    }

    levels
}

/// Decrement the out-degree of every caller of `emitted`.
fn release_callers(
    dependents: &HashMap<String, Vec<String>>,
    out_degree: &mut HashMap<String, usize>,
    emitted: &str,
) {
    for caller in dependents.get(emitted).into_iter().flatten() {
        if let Some(degree) = out_degree.get_mut(caller) {
            *degree = degree.saturating_sub(1);
        }
    }
}
