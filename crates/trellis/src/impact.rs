//! Change-impact analysis: from an affected function to the externally
//! visible surfaces it can reach.
//!
//! For each affected `function`/`method`, one summary row reports the
//! distinct direct callers plus up to [`MAX_UPSTREAM_BOUNDARIES`] reachable
//! boundary surfaces (`api_route`, `component`). Traversal is a
//! breadth-first walk of outbound edges of every kind, guarded by a visited
//! set so call cycles terminate; boundaries are exit points and are not
//! traversed through. Entities that reach no boundary at all are omitted
//! from the result rather than reported with an empty list.
//!
//! Traversal state is plain in-memory data rebuilt per call; only the store
//! reads are async.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::error::Result;
use crate::overlay::is_shadow_key;
use crate::store::GraphStore;
use crate::types::{BlastRadiusEntry, BoundaryHit, EdgeKind, Entity, OrgId};

/// Cap on reported boundary surfaces per affected entity.
pub const MAX_UPSTREAM_BOUNDARIES: usize = 5;

/// Build one blast-radius row per affected function that reaches a boundary.
///
/// Non-function kinds in `affected` are skipped. Repo scope is taken from
/// each entity itself; `org_id` scopes every store read.
///
/// # Errors
///
/// Propagates store failures unchanged.
pub async fn build_blast_radius_summary(
    store: &dyn GraphStore,
    org_id: &OrgId,
    affected: &[Entity],
) -> Result<Vec<BlastRadiusEntry>> {
    let mut entries = Vec::new();

    for entity in affected.iter().filter(|e| e.kind.is_function_like()) {
        let inbound = store
            .get_callers_of(org_id, &entity.repo_id, &entity.id)
            .await?;
        // Branch shadow copies keep canonical endpoints; skip their edge
        // records so a caller is not counted twice.
        let caller_count = inbound
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Calls && !is_shadow_key(&edge.id))
            .map(|edge| edge.from_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let upstream_boundaries = find_reachable_boundaries(store, org_id, entity).await?;
        if upstream_boundaries.is_empty() {
            debug!(id = %entity.id, name = %entity.name, "no reachable boundary, omitting");
            continue;
        }

        entries.push(BlastRadiusEntry {
            entity: entity.clone(),
            caller_count,
            upstream_boundaries,
        });
    }

    Ok(entries)
}

/// Breadth-first walk from `origin` over outbound edges, collecting up to
/// [`MAX_UPSTREAM_BOUNDARIES`] boundary surfaces.
async fn find_reachable_boundaries(
    store: &dyn GraphStore,
    org_id: &OrgId,
    origin: &Entity,
) -> Result<Vec<BoundaryHit>> {
    let repo_id = &origin.repo_id;
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(origin.id.clone());

    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((origin.id.clone(), 0));

    let mut hits: Vec<BoundaryHit> = Vec::new();

    while let Some((current, depth)) = queue.pop_front() {
        let outbound = store.get_callees_of(org_id, repo_id, &current).await?;

        let mut neighbors: Vec<String> = outbound
            .iter()
            .filter(|edge| !is_shadow_key(&edge.id))
            .map(|edge| edge.to_entity_id().to_string())
            .collect();
        neighbors.sort();
        neighbors.dedup();

        for neighbor in neighbors {
            if !visited.insert(neighbor.clone()) {
                continue;
            }
            let Some(target) = store.get_entity(org_id, repo_id, &neighbor).await? else {
                continue;
            };
            if target.kind.is_boundary() {
                hits.push(BoundaryHit {
                    kind: target.kind,
                    name: target.name.clone(),
                    path: boundary_path(&origin.name, &target.name, depth + 1),
                });
                if hits.len() >= MAX_UPSTREAM_BOUNDARIES {
                    return Ok(hits);
                }
            } else {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    Ok(hits)
}

/// Render the human-readable path for a boundary hit `hops` edges away.
fn boundary_path(origin: &str, boundary: &str, hops: usize) -> String {
    if hops <= 1 {
        format!("{origin} → {boundary}")
    } else {
        format!("{origin} → ... → {boundary}")
    }
}
