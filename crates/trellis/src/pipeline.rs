//! Graph write pipeline: identity assignment, file scaffolding,
//! deduplication, and bulk writes.
//!
//! One pipeline run turns raw extraction records into a consistent batch and
//! hands it to the store in two bulk upserts (entities first, then edges).
//! Stages, in order:
//!
//! 1. Assign content-addressed ids to entities that lack one.
//! 2. Assign dedup keys to all edges.
//! 3. Synthesize one `file` entity per distinct `file_path` and a `contains`
//!    edge from that file to each of its non-file members.
//! 4. Deduplicate entities and edges by id, last-write-wins; extractor
//!    records take precedence over synthesized scaffolding.
//! 5. Stamp the blue/green `index_version` tag when one is supplied.
//! 6. Bulk-upsert entities, then edges. Empty batches make no store calls.
//!
//! Because every id is a pure function of record content, re-running the
//! pipeline on identical input rewrites the same records in place: the
//! pipeline is idempotent by construction.
//!
//! The module also carries the garbage-collection half of the lifecycle:
//! [`sweep_orphans`] deletes canonical entities whose ids the current
//! extraction no longer produces.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info};

use crate::error::Result;
use crate::hash::{edge_hash, entity_hash, file_entity_hash};
use crate::overlay::is_shadow_key;
use crate::store::GraphStore;
use crate::types::{
    Edge, EdgeKind, EdgeRecord, Entity, EntityKind, EntityRecord, GraphWriteSummary, OrgId,
    Partition, RepoId,
};

/// Run the full write pipeline for one extraction batch.
///
/// Entities and edges are scoped to `(org_id, repo_id)`; the returned
/// summary counts the final deduplicated batch, including synthesized
/// scaffolding.
///
/// Records that already carry an id keep it untouched (partial re-writes
/// stay addressable); everything else is hashed from its defining fields.
/// An entity with no `file_path` is still written, it just doesn't
/// participate in scaffolding.
///
/// # Errors
///
/// Propagates store failures unchanged; this function performs no retries.
pub async fn write_entities_to_graph(
    store: &dyn GraphStore,
    org_id: &OrgId,
    repo_id: &RepoId,
    raw_entities: Vec<EntityRecord>,
    raw_edges: Vec<EdgeRecord>,
    index_version: Option<&str>,
) -> Result<GraphWriteSummary> {
    let (mut entities, mut edges) = materialize_batch(org_id, repo_id, raw_entities, raw_edges);

    // Stage 5: version stamping.
    if let Some(version) = index_version {
        for entity in &mut entities {
            entity.index_version = Some(version.to_string());
        }
        for edge in &mut edges {
            edge.index_version = Some(version.to_string());
        }
    }

    let summary = GraphWriteSummary {
        entities_written: entities.len(),
        edges_written: edges.len(),
        file_count: entities
            .iter()
            .filter(|e| e.kind == EntityKind::File)
            .count(),
        function_count: entities.iter().filter(|e| e.kind.is_function_like()).count(),
        class_count: entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Class | EntityKind::Struct))
            .count(),
    };

    // Stage 6: bulk writes, entities before edges.
    if !entities.is_empty() {
        store.bulk_upsert_entities(entities).await?;
    }
    if !edges.is_empty() {
        store.bulk_upsert_edges(edges).await?;
    }

    info!(
        org = %org_id,
        repo = %repo_id,
        entities = summary.entities_written,
        edges = summary.edges_written,
        "graph write complete"
    );
    Ok(summary)
}

/// Delete canonical entities that the current extraction no longer produces.
///
/// `live_ids` is the id set of the just-written run. Shadow-keyed records
/// are never touched here; branch cleanup owns those. Returns the number of
/// entities removed.
///
/// # Errors
///
/// Propagates store failures unchanged.
pub async fn sweep_orphans(
    store: &dyn GraphStore,
    org_id: &OrgId,
    repo_id: &RepoId,
    live_ids: &HashSet<String>,
) -> Result<u64> {
    let stored = store.list_entity_ids(org_id, repo_id).await?;
    let mut removed = 0u64;
    for key in stored {
        if is_shadow_key(&key) || live_ids.contains(&key) {
            continue;
        }
        if store.delete_entity(org_id, repo_id, &key).await? {
            removed += 1;
        }
    }
    if removed > 0 {
        info!(org = %org_id, repo = %repo_id, removed, "orphaned entities swept");
    }
    Ok(removed)
}

/// Promote raw extraction records to scoped, identity-assigned entities and
/// edges, deduplicated but without scaffolding.
///
/// These are stages 1, 2, and 4 of [`write_entities_to_graph`]. This is the
/// graph the structural analyses want: it contains exactly what the
/// extractor saw, so a never-referenced function really has zero inbound
/// edges instead of a synthesized `contains` edge masking it.
#[must_use]
pub fn materialize_records(
    org_id: &OrgId,
    repo_id: &RepoId,
    raw_entities: Vec<EntityRecord>,
    raw_edges: Vec<EdgeRecord>,
) -> (Vec<Entity>, Vec<Edge>) {
    // Stage 1: identity assignment.
    let entities: Vec<Entity> = raw_entities
        .into_iter()
        .map(|record| {
            let id = record.id.clone().unwrap_or_else(|| {
                entity_hash(
                    repo_id.as_str(),
                    record.file_path.as_deref(),
                    record.kind,
                    &record.name,
                    record.signature.as_deref(),
                )
            });
            record.into_entity(id, org_id, repo_id)
        })
        .collect();

    // Stage 2: edge dedup keys.
    let edges: Vec<Edge> = raw_edges
        .into_iter()
        .map(|record| {
            let id = edge_hash(&record.from_id, &record.to_id, record.kind);
            record.into_edge(id, org_id, repo_id)
        })
        .collect();

    (
        dedup_last_write_wins(entities, |entity| entity.id.as_str()),
        dedup_last_write_wins(edges, |edge| edge.id.as_str()),
    )
}

/// Run the pure half of the pipeline: identity assignment, edge keying,
/// file scaffolding, and dedup, without touching any store.
///
/// These are stages 1 through 4 of [`write_entities_to_graph`], producing
/// the exact batch a pipeline run would hand the store.
#[must_use]
pub fn materialize_batch(
    org_id: &OrgId,
    repo_id: &RepoId,
    raw_entities: Vec<EntityRecord>,
    raw_edges: Vec<EdgeRecord>,
) -> (Vec<Entity>, Vec<Edge>) {
    let (extracted, extracted_edges) =
        materialize_records(org_id, repo_id, raw_entities, raw_edges);

    // Stage 3: file scaffolding.
    let (scaffold_entities, scaffold_edges) = synthesize_scaffolding(org_id, repo_id, &extracted);
    debug!(
        files = scaffold_entities.len(),
        contains = scaffold_edges.len(),
        "synthesized file scaffolding"
    );

    // Stage 4 again over the merged batch, scaffolding first so extractor
    // records win ties.
    let mut entities = scaffold_entities;
    entities.extend(extracted);
    let entities = dedup_last_write_wins(entities, |entity| entity.id.as_str());

    let mut edges = scaffold_edges;
    edges.extend(extracted_edges);
    let edges = dedup_last_write_wins(edges, |edge| edge.id.as_str());

    (entities, edges)
}

/// Synthesize one `file` entity per distinct `file_path` plus a `contains`
/// edge from that file to every non-file member.
fn synthesize_scaffolding(
    org_id: &OrgId,
    repo_id: &RepoId,
    entities: &[Entity],
) -> (Vec<Entity>, Vec<Edge>) {
    let mut file_ids: HashMap<String, String> = HashMap::new();
    let mut files = Vec::new();
    let mut contains = Vec::new();

    for entity in entities {
        let Some(path) = &entity.file_path else {
            continue;
        };
        let file_id = file_ids.entry(path.clone()).or_insert_with(|| {
            let file = synthesize_file_entity(org_id, repo_id, path);
            let id = file.id.clone();
            files.push(file);
            id
        });
        if entity.kind != EntityKind::File {
            contains.push(synthesize_contains_edge(org_id, repo_id, file_id, entity));
        }
    }

    (files, contains)
}

fn synthesize_file_entity(org_id: &OrgId, repo_id: &RepoId, path: &str) -> Entity {
    Entity {
        id: file_entity_hash(repo_id.as_str(), path),
        org_id: org_id.clone(),
        repo_id: repo_id.clone(),
        kind: EntityKind::File,
        name: path.to_string(),
        file_path: Some(path.to_string()),
        start_line: None,
        end_line: None,
        signature: None,
        language: None,
        exported: false,
        parent: None,
        body: None,
        is_async: false,
        parameter_count: None,
        return_type: None,
        complexity: None,
        index_version: None,
    }
}

fn synthesize_contains_edge(
    org_id: &OrgId,
    repo_id: &RepoId,
    file_id: &str,
    member: &Entity,
) -> Edge {
    let from_id = Partition::Files.qualify(file_id);
    let to_id = member.partition_ref();
    Edge {
        id: edge_hash(&from_id, &to_id, EdgeKind::Contains),
        org_id: org_id.clone(),
        repo_id: repo_id.clone(),
        from_id,
        to_id,
        kind: EdgeKind::Contains,
        metadata: BTreeMap::new(),
        index_version: None,
    }
}

/// Deduplicate by key, last write wins, preserving first-seen order.
fn dedup_last_write_wins<T>(items: Vec<T>, key_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        match index.get(key_of(&item)) {
            Some(&slot) => kept[slot] = item,
            None => {
                index.insert(key_of(&item).to_string(), kept.len());
                kept.push(item);
            }
        }
    }
    kept
}
