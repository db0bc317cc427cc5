//! `trellis blast` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use trellis::{
    Entity, GraphSnapshot, GraphStore, MemoryGraphStore, build_blast_radius_summary,
    materialize_batch,
};

/// Run the blast command.
pub async fn run(snapshot_path: &Path, name: &str) -> Result<()> {
    let snapshot = GraphSnapshot::load(snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let (org, repo) = snapshot.scope();

    let (entities, edges) = materialize_batch(&org, &repo, snapshot.entities, snapshot.edges);
    let affected: Vec<Entity> = entities
        .iter()
        .filter(|entity| entity.name == name && entity.kind.is_function_like())
        .cloned()
        .collect();

    if affected.is_empty() {
        println!(
            "{}: no function or method named {name:?} in the snapshot",
            "Nothing to trace".yellow()
        );
        return Ok(());
    }

    let store = MemoryGraphStore::new();
    store.bulk_upsert_entities(entities).await?;
    store.bulk_upsert_edges(edges).await?;

    let summary = build_blast_radius_summary(&store, &org, &affected).await?;

    if summary.is_empty() {
        println!(
            "{} {name:?} reaches no external surface",
            "Contained".green().bold()
        );
        return Ok(());
    }

    for entry in &summary {
        println!(
            "{} {} {}",
            entry.entity.name.white().bold(),
            format!("({} direct callers)", entry.caller_count).dimmed(),
            entry
                .entity
                .file_path
                .as_deref()
                .unwrap_or_default()
                .dimmed()
        );
        for hit in &entry.upstream_boundaries {
            println!(
                "  {} {} {}",
                "•".red(),
                format!("[{}]", hit.kind.as_str()).dimmed(),
                hit.path
            );
        }
    }

    Ok(())
}
