//! `trellis stats` command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use trellis::{GraphSnapshot, materialize_batch};

/// Run the stats command.
pub async fn run(snapshot_path: &Path) -> Result<()> {
    let snapshot = GraphSnapshot::load(snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let (org, repo) = snapshot.scope();

    let (entities, edges) = materialize_batch(&org, &repo, snapshot.entities, snapshot.edges);

    println!(
        "{} {}/{}: {} entities, {} edges",
        "Graph".cyan().bold(),
        org,
        repo,
        entities.len(),
        edges.len()
    );

    let mut entity_kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for entity in &entities {
        *entity_kinds.entry(entity.kind.as_str()).or_insert(0) += 1;
    }

    let mut edge_kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in &edges {
        *edge_kinds.entry(edge.kind.as_str()).or_insert(0) += 1;
    }

    println!();
    println!("{}:", "Entities by kind".white().bold());
    for (kind, count) in &entity_kinds {
        println!("  {kind:<12} {count}");
    }

    if !edge_kinds.is_empty() {
        println!();
        println!("{}:", "Edges by kind".white().bold());
        for (kind, count) in &edge_kinds {
            println!("  {kind:<12} {count}");
        }
    }

    Ok(())
}
