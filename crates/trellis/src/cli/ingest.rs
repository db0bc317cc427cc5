//! `trellis ingest` command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use trellis::{
    BranchOverlay, BranchPolicy, GraphSnapshot, MemoryGraphStore, write_entities_to_graph,
};

/// Run the ingest command.
pub async fn run(
    snapshot_path: &Path,
    branch: Option<&str>,
    config: Option<&Path>,
    index_version: Option<&str>,
) -> Result<()> {
    let snapshot = GraphSnapshot::load(snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let (org, repo) = snapshot.scope();

    println!(
        "{} {} into {}/{} ({} entities, {} edges)...",
        "Ingesting".cyan().bold(),
        snapshot_path.display(),
        org,
        repo,
        snapshot.entities.len(),
        snapshot.edges.len()
    );

    let policy = match config {
        Some(path) => BranchPolicy::from_yaml_file(path)
            .with_context(|| format!("failed to load branch policy {}", path.display()))?,
        None => BranchPolicy::default(),
    };

    let store = MemoryGraphStore::new();
    let summary = match branch {
        Some(branch) if !policy.is_default(branch) => {
            if !policy.is_eligible(branch) {
                bail!("branch {branch:?} is not eligible for indexing under the branch policy");
            }
            println!(
                "{}: writing under branch overlay {branch:?}",
                "Branch".yellow()
            );
            let overlay = BranchOverlay::new(store.clone(), branch);
            write_entities_to_graph(
                &overlay,
                &org,
                &repo,
                snapshot.entities,
                snapshot.edges,
                index_version,
            )
            .await?
        }
        _ => {
            write_entities_to_graph(
                &store,
                &org,
                &repo,
                snapshot.entities,
                snapshot.edges,
                index_version,
            )
            .await?
        }
    };

    println!();
    println!(
        "{} {} entities, {} edges",
        "Wrote".green().bold(),
        summary.entities_written,
        summary.edges_written
    );
    println!(
        "{}: {} files, {} functions, {} classes",
        "Breakdown".dimmed(),
        summary.file_count,
        summary.function_count,
        summary.class_count
    );
    if let Some(version) = index_version {
        println!("{}: {version}", "Index version".dimmed());
    }

    Ok(())
}
