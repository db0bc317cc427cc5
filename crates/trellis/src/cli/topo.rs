//! `trellis topo` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use trellis::{GraphSnapshot, materialize_records, topological_sort_entities};

use super::display;

/// Run the topo command.
pub async fn run(snapshot_path: &Path) -> Result<()> {
    let snapshot = GraphSnapshot::load(snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let (org, repo) = snapshot.scope();

    // Order what the extractor saw; synthesized file scaffolding would only
    // pad level zero.
    let (entities, edges) = materialize_records(&org, &repo, snapshot.entities, snapshot.edges);
    let levels = topological_sort_entities(entities, &edges);

    if levels.is_empty() {
        println!("{}", "Nothing to order: snapshot is empty".dimmed());
        return Ok(());
    }

    println!(
        "{} {} levels, callees first",
        "Ordered".green().bold(),
        levels.len()
    );
    for (index, level) in levels.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            format!("Level {index}").white().bold(),
            format!("({} entities)", level.len()).dimmed()
        );
        display::print_entities(level);
    }

    Ok(())
}
