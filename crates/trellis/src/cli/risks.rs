//! `trellis risks` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use trellis::{GraphSnapshot, RiskConfig, analyze_risks, materialize_records};

use super::display;

/// Run the risks command.
pub async fn run(snapshot_path: &Path, max_cycles: usize) -> Result<()> {
    let snapshot = GraphSnapshot::load(snapshot_path)
        .await
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let (org, repo) = snapshot.scope();

    // Analyze what the extractor saw; synthesized contains edges would hide
    // dead code behind an inbound edge every entity gets.
    let (entities, edges) = materialize_records(&org, &repo, snapshot.entities, snapshot.edges);
    let report = analyze_risks(&entities, &edges, &RiskConfig { max_cycles });

    if report.total_findings() == 0 {
        println!("{}: no structural risks detected", "Clean".green().bold());
        return Ok(());
    }

    if !report.dead_code.is_empty() {
        println!(
            "{} ({}):",
            "Dead code".yellow().bold(),
            report.dead_code.len()
        );
        for finding in &report.dead_code {
            println!(
                "  {} {} {} {}",
                "•".yellow(),
                finding.name,
                format!("[{}]", finding.kind.as_str()).dimmed(),
                finding.file_path.as_deref().unwrap_or_default().dimmed()
            );
        }
        println!();
    }

    if !report.cycles.is_empty() {
        println!("{} ({}):", "Cycles".red().bold(), report.cycles.len());
        for cycle in &report.cycles {
            println!("  {} {}", "•".red(), display::render_cycle(&cycle.entity_ids));
        }
        println!();
    }

    if !report.degree_risks.is_empty() {
        println!(
            "{} ({}):",
            "Degree hotspots".red().bold(),
            report.degree_risks.len()
        );
        for finding in &report.degree_risks {
            println!(
                "  {} {} {} ({} call edges)",
                display::severity_tag(finding.severity),
                finding.name,
                finding.label().dimmed(),
                finding.degree
            );
        }
        println!();
    }

    println!(
        "{}: {}",
        "Total findings".white().bold(),
        report.total_findings()
    );

    Ok(())
}
