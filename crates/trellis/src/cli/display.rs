//! Common display utilities for CLI commands.

use colored::{ColoredString, Colorize};
use trellis::{Entity, Severity};

const MAX_DISPLAY_ITEMS: usize = 10;

/// Print a bullet list of entities, truncated past `MAX_DISPLAY_ITEMS`.
pub fn print_entities(entities: &[Entity]) {
    for entity in entities.iter().take(MAX_DISPLAY_ITEMS) {
        println!(
            "  {} {} {}",
            "•".dimmed(),
            entity.name,
            format!("[{}]", entity.kind.as_str()).dimmed()
        );
    }
    if entities.len() > MAX_DISPLAY_ITEMS {
        println!(
            "  {} ... and {} more",
            "•".dimmed(),
            entities.len() - MAX_DISPLAY_ITEMS
        );
    }
}

/// Render a cycle as a closed arrow chain (`a → b → a`).
pub fn render_cycle(ids: &[String]) -> String {
    let mut chain = ids.join(" → ");
    if let Some(first) = ids.first() {
        chain.push_str(" → ");
        chain.push_str(first);
    }
    chain
}

/// Colorized severity tag for finding lists.
pub fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => severity.as_str().red().bold(),
        Severity::Medium => severity.as_str().yellow(),
    }
}
