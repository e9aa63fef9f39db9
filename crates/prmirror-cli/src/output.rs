//! Terminal output formatting.
//!
//! Everything here goes to stderr; stdout carries only the mirrored blob.

use colored::Colorize;
use prmirror_graph::{GraphCounts, MirrorReport};

/// Print the summary of a mirror run.
pub fn print_report(report: &MirrorReport) {
    eprintln!("{}", "Mirror complete:".green().bold());
    eprintln!("  Entities upserted:      {}", report.entities_upserted.to_string().cyan());
    eprintln!("  Relationships upserted: {}", report.relationships_upserted.to_string().cyan());
    if report.relationships_skipped > 0 {
        eprintln!(
            "  Relationships skipped:  {}",
            report.relationships_skipped.to_string().yellow()
        );
    }
    eprintln!(
        "  Visited:                {} trees, {} blobs",
        report.trees_visited, report.blobs_visited
    );
}

/// Print node and relationship counts.
pub fn print_counts(title: &str, counts: &GraphCounts) {
    eprintln!("{} {}", "Graph Status".bold(), format!("({})", title).dimmed());
    eprintln!("{}", "─".repeat(40));
    eprintln!("  Nodes:         {}", counts.nodes.to_string().cyan());
    eprintln!("  Relationships: {}", counts.relationships.to_string().cyan());
    eprintln!("{}", "─".repeat(40));
}
