//! CLI command implementations.

pub mod clean;
pub mod extract;
pub mod fetch;
pub mod schema;
pub mod tables;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use centralis::{CleaningReport, RecordTable};
use colored::Colorize;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print a per-stage summary of a cleaning run.
pub fn print_report(report: &CleaningReport) {
    println!(
        "{} {} ({} → {} rows)",
        "Cleaned".cyan().bold(),
        report.entity.to_string().white().bold(),
        report.rows_in,
        report.rows_out
    );
    println!();

    for stage in &report.stages {
        let effect = if stage.skipped {
            "skipped".dimmed().to_string()
        } else if stage.values_corrected > 0 {
            format!("{} corrected", stage.values_corrected).blue().to_string()
        } else if stage.rows_dropped() > 0 {
            format!("-{} rows", stage.rows_dropped()).red().to_string()
        } else {
            "ok".green().to_string()
        };
        println!("  {:<16} {:<12} {}", stage.stage, effect, stage.description.dimmed());
    }
    println!();

    let dropped = report.rows_dropped();
    if dropped > 0 {
        println!("{}", "Rows dropped by issue:".yellow().bold());
        for (issue, count) in report.dropped_by_issue() {
            println!("  {:<12} {}", issue.label(), count.to_string().red());
        }
        println!();
    }
    if report.values_corrected() > 0 {
        println!(
            "Values corrected: {}",
            report.values_corrected().to_string().blue()
        );
    }
}

/// Write `table` as CSV to `path`.
pub fn write_table(table: &RecordTable, path: &Path) -> CommandResult {
    let file = File::create(path)?;
    table.write_csv(BufWriter::new(file))?;
    println!(
        "Wrote {} rows to {}",
        table.row_count().to_string().white().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}
