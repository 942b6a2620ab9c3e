//! Fetch command - retrieve and clean every store from the store API.

use std::path::PathBuf;

use centralis::{CentralisConfig, EntityKind, Extractor, FetchOutcome};
use colored::Colorize;

use super::{CommandResult, print_report, write_table};

pub async fn run(output: Option<PathBuf>, concurrency: usize) -> CommandResult {
    if concurrency == 0 {
        return Err("--concurrency must be at least 1".into());
    }

    let mut config = CentralisConfig::from_env();
    config.fetch.concurrency = concurrency;
    let extractor = Extractor::new(config)?;

    let count = extractor.count_stores().await?;
    println!(
        "{} {} stores ({} in flight)",
        "Fetching".cyan().bold(),
        count.to_string().white().bold(),
        concurrency
    );

    let table = match extractor.fetch_stores_outcome().await? {
        FetchOutcome::Fetched { table, failures } => {
            if !failures.is_empty() {
                println!(
                    "{} {} stores could not be fetched:",
                    "Warning:".yellow().bold(),
                    failures.len()
                );
                for failure in &failures {
                    println!(
                        "  #{} after {} attempt(s): {}",
                        failure.index, failure.attempts, failure.error
                    );
                }
            }
            table
        }
        FetchOutcome::AllFailed { failures } => {
            return Err(format!("All {} store requests failed", failures.len()).into());
        }
    };
    println!("  Retrieved {} stores", table.row_count());
    println!();

    let (cleaned, report) = extractor
        .engine()
        .clean_with_report(EntityKind::Store, &table)?;
    print_report(&report);

    let output = output.unwrap_or_else(|| PathBuf::from("stores.clean.csv"));
    write_table(&cleaned, &output)
}
