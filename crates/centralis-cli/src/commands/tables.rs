//! Tables command - list tables in the source database.

use std::path::PathBuf;

use centralis::{DatabaseConnector, DbCredentials};
use colored::Colorize;

use super::CommandResult;

pub async fn run(creds: PathBuf) -> CommandResult {
    let credentials = DbCredentials::from_yaml_file(&creds)?;
    let connector = DatabaseConnector::connect(&credentials).await?;
    let tables = connector.list_tables().await?;

    println!(
        "{} {} on {}",
        "Tables in".cyan().bold(),
        credentials.database.white().bold(),
        credentials.host
    );
    if tables.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for table in &tables {
        println!("  {}", table);
    }

    Ok(())
}
