//! Extract command - read a database table, clean it, optionally upload it.

use std::path::PathBuf;

use centralis::{
    CentralisConfig, DatabaseConnector, DbCredentials, EntityKind, Extractor, SourceLocator,
};
use colored::Colorize;

use super::{CommandResult, print_report};

pub async fn run(
    kind: EntityKind,
    table: String,
    creds: PathBuf,
    upload_creds: Option<PathBuf>,
) -> CommandResult {
    let mut extractor = Extractor::new(CentralisConfig {
        credentials_path: Some(creds),
        ..CentralisConfig::from_env()
    })?;
    extractor.connect_database().await?;

    println!(
        "{} {} as {}",
        "Extracting".cyan().bold(),
        table.white().bold(),
        kind
    );
    let source = SourceLocator::Database { table };
    let (cleaned, report) = extractor.extract_and_clean(&source, kind).await?;
    print_report(&report);

    if let Some(path) = upload_creds {
        let target = format!("dim_{}", kind.label());
        let credentials = DbCredentials::from_yaml_file(&path)?;
        let connector = DatabaseConnector::connect(&credentials).await?;
        connector.upload_table(&cleaned, &target).await?;
        println!(
            "Uploaded {} rows to {}",
            cleaned.row_count().to_string().white().bold(),
            target.cyan()
        );
    } else {
        println!(
            "{} rows ready; pass {} to upload",
            cleaned.row_count(),
            "--upload-creds".cyan()
        );
    }

    Ok(())
}
