//! Clean command - clean a delimited file as one entity kind.

use std::path::PathBuf;

use centralis::{CleaningEngine, EntityKind, Parser};
use colored::Colorize;

use super::{CommandResult, print_report, write_table};

pub fn run(kind: EntityKind, file: PathBuf, output: Option<PathBuf>) -> CommandResult {
    println!(
        "{} {} as {}",
        "Cleaning".cyan().bold(),
        file.display(),
        kind.to_string().white().bold()
    );

    let raw = Parser::new().parse_file(&file)?;
    println!(
        "  Read {} rows, {} columns",
        raw.row_count(),
        raw.column_count()
    );
    println!();

    let (cleaned, report) = CleaningEngine::default().clean_with_report(kind, &raw)?;
    print_report(&report);

    let output = output.unwrap_or_else(|| {
        let mut p = file.clone();
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        p.set_file_name(format!("{}.clean.csv", stem));
        p
    });
    write_table(&cleaned, &output)
}
