//! Centralis CLI - extract and clean retail business records.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Clean {
            kind,
            file,
            output,
        } => commands::clean::run(kind.into(), file, output),

        Commands::FetchStores {
            output,
            concurrency,
        } => commands::fetch::run(output, concurrency).await,

        Commands::Tables { creds } => commands::tables::run(creds).await,

        Commands::Extract {
            kind,
            table,
            creds,
            upload_creds,
        } => commands::extract::run(kind.into(), table, creds, upload_creds).await,

        Commands::Schema { kind } => commands::schema::run(kind.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "centralis=debug" } else { "centralis=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
