//! CLI argument definitions using clap.

use std::path::PathBuf;

use centralis::EntityKind;
use clap::{Parser, Subcommand, ValueEnum};

/// Centralis: extract and clean retail business records
#[derive(Parser)]
#[command(name = "centralis")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a delimited file as one entity kind
    Clean {
        /// Entity kind of the records
        #[arg(value_enum)]
        kind: EntityChoice,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path for cleaned CSV (default: <file>.clean.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch every store from the store API and clean them
    FetchStores {
        /// Output path for cleaned CSV (default: stores.clean.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of requests in flight
        #[arg(long, default_value = "10")]
        concurrency: usize,
    },

    /// List the tables of the source database
    Tables {
        /// YAML file with RDS_* connection settings
        #[arg(long, value_name = "FILE")]
        creds: PathBuf,
    },

    /// Read a database table, clean it, and optionally upload the result
    Extract {
        /// Entity kind of the records
        #[arg(value_enum)]
        kind: EntityChoice,

        /// Source table name
        #[arg(long)]
        table: String,

        /// YAML credentials for the source database
        #[arg(long, value_name = "FILE")]
        creds: PathBuf,

        /// YAML credentials for the target database; uploads to `dim_<kind>`
        #[arg(long, value_name = "FILE")]
        upload_creds: Option<PathBuf>,
    },

    /// Print the cleaning stages of an entity kind as JSON
    Schema {
        #[arg(value_enum)]
        kind: EntityChoice,
    },
}

/// Entity kind as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EntityChoice {
    User,
    Card,
    Store,
    Product,
    Order,
    DateEvent,
}

impl From<EntityChoice> for EntityKind {
    fn from(choice: EntityChoice) -> Self {
        match choice {
            EntityChoice::User => EntityKind::User,
            EntityChoice::Card => EntityKind::Card,
            EntityChoice::Store => EntityKind::Store,
            EntityChoice::Product => EntityKind::Product,
            EntityChoice::Order => EntityKind::Order,
            EntityChoice::DateEvent => EntityKind::DateEvent,
        }
    }
}
