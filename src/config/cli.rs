//! Command-line interface definition.
//!
//! # Examples
//!
//! ```bash
//! # Full walkthrough against the default store (seeds an empty collection)
//! student_records run
//!
//! # Fresh batch of 250 reproducible records, then the walkthrough
//! student_records run --seed --batch-size 250 --rng-seed 7
//!
//! # Rename departments through the unset-then-set path
//! student_records run --rename-strategy unset-then-set
//!
//! # Dump the collection without truncating it
//! student_records export --output backup.json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::constants::{
    CONNECTION_STRING_ENV, DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_CONNECTION_STRING,
    DEFAULT_DATABASE, DEFAULT_EMAIL_DOMAIN, DEFAULT_EXPORT_PATH, DEFAULT_SPOTLIGHT_NAME,
};
use crate::config::types::{Config, LogFormat, LogLevel, RenameStrategy};

#[derive(Debug, Parser)]
#[command(
    name = "student_records",
    about = "Generates synthetic student records and walks through document-store operations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full query/update/aggregate/export walkthrough
    Run(RunArgs),
    /// Generate records and insert them into the collection
    Seed(SeedArgs),
    /// Write the collection to a JSON file
    Export(ExportArgs),
    /// Insert the documents of a JSON file into the collection
    Import(ImportArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Document store connection string (SQLite URL)
    #[arg(long, env = CONNECTION_STRING_ENV, default_value = DEFAULT_CONNECTION_STRING)]
    pub db_url: String,

    /// Database name
    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Collection name
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Add a fresh batch even if the collection already has documents
    #[arg(long)]
    pub seed: bool,

    /// Number of records generated when seeding
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seed for the record generator (random if omitted)
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// JSON file used by the export/import round-trip
    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    pub export_path: PathBuf,

    /// Domain of recomputed email addresses
    #[arg(long, default_value = DEFAULT_EMAIL_DOMAIN)]
    pub email_domain: String,

    /// First name whose department gets reassigned
    #[arg(long, default_value = DEFAULT_SPOTLIGHT_NAME)]
    pub spotlight_name: String,

    /// How the department rename is performed
    #[arg(long, value_enum, default_value_t = RenameStrategy::Direct)]
    pub rename_strategy: RenameStrategy,
}

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of records to generate
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub count: usize,

    /// Seed for the record generator (random if omitted)
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output file
    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    pub output: PathBuf,

    /// Empty the collection once the file is written
    #[arg(long)]
    pub truncate: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Input file (JSON array of documents)
    #[arg(long, default_value = DEFAULT_EXPORT_PATH)]
    pub input: PathBuf,
}

impl From<RunArgs> for Config {
    fn from(args: RunArgs) -> Self {
        Config {
            connection_string: args.common.db_url,
            database: args.common.database,
            collection: args.common.collection,
            log_level: args.common.log_level,
            log_format: args.common.log_format,
            seed: args.seed,
            batch_size: args.batch_size,
            rng_seed: args.rng_seed,
            export_path: args.export_path,
            email_domain: args.email_domain,
            spotlight_name: args.spotlight_name,
            rename_strategy: args.rename_strategy,
        }
    }
}

impl Command {
    /// Options shared by every subcommand.
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Run(args) => &args.common,
            Command::Seed(args) => &args.common,
            Command::Export(args) => &args.common,
            Command::Import(args) => &args.common,
        }
    }
}
