//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `student_records` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use student_records::config::{Cli, Command, CommonArgs, ExportArgs, ImportArgs, SeedArgs};
use student_records::initialization::init_logger_with;
use student_records::store::{Client, Collection};
use student_records::{
    add_documents, build_generator, export_json, import_json, run_walkthrough, Config,
    ExportOptions,
};

async fn open_collection(common: &CommonArgs) -> Result<Collection> {
    let client = Client::connect(&common.db_url)
        .await
        .with_context(|| format!("Failed to open document store at {}", common.db_url))?;
    Ok(client.database(&common.database).collection(&common.collection))
}

async fn seed(args: SeedArgs) -> Result<()> {
    let collection = open_collection(&args.common).await?;
    let mut generator = build_generator(args.rng_seed);
    let inserted = add_documents(&collection, &mut generator, args.count).await?;
    println!("Inserted {} documents into {}", inserted, collection.namespace());
    Ok(())
}

async fn export(args: ExportArgs) -> Result<()> {
    let collection = open_collection(&args.common).await?;
    let opts = ExportOptions {
        output: args.output,
        truncate: args.truncate,
    };
    let count = export_json(&collection, &opts).await?;
    println!(
        "Exported {} document{} to {}",
        count,
        if count == 1 { "" } else { "s" },
        opts.output.display()
    );
    Ok(())
}

async fn import(args: ImportArgs) -> Result<()> {
    let collection = open_collection(&args.common).await?;
    let count = import_json(&collection, &args.input).await?;
    println!(
        "Imported {} document{} into {}",
        count,
        if count == 1 { "" } else { "s" },
        collection.namespace()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load STUDENT_RECORDS_DB_URL from .env, in the current directory or next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    let common = cli.command.common();
    init_logger_with(common.log_level.clone().into(), common.log_format.clone())
        .context("Failed to initialize logger")?;

    let outcome = match cli.command {
        Command::Run(args) => {
            let config = Config::from(args);
            run_walkthrough(config).await.map(|report| {
                println!(
                    "✅ Walkthrough complete: {} exported, {} re-imported, {} emails recomputed",
                    report.exported, report.imported, report.emails_recomputed
                );
            })
        }
        Command::Seed(args) => seed(args).await,
        Command::Export(args) => export(args).await,
        Command::Import(args) => import(args).await,
    };

    if let Err(e) = outcome {
        eprintln!("student_records error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
