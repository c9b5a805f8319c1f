use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use college_applications::config::{Command, Config};
use college_applications::{
    load_table, logging, open_database, profile_table, setup_database, sync_file, IngestError,
};

/// Exit status when the source CSV does not exist
const EXIT_MISSING_SOURCE: u8 = 1;
/// Exit status for every other failure
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let config = Config::parse();
    logging::init(&config.log_level);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<IngestError>() {
            Some(IngestError::MissingSourceFile(path)) => {
                eprintln!("Error: {} file not found", path.display());
                ExitCode::from(EXIT_MISSING_SOURCE)
            }
            _ => {
                error!(error = %e, "Run failed");
                eprintln!("Error: {:#}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}

fn run(config: &Config) -> Result<()> {
    match config.command() {
        Command::Sync { json } => run_sync(config, json),
        Command::Profile => run_profile(config),
    }
}

fn run_sync(config: &Config, json: bool) -> Result<()> {
    // Schema first, as its own step
    let mut conn = open_database(&config.db_path)?;
    setup_database(&conn)?;

    let report = sync_file(&mut conn, &config.csv_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("✓ Rows read: {}", report.preprocess.rows_read);
        println!("✓ Duplicates dropped: {}", report.preprocess.duplicates_dropped);
        println!("✓ Blank student numbers dropped: {}", report.preprocess.blank_student_dropped);
        println!("✓ Applications created: {}", report.counts.applications_created);
        println!("✓ Applications updated: {}", report.counts.applications_updated);
        println!("✓ Applications deleted: {}", report.counts.applications_deleted);
    }

    Ok(())
}

fn run_profile(config: &Config) -> Result<()> {
    let table = load_table(&config.csv_path)?;
    let profile = profile_table(&table);
    let output = serde_json::to_string_pretty(&profile).context("Failed to render profile")?;
    println!("{}", output);
    Ok(())
}
