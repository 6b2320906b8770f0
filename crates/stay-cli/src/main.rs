use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stay_cli::commands::{import, presence, report, travelers};
use stay_cli::rules::load_rule_table;
use stay_cli::{Cli, Commands, Config};
use stay_core::{DateRange, ResidencyEngine};

/// Load config and open the database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(stay_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = stay_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Build the engine from the configured rule table.
///
/// A rule table without its Default entry aborts here, before any command
/// runs against a partially-usable engine.
fn build_engine(config: &Config) -> Result<ResidencyEngine> {
    let table = load_rule_table(config.rules_path.as_deref())?;
    Ok(ResidencyEngine::new(table))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Import { traveler }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let inserted = import::run(&mut db, traveler.as_deref())?;
            println!("Imported {inserted} legs.");
        }
        Some(Commands::Report {
            traveler,
            from,
            to,
            starting_country,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let engine = build_engine(&config)?;
            let range = from.zip(*to).map(|(start, end)| DateRange::new(start, end));
            report::run(
                &db,
                &engine,
                traveler.as_deref(),
                starting_country.as_deref(),
                range,
                *json,
            )?;
        }
        Some(Commands::Presence {
            traveler,
            from,
            to,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let engine = build_engine(&config)?;
            let range = from.zip(*to).map(|(start, end)| DateRange::new(start, end));
            presence::run(&db, &engine, traveler.as_deref(), range, *json)?;
        }
        Some(Commands::Travelers) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            travelers::run(&db)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
