use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use punch_cli::commands::{adjust, events, projects, report, status, toggle, track};
use punch_cli::{Cli, Commands, Config};
use punch_core::ReportPeriod;

/// Load config and open database, ensuring the parent directory exists.
///
/// A missing database file is created and seeded with default projects.
fn open_database(config_path: Option<&Path>) -> Result<(punch_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = punch_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
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

    match cli.command {
        Some(Commands::Status) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            status::run(&mut std::io::stdout(), &db, Local::now().naive_local())?;
        }
        Some(Commands::Toggle { project }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            toggle::run(db, &project)?;
        }
        Some(Commands::Stop) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            toggle::stop(db)?;
        }
        Some(Commands::Projects { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            projects::run(&db, action)?;
        }
        Some(Commands::Adjust {
            project,
            minutes,
            description,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            adjust::run(&db, &project, minutes, description, Local::now().naive_local())?;
        }
        Some(Commands::Events { limit }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            events::run(&mut std::io::stdout(), &db, limit)?;
        }
        Some(Commands::Report {
            today: _,
            week,
            month,
            last7,
            last30,
            json,
            csv,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let period = if week {
                ReportPeriod::ThisWeek
            } else if month {
                ReportPeriod::ThisMonth
            } else if last7 {
                ReportPeriod::Last7Days
            } else if last30 {
                ReportPeriod::Last30Days
            } else {
                ReportPeriod::Today
            };
            report::run(&db, &config, period, json, csv, Local::now().naive_local())?;
        }
        Some(Commands::Track { idle_timeout }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let minutes = idle_timeout.unwrap_or(config.idle_timeout_minutes);
            track::run(db, Duration::from_secs(minutes * 60))?;
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
