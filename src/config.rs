// ⚙️ Configuration - command line with environment fallbacks

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CSV_PATH: &str = "applications.csv";
pub const DEFAULT_DB_PATH: &str = "db.sqlite3";

/// Sync a college-applications CSV export into the records database
#[derive(Debug, Clone, Parser)]
#[command(name = "college-applications", version, about)]
pub struct Config {
    /// CSV export to read
    #[arg(long = "csv", env = "COLLEGE_APPS_CSV", default_value = DEFAULT_CSV_PATH, global = true)]
    pub csv_path: PathBuf,

    /// SQLite database file (created if missing)
    #[arg(long = "database", env = "COLLEGE_APPS_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db_path: PathBuf,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "college_applications=trace")
    #[arg(long, env = "COLLEGE_APPS_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Reconcile the database against the CSV (default)
    Sync {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print per-column statistics of the CSV without touching the database
    Profile,
}

impl Config {
    /// No subcommand means a plain sync
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Sync { json: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["college-applications"]).unwrap();
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(matches!(config.command(), Command::Sync { json: false }));
    }

    #[test]
    fn test_flags_and_subcommands() {
        let config = Config::try_parse_from([
            "college-applications",
            "profile",
            "--csv",
            "exports/fall.csv",
        ])
        .unwrap();
        assert_eq!(config.csv_path, PathBuf::from("exports/fall.csv"));
        assert!(matches!(config.command(), Command::Profile));

        let config =
            Config::try_parse_from(["college-applications", "--database", "x.db", "sync", "--json"])
                .unwrap();
        assert_eq!(config.db_path, PathBuf::from("x.db"));
        assert!(matches!(config.command(), Command::Sync { json: true }));
    }
}
