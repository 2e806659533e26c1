//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `printsweep discover <range>...` - Discover printers in IP ranges
//! - `printsweep register <run-id>` - Register devices from a saved run
//! - `printsweep history` - View saved discovery runs
//! - `printsweep config` - Show or write settings

mod config;
mod discover;
mod history;
mod register;

pub use config::ConfigCommand;
pub use discover::DiscoverCommand;
pub use history::HistoryCommand;
pub use register::RegisterCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// printsweep - Find printers on your network and add them to inventory.
///
/// Ranges are swept for responsive hosts first, then the responsive hosts are
/// probed for printers through the fleet backend.
#[derive(Parser, Debug)]
#[command(name = "printsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Two-phase printer discovery for network fleets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the fleet backend (overrides configuration)
    #[arg(long, global = true, env = "PRINTSWEEP_BACKEND", value_name = "URL")]
    pub backend: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover printers in one or more IP ranges
    #[command(alias = "d")]
    Discover(DiscoverCommand),

    /// Register devices found by a saved discovery run
    #[command(alias = "r")]
    Register(RegisterCommand),

    /// View saved discovery runs
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Show or write settings
    #[command(alias = "c")]
    Config(ConfigCommand),
}

impl Cli {
    /// Load settings from `--config` or the default location, then apply
    /// global overrides.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let mut settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        if let Some(url) = &self.backend {
            settings.backend_url = url.clone();
        }
        Ok(settings)
    }

    /// Run the selected subcommand.
    pub async fn execute(&self) -> CliResult<()> {
        let settings = self.settings()?;
        match &self.command {
            Commands::Discover(cmd) => cmd.execute(&settings, self.quiet).await,
            Commands::Register(cmd) => cmd.execute(&settings, self.quiet).await,
            Commands::History(cmd) => cmd.execute(self.quiet),
            Commands::Config(cmd) => cmd.execute(&settings, self.config.as_deref(), self.quiet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover() {
        let cli = Cli::try_parse_from([
            "printsweep",
            "discover",
            "10.0.0.1-10.0.0.50",
            "192.168.4.0/24",
            "--medical",
            "-w",
            "20",
        ])
        .unwrap();

        match cli.command {
            Commands::Discover(cmd) => {
                assert_eq!(cmd.ranges.len(), 2);
                assert!(cmd.medical);
                assert_eq!(cmd.workers, Some(20));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_register_needs_selection() {
        assert!(Cli::try_parse_from(["printsweep", "register", "abcd1234"]).is_err());
        assert!(Cli::try_parse_from(["printsweep", "register", "abcd1234", "--all"]).is_ok());
        assert!(Cli::try_parse_from([
            "printsweep",
            "register",
            "abcd1234",
            "--ip",
            "10.0.0.4",
            "--ip",
            "10.0.0.5"
        ])
        .is_ok());
    }

    #[test]
    fn test_backend_override() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        std::fs::write(&file, r#"{"backend_url": "http://from-file:1"}"#).unwrap();

        let cli = Cli::try_parse_from([
            "printsweep",
            "--config",
            file.to_str().unwrap(),
            "--backend",
            "http://from-flag:2",
            "history",
        ])
        .unwrap();

        assert_eq!(cli.settings().unwrap().backend_url, "http://from-flag:2");
    }
}
