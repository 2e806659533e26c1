//! Config subcommand implementation.

use crate::config::AppSettings;
use crate::error::CliResult;
use clap::Parser;
use std::path::Path;

/// Show or write the effective settings.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Write the effective settings (file values plus overrides) to the
    /// settings file
    #[arg(long)]
    pub init: bool,
}

impl ConfigCommand {
    /// Execute the config command. `path` is the `--config` override, if any.
    pub fn execute(&self, settings: &AppSettings, path: Option<&Path>, quiet: bool) -> CliResult<()> {
        if !self.init {
            println!("{}", serde_json::to_string_pretty(settings)?);
            return Ok(());
        }

        match path {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
        if !quiet {
            println!("Settings written.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_effective_settings() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("settings.json");
        let settings = AppSettings {
            backend_url: "http://fleet:9000".to_string(),
            max_workers: 8,
            ..AppSettings::default()
        };

        let cmd = ConfigCommand::try_parse_from(["config", "--init"]).unwrap();
        cmd.execute(&settings, Some(&file), true).unwrap();

        assert_eq!(AppSettings::load_from(&file).unwrap(), settings);
    }

    #[test]
    fn test_show_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("settings.json");

        let cmd = ConfigCommand::try_parse_from(["config"]).unwrap();
        cmd.execute(&AppSettings::default(), Some(&file), true).unwrap();

        assert!(!file.exists());
    }
}
