//! History subcommand implementation.

use crate::error::CliResult;
use crate::storage::ReportStore;
use clap::Parser;
use std::io::{self, Write};

/// View and manage saved discovery runs.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Delete all saved runs
    #[arg(long)]
    pub clear: bool,

    /// Delete runs older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,
}

impl HistoryCommand {
    /// Execute the history command against the default store.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = ReportStore::new()?;
        self.run(&store, &mut io::stdout().lock(), quiet)
    }

    /// List, prune, or clear the runs in `store`, writing to `out`.
    pub fn run(&self, store: &ReportStore, out: &mut impl Write, quiet: bool) -> CliResult<()> {
        if self.clear {
            let removed = store.clear()?;
            if !quiet {
                writeln!(out, "Removed {} saved runs.", removed)?;
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let removed = store.prune(chrono::Duration::days(i64::from(days)))?;
            if !quiet {
                writeln!(out, "Removed {} runs older than {} days.", removed, days)?;
            }
            return Ok(());
        }

        let reports = store.list_recent(self.count)?;
        if reports.is_empty() {
            if !quiet {
                writeln!(out, "No saved runs.")?;
            }
            return Ok(());
        }

        for report in reports {
            writeln!(
                out,
                "{}  {}  {}",
                report.id.short(),
                report.started_at.format("%Y-%m-%d %H:%M"),
                report.summary()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryReport;
    use crate::types::RunId;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn saved_run(store: &ReportStore, age_days: i64) -> RunId {
        let report = DiscoveryReport::build(
            RunId::new(),
            Utc::now() - Duration::days(age_days),
            Vec::new(),
            Vec::new(),
            100,
        );
        store.save(&report).unwrap();
        report.id
    }

    fn history(args: &[&str]) -> HistoryCommand {
        HistoryCommand::try_parse_from(std::iter::once("history").chain(args.iter().copied()))
            .unwrap()
    }

    fn output(cmd: &HistoryCommand, store: &ReportStore) -> String {
        let mut out = Vec::new();
        cmd.run(store, &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_history() {
        let dir = tempdir().unwrap();
        let store = ReportStore::with_dir(dir.path()).unwrap();

        assert_eq!(output(&history(&[]), &store), "No saved runs.\n");
    }

    #[test]
    fn test_lists_most_recent_runs() {
        let dir = tempdir().unwrap();
        let store = ReportStore::with_dir(dir.path()).unwrap();
        let older = saved_run(&store, 2);
        let newest = saved_run(&store, 0);

        let listing = output(&history(&["-n", "1"]), &store);
        assert_eq!(listing.lines().count(), 1);
        assert!(listing.starts_with(&newest.short()));
        assert!(!listing.contains(&older.short()));
    }

    #[test]
    fn test_prune_removes_old_runs() {
        let dir = tempdir().unwrap();
        let store = ReportStore::with_dir(dir.path()).unwrap();
        saved_run(&store, 30);
        let recent = saved_run(&store, 1);

        let message = output(&history(&["--prune", "7"]), &store);
        assert_eq!(message, "Removed 1 runs older than 7 days.\n");
        assert_eq!(store.list_ids().unwrap(), vec![recent]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempdir().unwrap();
        let store = ReportStore::with_dir(dir.path()).unwrap();
        saved_run(&store, 0);
        saved_run(&store, 3);

        let mut out = Vec::new();
        history(&["--clear"]).run(&store, &mut out, true).unwrap();

        assert!(out.is_empty());
        assert!(store.list().unwrap().is_empty());
    }
}
