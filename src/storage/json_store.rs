//! JSON-based discovery report storage.
//!
//! Stores each report as a separate JSON file named by its run id. Supports
//! listing, prefix lookup, and pruning.

use crate::config::Paths;
use crate::discovery::DiscoveryReport;
use crate::error::{StorageError, StorageResult};
use crate::types::RunId;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON file-based report storage.
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    /// Open the store in the default data directory.
    pub fn new() -> StorageResult<Self> {
        let paths = Paths::get().map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        Self::with_dir(paths.reports_dir())
    }

    /// Open a store rooted at `dir`, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let reports_dir = dir.into();
        fs::create_dir_all(&reports_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?;

        Ok(Self { reports_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Save a report.
    pub fn save(&self, report: &DiscoveryReport) -> StorageResult<()> {
        let file = self.report_file(&report.id);
        let content = serde_json::to_string_pretty(report)?;

        fs::write(&file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Load a report by ID.
    pub fn load(&self, id: &RunId) -> StorageResult<DiscoveryReport> {
        let file = self.report_file(id);

        if !file.exists() {
            return Err(StorageError::ReportNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Find a report by full id or short id prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> StorageResult<DiscoveryReport> {
        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();

        match matches.len() {
            0 => Err(StorageError::ReportNotFound(prefix.to_string())),
            1 => self.load(&matches[0]),
            n => Err(StorageError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: n,
            }),
        }
    }

    /// List all report IDs.
    pub fn list_ids(&self) -> StorageResult<Vec<RunId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.reports_dir)
            .map_err(|e| StorageError::DirectoryError(e.to_string()))?
        {
            let entry = entry.map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<RunId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// All readable reports, most recent first. Unreadable files are skipped.
    pub fn list(&self) -> StorageResult<Vec<DiscoveryReport>> {
        let mut reports: Vec<DiscoveryReport> = self
            .list_ids()?
            .iter()
            .filter_map(|id| self.load(id).ok())
            .collect();

        reports.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(reports)
    }

    /// The `count` most recent reports.
    pub fn list_recent(&self, count: usize) -> StorageResult<Vec<DiscoveryReport>> {
        let mut reports = self.list()?;
        reports.truncate(count);
        Ok(reports)
    }

    /// Delete a report.
    pub fn delete(&self, id: &RunId) -> StorageResult<()> {
        let file = self.report_file(id);

        if !file.exists() {
            return Err(StorageError::ReportNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Delete reports older than `max_age`. Returns how many were removed.
    pub fn prune(&self, max_age: chrono::Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - max_age;
        let mut deleted = 0;

        for report in self.list()? {
            if report.started_at < cutoff {
                self.delete(&report.id)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Delete every report. Returns how many were removed.
    pub fn clear(&self) -> StorageResult<usize> {
        let ids = self.list_ids()?;
        for id in &ids {
            self.delete(id)?;
        }
        Ok(ids.len())
    }

    fn report_file(&self, id: &RunId) -> PathBuf {
        self.reports_dir.join(format!("{}.json", id))
    }
}
