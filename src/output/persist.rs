//! Saving reports to disk

use crate::error::{AppError, Result};
use crate::platform::ReportSink;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each report to its own timestamped file
#[derive(Debug, Clone)]
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(at: DateTime<Local>) -> String {
        format!("network_diagnostic_{}.txt", at.format("%Y-%m-%d_%H-%M-%S"))
    }

    pub fn save_at(&self, text: &str, at: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::persistence(format!("cannot create {}: {}", self.dir.display(), e))
        })?;
        let path = self.dir.join(Self::file_name(at));
        fs::write(&path, text)
            .map_err(|e| AppError::persistence(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

impl ReportSink for FileReportSink {
    fn save_report(&self, text: &str) -> Result<PathBuf> {
        self.save_at(text, Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let at = Local.with_ymd_and_hms(2026, 10, 14, 8, 3, 9).unwrap();
        assert_eq!(FileReportSink::file_name(at), "network_diagnostic_2026-10-14_08-03-09.txt");
    }

    #[test]
    fn test_save_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileReportSink::new(dir.path().join("reports"));

        let path = sink.save_report("=== NETWORK DIAGNOSTIC REPORT ===\n").unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "=== NETWORK DIAGNOSTIC REPORT ===\n");
    }

    #[test]
    fn test_unwritable_dir_is_persistence_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = FileReportSink::new(file.path().join("nested"));
        assert!(matches!(sink.save_report("x"), Err(AppError::Persistence(_))));
    }
}
