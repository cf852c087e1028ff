//! Formatters turning a finished run into console output

use super::colored::{colorize_report, ColorScheme};
use crate::app::DiagnosticRun;
use crate::error::{AppError, Result};
use colored::Colorize;

/// Output of one finished run
pub trait OutputFormatter {
    fn format_run(&self, run: &DiagnosticRun) -> Result<String>;

    fn format_saved(&self, path: &std::path::Path) -> String {
        format!("Report saved to {}", path.display())
    }
}

/// The report text unchanged
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn format_run(&self, run: &DiagnosticRun) -> Result<String> {
        Ok(run.report.clone())
    }
}

/// The report text with highlighted lines
pub struct ColoredFormatter {
    scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(scheme: ColorScheme) -> Self {
        Self { scheme }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_run(&self, run: &DiagnosticRun) -> Result<String> {
        Ok(colorize_report(&run.report, &self.scheme))
    }

    fn format_saved(&self, path: &std::path::Path) -> String {
        format!("{} {}", "Report saved to".green(), path.display())
    }
}

/// Snapshot and conclusion as pretty-printed JSON
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_run(&self, run: &DiagnosticRun) -> Result<String> {
        serde_json::to_string_pretty(run)
            .map_err(|e| AppError::internal(format!("Failed to serialize run: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::conclude;
    use crate::models::DiagnosticSnapshot;
    use chrono::Local;

    fn run() -> DiagnosticRun {
        let snapshot = DiagnosticSnapshot::new();
        let conclusion = conclude(&snapshot);
        DiagnosticRun {
            snapshot,
            conclusion,
            report: "=== NETWORK DIAGNOSTIC REPORT ===\n".to_string(),
            notes: Vec::new(),
            cancelled: false,
            started_at: Local::now(),
            finished_at: Local::now(),
        }
    }

    #[test]
    fn test_plain_formatter_returns_report() {
        assert_eq!(PlainFormatter.format_run(&run()).unwrap(), "=== NETWORK DIAGNOSTIC REPORT ===\n");
    }

    #[test]
    fn test_json_formatter_has_snapshot_and_conclusion() {
        let json = JsonFormatter.format_run(&run()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("snapshot").is_some());
        assert!(value["conclusion"]["healthy"].is_string());
    }
}
