//! Terminal coloring of rendered reports

use super::report::REPORT_TITLE;
use colored::*;

/// Colors applied to report lines
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// How a report line should be highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTone {
    Header,
    Success,
    Warning,
    Error,
    Muted,
    Plain,
}

impl LineTone {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed == REPORT_TITLE || (trimmed.starts_with("-----") && trimmed.ends_with("-----")) {
            Self::Header
        } else if trimmed.starts_with("[ISSUE]") || trimmed.contains("BLOCKED") || trimmed.contains("DETECTED") {
            Self::Error
        } else if trimmed.contains("TIMEOUT") || trimmed.contains("ERROR") || trimmed.contains("HTTP only") {
            Self::Warning
        } else if trimmed.contains("REACHABLE") || trimmed.starts_with("No problems detected") {
            Self::Success
        } else if trimmed.starts_with("Date:") || trimmed.starts_with("Version:") {
            Self::Muted
        } else {
            Self::Plain
        }
    }
}

/// Colorize a plain report line by line
pub fn colorize_report(report: &str, scheme: &ColorScheme) -> String {
    report
        .lines()
        .map(|line| match LineTone::classify(line) {
            LineTone::Header => line.color(scheme.header).bold().to_string(),
            LineTone::Success => line.color(scheme.success).to_string(),
            LineTone::Warning => line.color(scheme.warning).to_string(),
            LineTone::Error => line.color(scheme.error).to_string(),
            LineTone::Muted => line.color(scheme.muted).to_string(),
            LineTone::Plain => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
