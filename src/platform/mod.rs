//! Contracts with the host platform and handling of its diagnostic text

pub mod dedup;
pub mod parser;

pub use dedup::format_platform_text;
pub use parser::{parse_platform_report, LineRule, ParseSummary, LINE_RULES};

use crate::error::{AppError, Result};
use crate::types::ConnectionType;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

/// Queries answered by the platform layer; every call may fail
#[async_trait]
pub trait PlatformSource: Send + Sync {
    /// Opaque multi-section diagnostic text
    async fn diagnostic_text(&self) -> Result<String>;

    async fn connection_type(&self) -> Result<ConnectionType>;

    async fn provider_name(&self) -> Result<String>;
}

/// Receives progress updates; may be called from any task
pub trait ProgressSink: Send + Sync {
    fn report_progress(&self, percent: u8, message: &str);
}

/// Persists a finished report
pub trait ReportSink: Send + Sync {
    fn save_report(&self, text: &str) -> Result<PathBuf>;
}

/// Platform source backed by a text file and explicit settings
#[derive(Debug, Clone, Default)]
pub struct FilePlatformSource {
    pub report_path: Option<PathBuf>,
    pub connection_type: Option<ConnectionType>,
    pub provider: Option<String>,
}

impl FilePlatformSource {
    pub fn new(report_path: Option<PathBuf>) -> Self {
        Self {
            report_path,
            ..Default::default()
        }
    }

    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

#[async_trait]
impl PlatformSource for FilePlatformSource {
    async fn diagnostic_text(&self) -> Result<String> {
        let path = self
            .report_path
            .as_ref()
            .ok_or_else(|| AppError::platform_unavailable("no platform report configured"))?;

        tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::platform_unavailable(format!("cannot read {}: {}", path.display(), e))
        })
    }

    async fn connection_type(&self) -> Result<ConnectionType> {
        self.connection_type
            .ok_or_else(|| AppError::platform_unavailable("connection type not available"))
    }

    async fn provider_name(&self) -> Result<String> {
        self.provider
            .clone()
            .ok_or_else(|| AppError::platform_unavailable("provider name not available"))
    }
}

/// Fixed answers, for embedding callers that already hold the data
#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    pub text: Option<String>,
    pub connection_type: Option<ConnectionType>,
    pub provider: Option<String>,
}

impl StaticPlatform {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PlatformSource for StaticPlatform {
    async fn diagnostic_text(&self) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| AppError::platform_unavailable("native diagnostic module not loaded"))
    }

    async fn connection_type(&self) -> Result<ConnectionType> {
        self.connection_type
            .ok_or_else(|| AppError::platform_unavailable("connection type not available"))
    }

    async fn provider_name(&self) -> Result<String> {
        self.provider
            .clone()
            .ok_or_else(|| AppError::platform_unavailable("provider name not available"))
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report_progress(&self, _percent: u8, _message: &str) {}
}

/// Keeps every progress update in memory
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<(u8, String)>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<(u8, String)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events().into_iter().map(|(percent, _)| percent).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report_progress(&self, percent: u8, message: &str) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((percent, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_report() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[TYPE] Wi-Fi").unwrap();

        let source = FilePlatformSource::new(Some(file.path().to_path_buf()))
            .with_provider("Rostelecom");
        assert_eq!(source.diagnostic_text().await.unwrap().trim(), "[TYPE] Wi-Fi");
        assert_eq!(source.provider_name().await.unwrap(), "Rostelecom");
        assert!(source.connection_type().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_report_is_platform_unavailable() {
        let source = FilePlatformSource::new(Some(PathBuf::from("/nonexistent/diag.txt")));
        assert!(matches!(
            source.diagnostic_text().await,
            Err(AppError::PlatformUnavailable(_))
        ));
        assert!(FilePlatformSource::default().diagnostic_text().await.is_err());
    }

    #[test]
    fn test_recording_progress() {
        let sink = RecordingProgress::default();
        sink.report_progress(10, "connection");
        sink.report_progress(30, "platform");
        assert_eq!(sink.percents(), vec![10, 30]);
        assert_eq!(sink.events()[1].1, "platform");
    }
}
