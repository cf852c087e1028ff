//! Structured logging for diagnostic runs
//!
//! Log entries carry a level, the emitting component, an optional correlation
//! id and free-form structured fields. Everything is written to stderr so the
//! report on stdout stays clean.

use crate::error::{AppError, Result};
use crate::models::{Config, TargetResult};
use crate::types::{Target, Transport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Emitting component
    pub logger: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// Shared context attached to every entry of a logger
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
}

/// Logger writing structured entries to stderr
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Level and format follow the `debug` and `verbose` switches
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Logger that drops everything below `Error`
    pub fn quiet(name: &str) -> Self {
        let mut logger = Self::new(name.to_string());
        logger.set_level(LogLevel::Error);
        logger
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder for a single log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Attach the classification of a reconciled target result
    pub fn target_result(self, result: &TargetResult) -> Self {
        self.field("target", result.target().label())
            .field("status", result.status().label())
            .field("attempts", result.attempts)
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for individual probe attempts and their reconciliation
#[derive(Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PROBE".to_string(), config),
        }
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn quiet() -> Self {
        Self { logger: Logger::quiet("PROBE") }
    }

    pub async fn log_attempt(&self, target: &Target, transport: Transport, attempt: u32, status: &str) {
        self.logger.debug(&format!("{} {} attempt {}: {}", transport.scheme(), target, attempt, status))
            .field("target", target.label())
            .field("transport", transport.scheme())
            .field("attempt", attempt)
            .field("status", status)
            .log()
            .await;
    }

    pub async fn log_fallback(&self, target: &Target) {
        self.logger.info(&format!("HTTPS failed for {}, trying HTTP", target))
            .field("target", target.label())
            .log()
            .await;
    }

    pub async fn log_skipped(&self, target: &Target) {
        self.logger.debug(&format!("{} is known reachable, not probing", target))
            .field("target", target.label())
            .log()
            .await;
    }

    pub async fn log_result(&self, result: &TargetResult) {
        let level = if result.status().is_reachable() { LogLevel::Debug } else { LogLevel::Info };
        self.logger.log(level, &format!("{}: {}", result.target(), result.status().label()))
            .target_result(result)
            .log()
            .await;
    }

    pub async fn log_abandoned(&self, abandoned: usize, reason: &str) {
        self.logger.warn(&format!("{} probe(s) abandoned: {}", abandoned, reason))
            .field("abandoned", abandoned)
            .field("reason", reason)
            .log()
            .await;
    }
}

/// Logger tracking the phases of a diagnostic run
pub struct RunLogger {
    logger: Logger,
    run_id: String,
    phase_started: HashMap<String, DateTime<Utc>>,
}

impl RunLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            run_id: Uuid::new_v4().to_string(),
            phase_started: HashMap::new(),
        }
    }

    pub async fn start_phase(&mut self, phase: &str) {
        let now = Utc::now();
        self.phase_started.insert(phase.to_string(), now);
        self.logger.debug(&format!("Phase started: {}", phase))
            .correlation_id(&self.run_id)
            .field("phase", phase)
            .log()
            .await;
    }

    /// Returns the elapsed time, or None for a phase that was never started
    pub async fn end_phase(&mut self, phase: &str) -> Option<chrono::Duration> {
        let started = self.phase_started.remove(phase)?;
        let elapsed = Utc::now() - started;
        self.logger.info(&format!("Phase {} finished in {}ms", phase, elapsed.num_milliseconds()))
            .correlation_id(&self.run_id)
            .field("phase", phase)
            .field("duration_ms", elapsed.num_milliseconds())
            .log()
            .await;
        Some(elapsed)
    }

    pub async fn log_error(&self, error: &AppError, context: &str) {
        self.logger.error(&format!("{}: {}", context, error))
            .correlation_id(&self.run_id)
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_warning(&self, message: &str) {
        self.logger.warn(message)
            .correlation_id(&self.run_id)
            .log()
            .await;
    }
}

/// Creates loggers sharing one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::from_logger(self.create_logger("PROBE").await)
    }

    pub async fn create_run_logger(&self) -> RunLogger {
        RunLogger::new(self.create_logger("RUN").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProbeOutcome, ProbeStatus};
    use std::str::FromStr;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);

        let quiet = Logger::with_config("TEST".to_string(), &Config::default());
        assert!(!quiet.would_log(LogLevel::Info));
        assert!(quiet.would_log(LogLevel::Warn));
    }

    #[tokio::test]
    async fn test_session_id_management() {
        let logger = Logger::new("TEST".to_string());
        logger.set_session_id("test-session".to_string()).await;

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some("test-session"));
    }

    #[test]
    fn test_console_format_short_correlation_id() {
        let logger = Logger::new("TEST".to_string());
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "probe finished".to_string(),
            logger: "TEST".to_string(),
            correlation_id: Some("abc".to_string()),
            fields: HashMap::new(),
        };
        let output = logger.format_console(&entry);
        assert!(output.contains("probe finished"));
        assert!(output.contains("[abc]"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let logger = Logger::new("TEST".to_string());
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "Test".to_string(),
            logger: "TEST".to_string(),
            correlation_id: None,
            fields: HashMap::new(),
        };
        let json = logger.format_json(&entry);
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.message, "Test");
    }

    #[tokio::test]
    async fn test_probe_logger_calls() {
        let probe_logger = ProbeLogger::quiet();
        let target = Target::Domain("example.com".to_string());
        probe_logger.log_attempt(&target, Transport::Https, 1, "TIMEOUT").await;
        probe_logger.log_fallback(&target).await;
        probe_logger
            .log_result(&TargetResult::new(ProbeOutcome::new(target, ProbeStatus::Reachable), 1))
            .await;
        probe_logger.log_abandoned(2, "deadline").await;
    }

    #[tokio::test]
    async fn test_run_logger_phases() {
        let mut run_logger = RunLogger::new(Logger::quiet("RUN"));
        run_logger.start_phase("probing").await;
        assert!(run_logger.end_phase("probing").await.is_some());
        assert!(run_logger.end_phase("never-started").await.is_none());
    }

    #[tokio::test]
    async fn test_logger_factory_shares_session() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("TEST").await;
        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some(factory.session_id()));
    }
}
