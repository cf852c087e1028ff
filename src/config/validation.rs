//! Configuration checks beyond hard bounds

use crate::{
    error::Result,
    executor::KnownReachable,
    models::Config,
    types::Target,
};
use std::time::Duration;

/// Configuration validator producing advisory warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run `Config::validate`, then collect warnings for settings that are legal but suspicious
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::check_targets(config));
        warnings.extend(Self::check_known_reachable(&config.known_reachable));
        warnings.extend(Self::check_timing(config));
        warnings.extend(Self::check_paths(config));

        Ok(warnings)
    }

    fn check_targets(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.target_domains.is_empty() && config.services.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "No targets configured; only platform data will be reported".to_string(),
            ));
        }

        let known = KnownReachable::new(config.known_reachable.iter());
        for domain in &config.target_domains {
            if let Ok(target) = Target::domain(domain) {
                if known.matches(&target) {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("'{}' matches the known-reachable list and will not be probed", target.host()),
                    ));
                }
            }
        }

        warnings
    }

    fn check_known_reachable(entries: &[String]) -> Vec<ValidationWarning> {
        entries
            .iter()
            .filter(|entry| !entry.contains('.'))
            .map(|entry| {
                ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Known-reachable entry '{}' matches any domain that contains it", entry),
                )
            })
            .collect()
    }

    fn check_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.https_timeout_seconds < 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "HTTPS timeout of {}s may report slow sites as timed out",
                    config.https_timeout_seconds
                ),
            ));
        }

        let worst = Self::worst_case_per_target(config);
        if worst > config.run_timeout() {
            let policy = if config.mark_abandoned { "reported as TIMEOUT" } else { "left out of the report" };
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "A fully failing target needs up to {}s but the run timeout is {}s; unfinished targets are {}",
                    worst.as_secs(),
                    config.run_timeout_seconds,
                    policy
                ),
            ));
        }

        warnings
    }

    /// Every HTTPS attempt timing out, the backoffs between them, then the HTTP fallback
    pub fn worst_case_per_target(config: &Config) -> Duration {
        let attempts = config.retry_attempts;
        config.https_timeout() * attempts
            + config.retry_backoff() * attempts.saturating_sub(1)
            + config.http_timeout()
    }

    fn check_paths(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(path) = &config.platform_report {
            if !path.exists() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Platform report {} does not exist; the report will show an error block",
                        path.display()
                    ),
                ));
            }
        }

        if config.save_report && !config.report_dir.exists() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Report directory {} will be created", config.report_dir.display()),
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow().bold(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
