//! Configuration data model and validation

use crate::defaults;
use crate::types::{AppError, ConnectionType, Result, Target, TargetSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Domains to probe
    #[serde(default = "default_target_domains")]
    pub target_domains: Vec<String>,

    /// Named protocol endpoints (`name@host:port`) to probe
    #[serde(default)]
    pub services: Vec<String>,

    /// Domains never expected to be blocked; probing is skipped for them
    #[serde(default = "default_known_reachable")]
    pub known_reachable: Vec<String>,

    /// HTTPS attempts per target before falling back to HTTP
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between HTTPS attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Timeout of one HTTPS (or TCP) attempt
    #[serde(default = "default_https_timeout_secs")]
    pub https_timeout_seconds: u64,

    /// Timeout of the single HTTP fallback attempt
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_seconds: u64,

    /// Ceiling for the whole probing phase
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_seconds: u64,

    /// Maximum probes in flight
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Report targets abandoned at the run deadline as TIMEOUT instead of omitting them
    #[serde(default)]
    pub mark_abandoned: bool,

    /// File holding the platform diagnostic text
    #[serde(default)]
    pub platform_report: Option<PathBuf>,

    /// Connection type reported by the platform (overrides detection)
    #[serde(default)]
    pub connection_type: Option<String>,

    /// Provider name reported by the platform
    #[serde(default)]
    pub provider_name: Option<String>,

    /// Directory saved reports are written to
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Persist the report after the run
    #[serde(default)]
    pub save_report: bool,

    /// Print the snapshot as JSON instead of the text report
    #[serde(default)]
    pub json_output: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_domains: default_target_domains(),
            services: Vec::new(),
            known_reachable: default_known_reachable(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            https_timeout_seconds: default_https_timeout_secs(),
            http_timeout_seconds: default_http_timeout_secs(),
            run_timeout_seconds: default_run_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            mark_abandoned: false,
            platform_report: None,
            connection_type: None,
            provider_name: None,
            report_dir: default_report_dir(),
            save_report: false,
            json_output: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn https_timeout(&self) -> Duration {
        Duration::from_secs(self.https_timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Build the ordered target set from configured domains and services
    pub fn target_set(&self) -> Result<TargetSet> {
        let mut set = TargetSet::new();
        for domain in &self.target_domains {
            set.add(domain)?;
        }
        for service in &self.services {
            set.add_service(service)?;
        }
        Ok(set)
    }

    /// Validate the configuration and return the first error
    pub fn validate(&self) -> Result<()> {
        for domain in &self.target_domains {
            Target::domain(domain)?;
        }

        for service in &self.services {
            Target::service(service)?;
        }

        for entry in &self.known_reachable {
            if entry.trim().is_empty() {
                return Err(AppError::config("Known-reachable entries cannot be empty"));
            }
        }

        if self.retry_attempts == 0 {
            return Err(AppError::config("Retry attempts must be greater than 0"));
        }

        if self.retry_attempts > 10 {
            return Err(AppError::config("Retry attempts cannot exceed 10"));
        }

        if self.retry_backoff_ms > 10_000 {
            return Err(AppError::config("Retry backoff cannot exceed 10000 ms"));
        }

        if self.https_timeout_seconds == 0 || self.https_timeout_seconds > 60 {
            return Err(AppError::config("HTTPS timeout must be between 1 and 60 seconds"));
        }

        if self.http_timeout_seconds == 0 || self.http_timeout_seconds > 60 {
            return Err(AppError::config("HTTP timeout must be between 1 and 60 seconds"));
        }

        if self.run_timeout_seconds == 0 || self.run_timeout_seconds > 600 {
            return Err(AppError::config("Run timeout must be between 1 and 600 seconds"));
        }

        if self.max_concurrency == 0 || self.max_concurrency > 256 {
            return Err(AppError::config("Concurrency must be between 1 and 256"));
        }

        if let Some(ref connection_type) = self.connection_type {
            connection_type.parse::<ConnectionType>()
                .map_err(|e| AppError::config(format!("Invalid connection type: {}", e)))?;
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(domains) = std::env::var("TARGET_DOMAINS") {
            self.target_domains = split_list(&domains);
        }

        if let Ok(services) = std::env::var("SERVICES") {
            self.services = split_list(&services);
        }

        if let Ok(known) = std::env::var("KNOWN_REACHABLE") {
            self.known_reachable = split_list(&known);
        }

        if let Ok(attempts) = std::env::var("RETRY_ATTEMPTS") {
            self.retry_attempts = attempts.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RETRY_ATTEMPTS value: {}", e)))?;
        }

        if let Ok(backoff) = std::env::var("RETRY_BACKOFF_MS") {
            self.retry_backoff_ms = backoff.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RETRY_BACKOFF_MS value: {}", e)))?;
        }

        if let Ok(timeout) = std::env::var("HTTPS_TIMEOUT_SECONDS") {
            self.https_timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTPS_TIMEOUT_SECONDS value: {}", e)))?;
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECONDS") {
            self.http_timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTP_TIMEOUT_SECONDS value: {}", e)))?;
        }

        if let Ok(timeout) = std::env::var("RUN_TIMEOUT_SECONDS") {
            self.run_timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_TIMEOUT_SECONDS value: {}", e)))?;
        }

        if let Ok(concurrency) = std::env::var("MAX_CONCURRENCY") {
            self.max_concurrency = concurrency.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MAX_CONCURRENCY value: {}", e)))?;
        }

        if let Ok(mark) = std::env::var("MARK_ABANDONED") {
            self.mark_abandoned = mark.trim().to_lowercase().parse()
                .map_err(|e| AppError::config(format!("Invalid MARK_ABANDONED value: {}", e)))?;
        }

        if let Ok(path) = std::env::var("PLATFORM_REPORT") {
            if !path.trim().is_empty() {
                self.platform_report = Some(PathBuf::from(path.trim()));
            }
        }

        if let Ok(connection_type) = std::env::var("CONNECTION_TYPE") {
            if !connection_type.trim().is_empty() {
                self.connection_type = Some(connection_type.trim().to_string());
            }
        }

        if let Ok(provider) = std::env::var("PROVIDER_NAME") {
            if !provider.trim().is_empty() {
                self.provider_name = Some(provider.trim().to_string());
            }
        }

        if let Ok(dir) = std::env::var("REPORT_DIR") {
            if !dir.trim().is_empty() {
                self.report_dir = PathBuf::from(dir.trim());
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().to_lowercase().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value: {}", e)))?;
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default value functions for serde
fn default_target_domains() -> Vec<String> {
    defaults::DEFAULT_TARGET_DOMAINS.iter().map(|s| s.to_string()).collect()
}

fn default_known_reachable() -> Vec<String> {
    defaults::DEFAULT_KNOWN_REACHABLE.iter().map(|s| s.to_string()).collect()
}

fn default_retry_attempts() -> u32 {
    defaults::DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    defaults::DEFAULT_RETRY_BACKOFF.as_millis() as u64
}

fn default_https_timeout_secs() -> u64 {
    defaults::DEFAULT_HTTPS_TIMEOUT.as_secs()
}

fn default_http_timeout_secs() -> u64 {
    defaults::DEFAULT_HTTP_TIMEOUT.as_secs()
}

fn default_run_timeout_secs() -> u64 {
    defaults::DEFAULT_RUN_TIMEOUT.as_secs()
}

fn default_max_concurrency() -> usize {
    defaults::default_concurrency()
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
        assert_eq!(config.run_timeout(), Duration::from_secs(30));
        assert_eq!(config.target_domains, vec!["vk.com", "rutracker.org", "github.com"]);
    }

    #[test]
    fn test_invalid_domain_rejected() {
        let config = Config {
            target_domains: vec!["intranet".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_numeric_bounds() {
        let zero_attempts = Config { retry_attempts: 0, ..Default::default() };
        assert!(zero_attempts.validate().is_err());

        let long_timeout = Config { https_timeout_seconds: 61, ..Default::default() };
        assert!(long_timeout.validate().is_err());

        let no_workers = Config { max_concurrency: 0, ..Default::default() };
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn test_bad_connection_type_rejected() {
        let config = Config {
            connection_type: Some("satellite".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_target_set_includes_services() {
        let config = Config {
            target_domains: vec!["github.com".to_string(), "GITHUB.com".to_string()],
            services: vec!["openvpn@vpn.example.com:1194".to_string()],
            ..Default::default()
        };
        let set = config.target_set().unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a.com, ,b.org,"), vec!["a.com", "b.org"]);
        assert!(split_list("").is_empty());
    }
}
