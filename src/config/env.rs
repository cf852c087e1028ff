//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::{ConnectionType, Target};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the working directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file; a missing file is not an error
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Autopsy Configuration
#
# Values here are defaults; command-line arguments override them.

# Domains to probe (comma-separated)
# TARGET_DOMAINS=vk.com,rutracker.org,github.com

# Protocol endpoints to probe (name@host:port, comma-separated)
# SERVICES=wireguard@vpn.example.org:51820

# Domains reported reachable without probing (substring match)
# KNOWN_REACHABLE=vk.com,yandex.ru,mail.ru

# HTTPS attempts per target and the pause between them
# RETRY_ATTEMPTS=2
# RETRY_BACKOFF_MS=500

# Per-attempt timeouts and the ceiling for the probing phase (seconds)
# HTTPS_TIMEOUT_SECONDS=5
# HTTP_TIMEOUT_SECONDS=3
# RUN_TIMEOUT_SECONDS=30

# Maximum probes in flight
# MAX_CONCURRENCY=8

# Report targets unfinished at the deadline as TIMEOUT (true/false)
# MARK_ABANDONED=false

# Platform diagnostic text and connection facts
# PLATFORM_REPORT=/sdcard/diag.txt
# CONNECTION_TYPE=wifi
# PROVIDER_NAME=Rostelecom

# Where --save writes reports
# REPORT_DIR=.

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "TARGET_DOMAINS" => {
                for domain in value.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                    Target::domain(domain)
                        .map_err(|e| AppError::config(format!("Invalid TARGET_DOMAINS entry '{}': {}", domain, e)))?;
                }
            }
            "SERVICES" => {
                for service in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    Target::service(service)
                        .map_err(|e| AppError::config(format!("Invalid SERVICES entry '{}': {}", service, e)))?;
                }
            }
            "RETRY_ATTEMPTS" => Self::check_range(key, value, 1, 10)?,
            "RETRY_BACKOFF_MS" => Self::check_range(key, value, 0, 10_000)?,
            "HTTPS_TIMEOUT_SECONDS" | "HTTP_TIMEOUT_SECONDS" => Self::check_range(key, value, 1, 60)?,
            "RUN_TIMEOUT_SECONDS" => Self::check_range(key, value, 1, 600)?,
            "MAX_CONCURRENCY" => Self::check_range(key, value, 1, 256)?,
            "MARK_ABANDONED" | "ENABLE_COLOR" => {
                value.to_lowercase().parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "CONNECTION_TYPE" => {
                value.parse::<ConnectionType>()
                    .map_err(|e| AppError::config(format!("Invalid CONNECTION_TYPE value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    fn check_range(key: &str, value: &str, min: u64, max: u64) -> Result<()> {
        let parsed: u64 = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// All supported environment variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TARGET_DOMAINS", "Comma-separated domains to probe", "youtube.com,t.me"),
            ("SERVICES", "Comma-separated name@host:port endpoints", "wireguard@vpn.example.org:51820"),
            ("KNOWN_REACHABLE", "Domains never probed (substring match)", "vk.com,yandex.ru"),
            ("RETRY_ATTEMPTS", "HTTPS attempts per target (1-10)", "2"),
            ("RETRY_BACKOFF_MS", "Pause between attempts (0-10000 ms)", "500"),
            ("HTTPS_TIMEOUT_SECONDS", "HTTPS attempt timeout (1-60)", "5"),
            ("HTTP_TIMEOUT_SECONDS", "HTTP fallback timeout (1-60)", "3"),
            ("RUN_TIMEOUT_SECONDS", "Ceiling for the probing phase (1-600)", "30"),
            ("MAX_CONCURRENCY", "Probes in flight (1-256)", "8"),
            ("MARK_ABANDONED", "Report unfinished targets as TIMEOUT", "false"),
            ("PLATFORM_REPORT", "Path of the platform diagnostic text", "diag.txt"),
            ("CONNECTION_TYPE", "Connection type (wifi, mobile, ethernet, vpn)", "wifi"),
            ("PROVIDER_NAME", "Internet provider name", "Rostelecom"),
            ("REPORT_DIR", "Directory for saved reports", "reports"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the lines of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => {
                    if let Err(e) = Self::validate_env_var(key.trim(), value) {
                        warnings.push(format!("Line '{}': {}", line, e));
                    }
                }
                None => warnings.push(format!("Line '{}': expected KEY=VALUE", line)),
            }
        }

        Ok(Some(warnings))
    }
}
