//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};
use std::path::PathBuf;

/// Combines defaults, the .env file, the environment and CLI arguments, in that order
pub struct ConfigParser {
    cli: Cli,
    env_file: PathBuf,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            env_file: PathBuf::from(".env"),
        }
    }

    /// Read a different env file than `./.env`
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file_from(&self.env_file, self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if !cli.domains.is_empty() {
            config.target_domains = cli.domains.clone();
        }
        if !cli.services.is_empty() {
            config.services = cli.services.clone();
        }
        if let Some(ref path) = cli.platform_report {
            config.platform_report = Some(path.clone());
        }
        if let Some(attempts) = cli.attempts {
            config.retry_attempts = attempts;
        }
        if let Some(timeout) = cli.timeout {
            config.https_timeout_seconds = timeout;
        }
        if let Some(timeout) = cli.http_timeout {
            config.http_timeout_seconds = timeout;
        }
        if let Some(timeout) = cli.run_timeout {
            config.run_timeout_seconds = timeout;
        }
        if let Some(concurrency) = cli.concurrency {
            config.max_concurrency = concurrency;
        }
        if cli.mark_abandoned {
            config.mark_abandoned = true;
        }
        if let Some(ref connection_type) = cli.connection_type {
            config.connection_type = Some(connection_type.clone());
        }
        if let Some(ref provider) = cli.provider {
            config.provider_name = Some(provider.clone());
        }
        if let Some(ref dir) = cli.report_dir {
            config.report_dir = dir.clone();
        }

        config.save_report = cli.save;
        config.json_output = cli.json;
        if cli.no_color || cli.json {
            config.enable_color = false;
        }

        // CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Load the complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Multi-line configuration summary for debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Target domains: {}", config.target_domains.join(", ")));
    if !config.services.is_empty() {
        summary.push(format!("Services: {}", config.services.join(", ")));
    }
    summary.push(format!("Known reachable: {}", config.known_reachable.join(", ")));
    summary.push(format!(
        "Retry: {} attempt(s), {}ms backoff",
        config.retry_attempts, config.retry_backoff_ms
    ));
    summary.push(format!(
        "Timeouts: HTTPS {}s, HTTP {}s, run {}s",
        config.https_timeout_seconds, config.http_timeout_seconds, config.run_timeout_seconds
    ));
    summary.push(format!("Concurrency: {}", config.max_concurrency));
    summary.push(format!(
        "Abandoned targets: {}",
        if config.mark_abandoned { "marked TIMEOUT" } else { "omitted" }
    ));
    summary.push(format!(
        "Platform report: {}",
        config
            .platform_report
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
