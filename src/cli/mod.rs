//! Command-line interface

pub mod help;

pub use help::HelpSystem;

use clap::{ArgAction, Parser};

/// Network Autopsy - find out what your network blocks and why
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "nau")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Domain to probe (can be used multiple times)
    #[arg(short, long = "domain", action = ArgAction::Append, value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Protocol endpoint to probe as name@host:port (can be used multiple times)
    #[arg(long = "service", action = ArgAction::Append, value_name = "NAME@HOST:PORT")]
    pub services: Vec<String>,

    /// Text file produced by the platform diagnostic tool
    #[arg(short = 'p', long, value_name = "PATH")]
    pub platform_report: Option<std::path::PathBuf>,

    /// HTTPS attempts per target before falling back to HTTP
    #[arg(short = 'n', long)]
    pub attempts: Option<u32>,

    /// HTTPS attempt timeout in seconds
    #[arg(short, long, value_parser = parse_seconds)]
    pub timeout: Option<u64>,

    /// HTTP fallback timeout in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub http_timeout: Option<u64>,

    /// Ceiling for the whole probing phase in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub run_timeout: Option<u64>,

    /// Maximum number of targets probed at once
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Report targets unfinished at the deadline as timed out instead of omitting them
    #[arg(long)]
    pub mark_abandoned: bool,

    /// Connection type when no platform data is available (wifi, mobile, ethernet, vpn)
    #[arg(long, value_name = "TYPE")]
    pub connection_type: Option<String>,

    /// Provider name when no platform data is available
    #[arg(long, value_name = "NAME")]
    pub provider: Option<String>,

    /// Save the report to the report directory
    #[arg(short, long)]
    pub save: bool,

    /// Directory for saved reports
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<std::path::PathBuf>,

    /// Print the snapshot and conclusion as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Show help for a topic (targets, platform, output, env)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Check flag combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.attempts {
            return Err("--attempts must be at least 1".to_string());
        }
        if let Some(0) = self.concurrency {
            return Err("--concurrency must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Colors are on unless disabled by flag, JSON output or the terminal
    pub fn use_colors(&self) -> bool {
        !self.no_color && !self.json && supports_color()
    }

    /// Help for the requested topic, or the topic list when it is unknown
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();
        let topic = self.help_topic.as_deref().unwrap_or("");

        help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
            format!(
                "Unknown help topic: '{}'\n\nAvailable topics: {}\n",
                topic,
                HelpSystem::TOPICS.join(", ")
            )
        })
    }
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 600 {
                Err("Duration cannot exceed 600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}
