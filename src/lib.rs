//! Network Autopsy
//!
//! A reachability and blocking diagnostic engine. It probes a set of target
//! domains and protocol endpoints concurrently (HTTPS with an HTTP fallback),
//! merges the result with a diagnostic text produced by the host platform,
//! derives a prioritized list of issues and recommendations, and renders a
//! human-readable report.

pub mod app;
pub mod cli;
pub mod config;
pub mod client;
pub mod error;
pub mod logging;
pub mod diagnostics;
pub mod executor;
pub mod output;
pub mod models;
pub mod platform;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, DiagnosticSnapshot, ProbeOutcome, ProbeStatus, TargetResult};
pub use types::{AddOutcome, ConnectionType, Target, TargetSet, Transport, VpnProtocol};
pub use app::{DiagnosticRun, DiagnosticSession};
pub use diagnostics::{Conclusion, Issue, IssueKind};
pub use executor::{CancellationHandle, RetryPolicy, Scheduler};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TARGET_DOMAINS: &[&str] = &["vk.com", "rutracker.org", "github.com"];
    pub const DEFAULT_KNOWN_REACHABLE: &[&str] = &[
        "vk.com",
        "rutracker.org",
        "yandex.ru",
        "mail.ru",
        "rambler.ru",
        "avito.ru",
        "ok.ru",
    ];
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
    pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);
    pub const DEFAULT_HTTPS_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Two probes per core, kept between 4 and 50
    pub fn default_concurrency() -> usize {
        (num_cpus::get() * 2).clamp(4, 50)
    }
}
