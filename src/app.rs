//! Diagnostic session: owns the targets and drives one run through its phases

use crate::client::{NetworkProbe, Probe};
use crate::diagnostics::{conclude, Conclusion};
use crate::error::{AppError, Result};
use crate::executor::{
    CancellationHandle, KnownReachable, ProgressSpan, ProgressTracker, RetryConfig, RetryPolicy,
    Scheduler, SchedulerConfig, StopReason,
};
use crate::logging::LoggerFactory;
use crate::models::{Config, DiagnosticSnapshot};
use crate::output::{render_report, ReportContext};
use crate::platform::{
    format_platform_text, parse_platform_report, FilePlatformSource, NullProgress, PlatformSource,
    ProgressSink,
};
use crate::types::{AddOutcome, ConnectionType, Target, TargetSet};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Probing occupies this slice of the overall progress
const PROBE_SPAN: (u8, u8) = (80, 95);

/// Finished (or cancelled) run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRun {
    pub snapshot: DiagnosticSnapshot,
    pub conclusion: Conclusion,
    /// Rendered report text
    pub report: String,
    /// Parse failures and scheduling remarks, also listed in the report
    pub notes: Vec<String>,
    pub cancelled: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

/// Clears the running flag however the run ends
struct RunGuard<'a> {
    running: &'a AtomicBool,
    active: &'a Mutex<Option<CancellationHandle>>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *lock(self.active) = None;
        self.running.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct DiagnosticSession {
    config: Config,
    targets: Mutex<TargetSet>,
    known: KnownReachable,
    probe: Arc<dyn Probe>,
    platform: Arc<dyn PlatformSource>,
    progress: Arc<dyn ProgressSink>,
    running: AtomicBool,
    active: Mutex<Option<CancellationHandle>>,
}

impl DiagnosticSession {
    /// Session with the config's targets and the given collaborators
    pub fn new(config: Config, probe: Arc<dyn Probe>, platform: Arc<dyn PlatformSource>) -> Result<Self> {
        let targets = config.target_set()?;
        let known = KnownReachable::new(config.known_reachable.iter());
        Ok(Self {
            config,
            targets: Mutex::new(targets),
            known,
            probe,
            platform,
            progress: Arc::new(NullProgress),
            running: AtomicBool::new(false),
            active: Mutex::new(None),
        })
    }

    /// Session probing the real network and reading the configured platform report
    pub fn from_config(config: Config) -> Result<Self> {
        let probe = Arc::new(NetworkProbe::new()?);

        let mut platform = FilePlatformSource::new(config.platform_report.clone());
        if let Some(raw) = config.connection_type.as_deref() {
            platform = platform.with_connection_type(raw.parse::<ConnectionType>()?);
        }
        if let Some(provider) = config.provider_name.as_deref() {
            platform = platform.with_provider(provider);
        }

        Self::new(config, probe, Arc::new(platform))
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate and add a domain; a repeat is reported, not rejected
    pub fn add_target(&self, raw_domain: &str) -> Result<AddOutcome> {
        lock(&self.targets).add(raw_domain)
    }

    /// Add a `name@host:port` service target
    pub fn add_service(&self, spec: &str) -> Result<AddOutcome> {
        lock(&self.targets).add_service(spec)
    }

    pub fn targets(&self) -> Vec<Target> {
        lock(&self.targets).targets().to_vec()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the active run; returns false when nothing is running
    pub fn cancel(&self) -> bool {
        match lock(&self.active).as_ref() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Run every phase once; a second concurrent call fails with `RunInProgress`
    pub async fn run_diagnostic(&self) -> Result<DiagnosticRun> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AppError::RunInProgress);
        }
        let cancel = CancellationHandle::new();
        *lock(&self.active) = Some(cancel.clone());
        let _guard = RunGuard {
            running: &self.running,
            active: &self.active,
        };

        Ok(self.execute(&cancel).await)
    }

    async fn execute(&self, cancel: &CancellationHandle) -> DiagnosticRun {
        let started_at = Local::now();
        let factory = LoggerFactory::new(self.config.clone());
        let mut run_logger = factory.create_run_logger().await;
        let progress = ProgressTracker::new(self.progress.clone());
        let targets = self.targets();

        let mut snapshot = DiagnosticSnapshot::new();
        let mut notes = Vec::new();
        let mut platform_text = String::new();

        progress.report(0, "Preparing diagnostic");

        if !cancel.is_cancelled() {
            run_logger.start_phase("connection").await;
            let (connection_type, provider) = futures::future::join(
                self.platform.connection_type(),
                self.platform.provider_name(),
            )
            .await;
            snapshot.connection_type = connection_type.unwrap_or(ConnectionType::Unknown);
            snapshot.provider = provider.ok().filter(|name| !name.trim().is_empty());
            run_logger.end_phase("connection").await;
            progress.report(10, "Connection info collected");
        }

        if !cancel.is_cancelled() {
            run_logger.start_phase("platform").await;
            let raw = match self.platform.diagnostic_text().await {
                Ok(text) => text,
                Err(error) => {
                    run_logger.log_error(&error, "Platform diagnostic failed").await;
                    platform_error_block(&error)
                }
            };
            run_logger.end_phase("platform").await;
            progress.report(30, "Platform diagnostic collected");

            run_logger.start_phase("parse").await;
            let summary = parse_platform_report(&raw, &mut snapshot);
            for failure in &summary.failures {
                run_logger.log_warning(failure).await;
            }
            notes.extend(summary.failures);
            platform_text = format_platform_text(&raw);
            run_logger.end_phase("parse").await;
            progress.report(70, "Platform report parsed");
        }

        if !cancel.is_cancelled() {
            run_logger.start_phase("probe").await;
            let policy = RetryPolicy::new(
                self.probe.clone(),
                RetryConfig::from(&self.config),
                self.known.clone(),
            )
            .with_logger(factory.create_probe_logger().await);
            let scheduler = Scheduler::new(Arc::new(policy), SchedulerConfig::from(&self.config));
            let report = scheduler
                .run(&targets, &progress, ProgressSpan::new(PROBE_SPAN.0, PROBE_SPAN.1), cancel)
                .await;
            report.apply_to(&mut snapshot);
            if report.stop == StopReason::DeadlineReached && !report.abandoned.is_empty() {
                notes.push(format!(
                    "{} target(s) unfinished at the {}s run deadline",
                    report.abandoned.len(),
                    self.config.run_timeout_seconds
                ));
            }
            run_logger.end_phase("probe").await;
        }

        let cancelled = cancel.is_cancelled();
        if cancelled {
            run_logger.log_warning("Run cancelled, reporting partial results").await;
            notes.push("Run cancelled; results are partial".to_string());
        }

        let conclusion = conclude(&snapshot);
        progress.report(95, "Conclusions drawn");

        let mut context = ReportContext::new(started_at);
        context.platform_text = platform_text;
        context.notes = notes.clone();
        let report = render_report(&snapshot, &conclusion, &context);
        progress.report(100, if cancelled { "Diagnostic cancelled" } else { "Diagnostic complete" });

        DiagnosticRun {
            snapshot,
            conclusion,
            report,
            notes,
            cancelled,
            started_at,
            finished_at: Local::now(),
        }
    }
}

/// One-line block substituted for platform text that could not be fetched
fn platform_error_block(error: &AppError) -> String {
    let detail = match error {
        AppError::PlatformUnavailable(message) => message.clone(),
        other => other.to_string(),
    };
    format!("[ERROR] Platform diagnostic unavailable: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::retry::tests::ScriptedProbe;
    use crate::models::ProbeStatus;
    use crate::platform::{RecordingProgress, StaticPlatform};

    fn quiet_config(domains: &[&str]) -> Config {
        Config {
            target_domains: domains.iter().map(|d| d.to_string()).collect(),
            known_reachable: Vec::new(),
            retry_attempts: 1,
            retry_backoff_ms: 0,
            ..Config::default()
        }
    }

    fn session(config: Config, probe: ScriptedProbe, platform: StaticPlatform) -> DiagnosticSession {
        DiagnosticSession::new(config, Arc::new(probe), Arc::new(platform)).unwrap()
    }

    #[test]
    fn test_add_target_normalizes_and_reports_duplicates() {
        let session = session(
            quiet_config(&[]),
            ScriptedProbe::new(ProbeStatus::Reachable, ProbeStatus::Reachable),
            StaticPlatform::default(),
        );

        assert!(matches!(session.add_target("https://www.Example.org/path"), Ok(AddOutcome::Added(_))));
        assert!(matches!(session.add_target("example.org"), Ok(AddOutcome::Duplicate(_))));
        assert!(matches!(session.add_target("localhost"), Err(AppError::Validation(_))));
        assert_eq!(session.targets().len(), 1);
        assert_eq!(session.targets()[0].host(), "example.org");
    }

    #[test]
    fn test_cancel_without_run_is_noop() {
        let session = session(
            quiet_config(&[]),
            ScriptedProbe::new(ProbeStatus::Reachable, ProbeStatus::Reachable),
            StaticPlatform::default(),
        );
        assert!(!session.cancel());
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_platform_failure_is_substituted() {
        let session = session(
            quiet_config(&["example.org"]),
            ScriptedProbe::new(ProbeStatus::Reachable, ProbeStatus::Reachable),
            StaticPlatform::default(),
        );

        let run = session.run_diagnostic().await.unwrap();
        assert!(run.report.contains("[ERROR] Platform diagnostic unavailable: native diagnostic module not loaded"));
        assert!(run.report.contains("Type: Unknown"));
        assert!(run.report.contains("Provider: Unknown"));
        assert!(run.report.contains("example.org: REACHABLE"));
        assert!(!run.cancelled);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_progress_checkpoints_are_monotonic() {
        let sink = Arc::new(RecordingProgress::default());
        let platform = StaticPlatform {
            text: Some("[TYPE] Wi-Fi\nDownload speed: 50.0 Mbps".to_string()),
            connection_type: Some(ConnectionType::WiFi),
            provider: Some("Rostelecom".to_string()),
        };
        let session = session(
            quiet_config(&["example.org", "example.net"]),
            ScriptedProbe::new(ProbeStatus::Reachable, ProbeStatus::Reachable),
            platform,
        )
        .with_progress(sink.clone());

        let run = session.run_diagnostic().await.unwrap();
        let percents = sink.percents();
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        for checkpoint in [10, 30, 70, 80, 95] {
            assert!(percents.contains(&checkpoint), "missing {}", checkpoint);
        }
        assert_eq!(run.snapshot.provider.as_deref(), Some("Rostelecom"));
        assert_eq!(run.snapshot.download_mbps, Some(50.0));
    }

    #[tokio::test]
    async fn test_blocked_named_domain_reaches_snapshot() {
        let session = session(
            quiet_config(&["youtube.com"]),
            ScriptedProbe::new(ProbeStatus::blocked(), ProbeStatus::blocked()),
            StaticPlatform::with_text(""),
        );

        let run = session.run_diagnostic().await.unwrap();
        assert!(run.snapshot.youtube_blocked());
        assert!(!run.conclusion.is_healthy());
    }
}
