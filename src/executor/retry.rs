//! Bounded HTTPS retries with a single HTTP fallback

use crate::{
    client::Probe,
    logging::ProbeLogger,
    models::{Config, ProbeOutcome, ProbeStatus, TargetResult},
    types::{Target, Transport},
};
use super::CancellationHandle;
use std::sync::Arc;
use std::time::Duration;

/// Retry settings for one target
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// HTTPS (or TCP) attempts before giving up on the primary transport
    pub attempts: u32,
    pub backoff: Duration,
    pub https_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RetryConfig {
    fn from(config: &Config) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            backoff: config.retry_backoff(),
            https_timeout: config.https_timeout(),
            http_timeout: config.http_timeout(),
        }
    }
}

/// Domains that are never probed
///
/// A target matches when its raw string contains any entry, ignoring case.
/// The match is deliberately loose: `notvk.com.example` matches `vk.com`.
#[derive(Debug, Clone, Default)]
pub struct KnownReachable {
    entries: Vec<String>,
}

impl KnownReachable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, target: &Target) -> bool {
        let raw = target.raw().to_lowercase();
        self.entries.iter().any(|entry| raw.contains(entry.as_str()))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Runs the retry/fallback sequence for one target at a time
pub struct RetryPolicy {
    probe: Arc<dyn Probe>,
    config: RetryConfig,
    known: KnownReachable,
    logger: ProbeLogger,
}

impl RetryPolicy {
    pub fn new(probe: Arc<dyn Probe>, config: RetryConfig, known: KnownReachable) -> Self {
        Self {
            probe,
            config,
            known,
            logger: ProbeLogger::quiet(),
        }
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn logger(&self) -> &ProbeLogger {
        &self.logger
    }

    /// Reconcile one target; `None` when the run was cancelled first
    pub async fn run(&self, target: &Target, cancel: &CancellationHandle) -> Option<TargetResult> {
        if self.known.matches(target) {
            self.logger.log_skipped(target).await;
            return Some(TargetResult::new(
                ProbeOutcome::new(target.clone(), ProbeStatus::Reachable),
                0,
            ));
        }

        let primary = match target {
            Target::Domain(_) => Transport::Https,
            Target::Service { .. } => Transport::Tcp,
        };

        let mut last_failure = ProbeStatus::Timeout;
        let mut first_error: Option<ProbeStatus> = None;

        for attempt in 1..=self.config.attempts {
            let status = self.attempt(target, primary, self.config.https_timeout, cancel).await?;
            self.logger.log_attempt(target, primary, attempt, &status.label()).await;

            if status.is_reachable() {
                return Some(TargetResult::new(ProbeOutcome::new(target.clone(), status), attempt));
            }
            if matches!(status, ProbeStatus::Error(_)) && first_error.is_none() {
                first_error = Some(status.clone());
            }
            last_failure = status;

            if attempt < self.config.attempts {
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(self.config.backoff) => {}
                }
            }
        }

        let attempts = self.config.attempts;
        if let Some(error) = first_error {
            return Some(TargetResult::new(ProbeOutcome::new(target.clone(), error), attempts));
        }
        if primary == Transport::Tcp {
            return Some(TargetResult::new(ProbeOutcome::new(target.clone(), last_failure), attempts));
        }

        self.logger.log_fallback(target).await;
        let fallback = self.attempt(target, Transport::Http, self.config.http_timeout, cancel).await?;
        self.logger.log_attempt(target, Transport::Http, attempts + 1, &fallback.label()).await;

        let status = if fallback.is_reachable() {
            ProbeStatus::ReachableHttpOnly
        } else {
            ProbeStatus::fallback_exhausted()
        };
        Some(TargetResult::new(ProbeOutcome::new(target.clone(), status), attempts + 1))
    }

    async fn attempt(
        &self,
        target: &Target,
        transport: Transport,
        limit: Duration,
        cancel: &CancellationHandle,
    ) -> Option<ProbeStatus> {
        if cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = cancel.cancelled() => None,
            outcome = self.probe.probe(target, transport, limit) => Some(outcome.status),
        }
    }
}
