//! Concurrent fan-out of retry policies under a run-wide deadline

use crate::{
    models::{Config, DiagnosticSnapshot, ProbeOutcome, ProbeStatus, TargetResult},
    types::{named_domain, Target},
};
use super::{CancellationHandle, ProgressSpan, ProgressTracker, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// What happens to targets still running when the deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbandonPolicy {
    /// Leave them out of the results
    #[default]
    Omit,
    /// Report them as `Timeout` with zero attempts
    MarkTimeout,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrency: usize,
    pub run_timeout: Duration,
    pub abandon: AbandonPolicy,
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            run_timeout: config.run_timeout(),
            abandon: if config.mark_abandoned {
                AbandonPolicy::MarkTimeout
            } else {
                AbandonPolicy::Omit
            },
        }
    }
}

/// Write-once result slots, one per target
pub struct ResultsCollection {
    slots: Mutex<Vec<Option<TargetResult>>>,
}

impl ResultsCollection {
    pub fn new(len: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; len]),
        }
    }

    /// Store a result; returns false when the slot is taken or out of range
    pub fn record(&self, index: usize, result: TargetResult) -> bool {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(result);
                true
            }
            _ => false,
        }
    }

    pub fn into_slots(self) -> Vec<Option<TargetResult>> {
        match self.slots.into_inner() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// How a scheduling pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    DeadlineReached,
    Cancelled,
}

/// Outcome of one scheduling pass
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    /// Results in input order
    pub results: Vec<TargetResult>,
    /// Targets with no result of their own
    pub abandoned: Vec<Target>,
    pub stop: StopReason,
}

impl ScheduleReport {
    /// Store results in the snapshot and flag blocked well-known sites
    pub fn apply_to(&self, snapshot: &mut DiagnosticSnapshot) {
        for result in &self.results {
            if !result.status().is_blocked() {
                continue;
            }
            if let Target::Domain(domain) = result.target() {
                if let Some(name) = named_domain(domain) {
                    snapshot.blocked_domains.insert(name.to_string());
                }
            }
        }
        snapshot.results = self.results.clone();
    }
}

/// Runs one [`RetryPolicy`] per target with bounded concurrency
pub struct Scheduler {
    policy: Arc<RetryPolicy>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(policy: Arc<RetryPolicy>, config: SchedulerConfig) -> Self {
        Self { policy, config }
    }

    pub async fn run(
        &self,
        targets: &[Target],
        progress: &ProgressTracker,
        span: ProgressSpan,
        cancel: &CancellationHandle,
    ) -> ScheduleReport {
        let total = targets.len();
        if total == 0 {
            progress.report(span.end(), "No targets to check");
            return ScheduleReport {
                results: Vec::new(),
                abandoned: Vec::new(),
                stop: StopReason::Completed,
            };
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let (sender, mut receiver) = mpsc::channel::<(usize, TargetResult)>(total);
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(total);

        for (index, target) in targets.iter().enumerate() {
            let target = target.clone();
            let policy = self.policy.clone();
            let semaphore = semaphore.clone();
            let sender = sender.clone();
            let cancel = cancel.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                if cancel.is_cancelled() {
                    return;
                }
                if let Some(result) = policy.run(&target, &cancel).await {
                    let _ = sender.send((index, result)).await;
                }
            }));
        }
        drop(sender);

        let collection = ResultsCollection::new(total);
        let completed = AtomicUsize::new(0);
        let deadline = tokio::time::sleep(self.config.run_timeout);
        tokio::pin!(deadline);

        progress.report(span.start(), &format!("Checking {} target(s)", total));

        let stop = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = &mut deadline => break StopReason::DeadlineReached,
                message = receiver.recv() => match message {
                    Some((index, result)) => {
                        self.policy.logger().log_result(&result).await;
                        let label = result.target().label();
                        if collection.record(index, result) {
                            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                            progress.report(
                                span.at(done, total),
                                &format!("Checked {} ({}/{})", label, done, total),
                            );
                        }
                    }
                    None => break StopReason::Completed,
                },
            }
        };

        semaphore.close();
        for task in &tasks {
            task.abort();
        }

        let mut results = Vec::with_capacity(total);
        let mut abandoned = Vec::new();
        for (slot, target) in collection.into_slots().into_iter().zip(targets) {
            match slot {
                Some(result) => results.push(result),
                None => {
                    abandoned.push(target.clone());
                    if stop == StopReason::DeadlineReached && self.config.abandon == AbandonPolicy::MarkTimeout {
                        results.push(TargetResult::new(
                            ProbeOutcome::new(target.clone(), ProbeStatus::Timeout),
                            0,
                        ));
                    }
                }
            }
        }

        if !abandoned.is_empty() {
            let reason = match stop {
                StopReason::Cancelled => "cancelled",
                _ => "run deadline reached",
            };
            self.policy.logger().log_abandoned(abandoned.len(), reason).await;
        }

        if stop != StopReason::Cancelled {
            progress.report(span.end(), "Target checks finished");
        }

        ScheduleReport { results, abandoned, stop }
    }
}
