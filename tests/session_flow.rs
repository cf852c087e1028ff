//! Session-level tests with an in-process probe and platform

use async_trait::async_trait;
use network_autopsy::{
    client::Probe,
    platform::{RecordingProgress, StaticPlatform},
    AppError, Config, ConnectionType, DiagnosticSession, ProbeOutcome, ProbeStatus, Target,
    Transport,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Answers after a per-host delay; unknown hosts answer at once
struct DelayedProbe {
    status: ProbeStatus,
    delays: HashMap<String, Duration>,
}

impl DelayedProbe {
    fn new(status: ProbeStatus) -> Self {
        Self {
            status,
            delays: HashMap::new(),
        }
    }

    fn with_delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }
}

#[async_trait]
impl Probe for DelayedProbe {
    async fn probe(&self, target: &Target, _transport: Transport, _timeout: Duration) -> ProbeOutcome {
        if let Some(delay) = self.delays.get(target.host()) {
            tokio::time::sleep(*delay).await;
        }
        ProbeOutcome::new(target.clone(), self.status.clone())
    }
}

fn config(domains: &[&str]) -> Config {
    Config {
        target_domains: domains.iter().map(|d| d.to_string()).collect(),
        known_reachable: Vec::new(),
        retry_attempts: 1,
        retry_backoff_ms: 0,
        https_timeout_seconds: 60,
        run_timeout_seconds: 30,
        ..Config::default()
    }
}

fn healthy_platform() -> StaticPlatform {
    StaticPlatform {
        text: Some(
            "[TYPE] Ethernet\nDownload speed: 50.0 Mbps\nUpload speed: 20.0 Mbps\nAverage ping: 20 ms\nPacket loss: 0.0%\n"
                .to_string(),
        ),
        connection_type: Some(ConnectionType::Ethernet),
        provider: Some("Rostelecom".to_string()),
    }
}

async fn wait_until_running(session: &DiagnosticSession) {
    for _ in 0..200 {
        if session.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run never started");
}

#[tokio::test]
async fn test_healthy_network_yields_single_statement() {
    let session = DiagnosticSession::new(
        config(&["example.org", "example.net"]),
        Arc::new(DelayedProbe::new(ProbeStatus::Reachable)),
        Arc::new(healthy_platform()),
    )
    .unwrap();

    let run = session.run_diagnostic().await.unwrap();
    assert!(run.conclusion.issues.is_empty());
    assert!(run.conclusion.is_healthy());
    assert_eq!(run.report.matches(network_autopsy::diagnostics::HEALTHY_STATEMENT).count(), 1);
    assert_eq!(run.snapshot.results.len(), 2);
    assert!(run.notes.is_empty());
}

#[tokio::test]
async fn test_second_run_is_rejected_while_first_is_active() {
    let probe = DelayedProbe::new(ProbeStatus::Reachable).with_delay("example.org", Duration::from_millis(300));
    let session = Arc::new(
        DiagnosticSession::new(config(&["example.org"]), Arc::new(probe), Arc::new(healthy_platform())).unwrap(),
    );

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.run_diagnostic().await }
    });
    wait_until_running(&session).await;

    assert!(matches!(session.run_diagnostic().await, Err(AppError::RunInProgress)));

    let run = first.await.unwrap().unwrap();
    assert_eq!(run.snapshot.results.len(), 1);
    assert!(!session.is_running());
    assert!(session.run_diagnostic().await.is_ok());
}

#[tokio::test]
async fn test_cancel_returns_partial_run() {
    let probe = DelayedProbe::new(ProbeStatus::Reachable)
        .with_delay("slow.example.org", Duration::from_secs(20));
    let session = Arc::new(
        DiagnosticSession::new(
            config(&["example.org", "slow.example.org"]),
            Arc::new(probe),
            Arc::new(healthy_platform()),
        )
        .unwrap(),
    );

    let handle = tokio::spawn({
        let session = session.clone();
        async move { session.run_diagnostic().await }
    });
    wait_until_running(&session).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.cancel());

    let run = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("cancelled run should finish promptly")
        .unwrap()
        .unwrap();
    assert!(run.cancelled);
    assert!(run.notes.iter().any(|note| note.contains("cancelled")));
    assert!(run.snapshot.results.iter().all(|r| r.target().host() != "slow.example.org"));
    assert!(run.report.contains("----- CONCLUSION -----"));
}

#[tokio::test]
async fn test_deadline_omits_unfinished_targets_by_default() {
    let probe = DelayedProbe::new(ProbeStatus::Reachable)
        .with_delay("slow.example.org", Duration::from_secs(20));
    let mut config = config(&["example.org", "slow.example.org"]);
    config.run_timeout_seconds = 1;

    let session = DiagnosticSession::new(config, Arc::new(probe), Arc::new(healthy_platform())).unwrap();
    let run = session.run_diagnostic().await.unwrap();

    assert!(!run.cancelled);
    assert_eq!(run.snapshot.results.len(), 1);
    assert_eq!(run.snapshot.results[0].target().host(), "example.org");
    assert!(run.notes.iter().any(|note| note.contains("unfinished")));
}

#[tokio::test]
async fn test_deadline_marks_unfinished_targets_when_configured() {
    let probe = DelayedProbe::new(ProbeStatus::Reachable)
        .with_delay("slow.example.org", Duration::from_secs(20));
    let mut config = config(&["example.org", "slow.example.org"]);
    config.run_timeout_seconds = 1;
    config.mark_abandoned = true;

    let session = DiagnosticSession::new(config, Arc::new(probe), Arc::new(healthy_platform())).unwrap();
    let run = session.run_diagnostic().await.unwrap();

    assert_eq!(run.snapshot.results.len(), 2);
    assert_eq!(run.snapshot.results[1].status(), &ProbeStatus::Timeout);
    assert!(run.report.contains("slow.example.org: TIMEOUT"));
}

#[tokio::test]
async fn test_progress_never_decreases() {
    let mut probe = DelayedProbe::new(ProbeStatus::Reachable);
    let domains: Vec<String> = (0..12).map(|i| format!("site{}.example.org", i)).collect();
    for (i, domain) in domains.iter().enumerate() {
        probe = probe.with_delay(domain, Duration::from_millis(((i * 37) % 50) as u64));
    }
    let refs: Vec<&str> = domains.iter().map(String::as_str).collect();
    let mut config = config(&refs);
    config.max_concurrency = 4;

    let sink = Arc::new(RecordingProgress::default());
    let session = DiagnosticSession::new(config, Arc::new(probe), Arc::new(healthy_platform()))
        .unwrap()
        .with_progress(sink.clone());
    session.run_diagnostic().await.unwrap();

    let percents = sink.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_add_target_rejects_dotless_and_deduplicates() {
    let session = DiagnosticSession::new(
        config(&[]),
        Arc::new(DelayedProbe::new(ProbeStatus::Reachable)),
        Arc::new(StaticPlatform::default()),
    )
    .unwrap();

    assert!(matches!(session.add_target("intranet"), Err(AppError::Validation(_))));
    assert!(session.targets().is_empty());

    session.add_target("https://www.github.com").unwrap();
    session.add_target("GITHUB.COM").unwrap();
    session.add_service("ssh@github.com:22").unwrap();
    assert_eq!(session.targets().len(), 2);
}
