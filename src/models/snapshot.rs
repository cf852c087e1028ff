//! Probe outcomes and the aggregated snapshot of one diagnostic run

use crate::types::{ConnectionType, Target, VpnProtocol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reason recorded when both HTTPS and the HTTP fallback failed
pub const FALLBACK_EXHAUSTED_REASON: &str = "HTTPS/HTTP";

/// Classification of a single probe attempt (or of the reconciled result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// Answered over the primary transport
    Reachable,
    /// HTTPS failed, plain HTTP answered
    ReachableHttpOnly,
    /// Server error status or connection-level failure
    Blocked {
        status_code: Option<u16>,
        reason: Option<String>,
    },
    /// No answer within the attempt timeout
    Timeout,
    /// Anything else (TLS library errors, malformed responses, ...)
    Error(String),
}

impl ProbeStatus {
    pub fn blocked() -> Self {
        Self::Blocked { status_code: None, reason: None }
    }

    pub fn blocked_with_status(status_code: u16) -> Self {
        Self::Blocked { status_code: Some(status_code), reason: None }
    }

    pub fn fallback_exhausted() -> Self {
        Self::Blocked {
            status_code: None,
            reason: Some(FALLBACK_EXHAUSTED_REASON.to_string()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable | Self::ReachableHttpOnly)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Blocked and Timeout are the outcomes that justify an HTTP fallback
    pub fn warrants_fallback(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::Timeout)
    }

    /// Label used in the site availability section of the report
    pub fn label(&self) -> String {
        match self {
            Self::Reachable => "REACHABLE".to_string(),
            Self::ReachableHttpOnly => "REACHABLE (HTTP only)".to_string(),
            Self::Blocked { status_code: Some(code), .. } => format!("BLOCKED (HTTP {})", code),
            Self::Blocked { reason: Some(reason), .. } => format!("BLOCKED ({})", reason),
            Self::Blocked { .. } => "BLOCKED".to_string(),
            Self::Timeout => "TIMEOUT".to_string(),
            Self::Error(message) => format!("ERROR ({})", message),
        }
    }
}

/// One classified attempt against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub target: Target,
    pub status: ProbeStatus,
}

impl ProbeOutcome {
    pub fn new(target: Target, status: ProbeStatus) -> Self {
        Self { target, status }
    }
}

/// Reconciled outcome for one target after retries and fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    pub outcome: ProbeOutcome,
    /// Network attempts spent, fallback included; 0 when allow-listed
    pub attempts: u32,
}

impl TargetResult {
    pub fn new(outcome: ProbeOutcome, attempts: u32) -> Self {
        Self { outcome, attempts }
    }

    pub fn target(&self) -> &Target {
        &self.outcome.target
    }

    pub fn status(&self) -> &ProbeStatus {
        &self.outcome.status
    }
}

/// Aggregated state of one full run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub connection_type: ConnectionType,
    pub provider: Option<String>,
    pub vpn_active: bool,
    pub vpn_protocol: Option<String>,
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub ping_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub blocked_protocols: BTreeSet<VpnProtocol>,
    /// Display names ("YouTube", "Telegram", ...) of blocked well-known sites
    pub blocked_domains: BTreeSet<String>,
    pub dpi_detected: bool,
    pub sni_blocked: bool,
    /// Per-target results in input order; abandoned targets may be absent
    pub results: Vec<TargetResult>,
}

impl DiagnosticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_domain_blocked(&self, display_name: &str) -> bool {
        self.blocked_domains.contains(display_name)
    }

    pub fn youtube_blocked(&self) -> bool {
        self.is_domain_blocked("YouTube")
    }

    pub fn telegram_blocked(&self) -> bool {
        self.is_domain_blocked("Telegram")
    }

    pub fn vk_blocked(&self) -> bool {
        self.is_domain_blocked("VK")
    }

    /// Provider name, or the placeholder used in reports
    pub fn provider_or_unknown(&self) -> &str {
        self.provider.as_deref().unwrap_or("Unknown")
    }

    /// Results whose final status is Blocked
    pub fn blocked_results(&self) -> impl Iterator<Item = &TargetResult> {
        self.results.iter().filter(|r| r.status().is_blocked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(ProbeStatus::Reachable.label(), "REACHABLE");
        assert_eq!(ProbeStatus::ReachableHttpOnly.label(), "REACHABLE (HTTP only)");
        assert_eq!(ProbeStatus::blocked_with_status(503).label(), "BLOCKED (HTTP 503)");
        assert_eq!(ProbeStatus::fallback_exhausted().label(), "BLOCKED (HTTPS/HTTP)");
        assert_eq!(ProbeStatus::blocked().label(), "BLOCKED");
        assert_eq!(ProbeStatus::Timeout.label(), "TIMEOUT");
    }

    #[test]
    fn test_fallback_eligibility() {
        assert!(ProbeStatus::blocked().warrants_fallback());
        assert!(ProbeStatus::Timeout.warrants_fallback());
        assert!(!ProbeStatus::Error("tls".to_string()).warrants_fallback());
        assert!(!ProbeStatus::Reachable.warrants_fallback());
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot = DiagnosticSnapshot::new();
        assert_eq!(snapshot.connection_type, ConnectionType::Unknown);
        assert_eq!(snapshot.provider_or_unknown(), "Unknown");
        assert!(snapshot.download_mbps.is_none());
        assert!(snapshot.results.is_empty());
        assert!(!snapshot.youtube_blocked());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut snapshot = DiagnosticSnapshot::new();
        snapshot.blocked_protocols.insert(VpnProtocol::WireGuard);
        snapshot.results.push(TargetResult::new(
            ProbeOutcome::new(Target::Domain("github.com".to_string()), ProbeStatus::Reachable),
            1,
        ));

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("WireGuard"));
        assert!(json.contains("github.com"));
    }
}
