//! Rule-based conclusions drawn from a finished snapshot
//!
//! Rules run in a fixed order and only look at the snapshot, never at each
//! other's findings, so identical snapshots always give identical output.

use crate::models::DiagnosticSnapshot;
use crate::types::{named_domain, Target, VpnProtocol};
use serde::{Deserialize, Serialize};

/// Statement emitted when no rule fires
pub const HEALTHY_STATEMENT: &str = "No problems detected. The connection is working normally.";

/// Sites whose blocking is reported individually
const TRACKED_SITES: &[&str] = &["YouTube", "Telegram", "VK"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    VeryLowSpeed,
    LowWifiSpeed,
    HighPacketLoss,
    ModeratePacketLoss,
    HighLatency,
    DpiSniBlocking,
    SiteBlocked,
    ProtocolBlocking,
    DpiDetected,
    SniBlocked,
    VpnNotBypassing,
    ProbedTargetsBlocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub text: String,
}

impl Issue {
    fn new(kind: IssueKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

/// Ordered findings of the conclusion rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub issues: Vec<Issue>,
    /// First-seen order, without repeats
    pub recommendations: Vec<String>,
    /// Set only when there are no issues
    pub healthy: Option<String>,
}

impl Conclusion {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn kinds(&self) -> Vec<IssueKind> {
        self.issues.iter().map(|issue| issue.kind).collect()
    }

    fn issue(&mut self, kind: IssueKind, text: impl Into<String>) {
        self.issues.push(Issue::new(kind, text));
    }

    fn recommend(&mut self, text: &str) {
        if !self.recommendations.iter().any(|existing| existing == text) {
            self.recommendations.push(text.to_string());
        }
    }
}

type Rule = fn(&DiagnosticSnapshot, &mut Conclusion);

/// Evaluation order of the rules
pub const RULES: &[(&str, Rule)] = &[
    ("speed", speed_rule),
    ("packet-loss", packet_loss_rule),
    ("latency", latency_rule),
    ("site-blocking", site_blocking_rule),
    ("protocol-blocking", protocol_blocking_rule),
    ("dpi", dpi_rule),
    ("sni", sni_rule),
    ("vpn-bypass", vpn_bypass_rule),
    ("probed-targets", probed_targets_rule),
];

/// Run every rule against the snapshot
pub fn conclude(snapshot: &DiagnosticSnapshot) -> Conclusion {
    let mut conclusion = Conclusion::default();
    for (_, rule) in RULES {
        rule(snapshot, &mut conclusion);
    }
    if conclusion.issues.is_empty() {
        conclusion.healthy = Some(HEALTHY_STATEMENT.to_string());
    }
    conclusion
}

fn speed_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    let Some(download) = snapshot.download_mbps else {
        return;
    };
    if download < 5.0 {
        out.issue(IssueKind::VeryLowSpeed, format!("Very low download speed: {:.1} Mbps", download));
        out.recommend("Restart the router or modem");
        out.recommend("Contact the provider about the line speed");
    } else if download < 20.0 && snapshot.connection_type.is_wifi() {
        out.issue(IssueKind::LowWifiSpeed, format!("Low Wi-Fi speed: {:.1} Mbps", download));
        out.recommend("Move closer to the router or remove obstacles");
        out.recommend("Switch to the 5 GHz band if the router supports it");
    }
}

fn packet_loss_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    let Some(loss) = snapshot.packet_loss_pct else {
        return;
    };
    if loss > 10.0 {
        out.issue(IssueKind::HighPacketLoss, format!("High packet loss: {:.1}%", loss));
        out.recommend("Check cables and signal quality, the line is dropping packets");
    } else if loss > 5.0 {
        out.issue(IssueKind::ModeratePacketLoss, format!("Moderate packet loss: {:.1}%", loss));
        out.recommend("Watch the connection, intermittent loss often comes from radio interference");
    }
}

fn latency_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if let Some(ping) = snapshot.ping_ms.filter(|ping| *ping > 150.0) {
        out.issue(IssueKind::HighLatency, format!("High latency: {:.0} ms", ping));
    }
}

fn site_blocking_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if !(snapshot.youtube_blocked() || snapshot.telegram_blocked() || snapshot.vk_blocked()) {
        return;
    }
    if snapshot.youtube_blocked() && snapshot.telegram_blocked() {
        out.issue(
            IssueKind::DpiSniBlocking,
            "YouTube and Telegram are blocked (DPI/SNI-level filtering by the provider)",
        );
        out.recommend("Use a VPN with traffic obfuscation (VLESS or Trojan over TLS)");
        out.recommend("Route YouTube and Telegram through a proxy");
        return;
    }
    for site in TRACKED_SITES {
        if snapshot.is_domain_blocked(site) {
            out.issue(IssueKind::SiteBlocked, format!("{} is blocked", site));
        }
    }
}

fn protocol_blocking_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if snapshot.blocked_protocols.is_empty() {
        return;
    }
    let names: Vec<&str> = snapshot.blocked_protocols.iter().map(|p| p.name()).collect();
    out.issue(
        IssueKind::ProtocolBlocking,
        format!("Provider blocks VPN protocols: {}", names.join(", ")),
    );
    if snapshot.blocked_protocols.contains(&VpnProtocol::Shadowsocks) {
        out.recommend("Shadowsocks is filtered: switch to VLESS or Trojan with TLS");
    }
    if snapshot.blocked_protocols.contains(&VpnProtocol::WireGuard) {
        out.recommend("WireGuard is filtered: tunnel it over TCP/TLS or use an obfuscated fork");
    }
    out.recommend("Run VPN servers on uncommon ports (8080, 8443, 2053)");
}

fn dpi_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if snapshot.dpi_detected {
        out.issue(IssueKind::DpiDetected, "Deep packet inspection detected");
        out.recommend("Use protocols that mask traffic as regular HTTPS (VLESS Reality, Trojan)");
        out.recommend("Enable TLS for every connection");
    }
}

fn sni_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if snapshot.sni_blocked {
        out.issue(IssueKind::SniBlocked, "Filtering by TLS server name (SNI) detected");
        out.recommend("Enable Encrypted Client Hello (ECH) where supported");
        out.recommend("Use a transport that mimics ordinary HTTPS traffic");
    }
}

fn vpn_bypass_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    if snapshot.vpn_active && (snapshot.youtube_blocked() || snapshot.telegram_blocked()) {
        out.issue(IssueKind::VpnNotBypassing, "VPN is active but blocked sites are still unreachable");
        out.recommend("Switch the VPN to a different protocol or server");
        out.recommend("Check that the VPN carries all traffic, DNS included");
    }
}

fn probed_targets_rule(snapshot: &DiagnosticSnapshot, out: &mut Conclusion) {
    let blocked: Vec<String> = snapshot
        .blocked_results()
        .map(|result| result.target())
        .filter(|target| !reported_by_site_rule(target))
        .map(Target::label)
        .collect();
    if !blocked.is_empty() {
        out.issue(
            IssueKind::ProbedTargetsBlocked,
            format!("Checked targets are blocked: {}", blocked.join(", ")),
        );
        out.recommend("Use a VPN or proxy for the blocked targets");
    }
}

fn reported_by_site_rule(target: &Target) -> bool {
    match target {
        Target::Domain(domain) => named_domain(domain).is_some_and(|name| TRACKED_SITES.contains(&name)),
        Target::Service { .. } => false,
    }
}
