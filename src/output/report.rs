//! Plain-text report assembly

use crate::diagnostics::Conclusion;
use crate::models::DiagnosticSnapshot;
use chrono::{DateTime, Local};
use std::fmt::Write;

pub const REPORT_TITLE: &str = "=== NETWORK DIAGNOSTIC REPORT ===";

/// Fixed section order of every report
pub const SECTIONS: &[&str] = &[
    "CONNECTION",
    "SPEED",
    "QUALITY",
    "SITE AVAILABILITY",
    "PROTOCOL BLOCKING",
    "CONCLUSION",
];

const NO_DATA: &str = "N/A";

/// Inputs to the report that are not part of the snapshot
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<Local>,
    pub version: String,
    /// Deduplicated platform text, or the substituted error block
    pub platform_text: String,
    pub notes: Vec<String>,
}

impl ReportContext {
    pub fn new(generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            version: crate::VERSION.to_string(),
            platform_text: String::new(),
            notes: Vec::new(),
        }
    }
}

fn section(out: &mut String, name: &str) {
    let _ = write!(out, "\n----- {} -----\n", name);
}

fn mbps(value: Option<f64>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| format!("{:.1} Mbps", v))
}

/// Render the report; every section is present even without data
pub fn render_report(snapshot: &DiagnosticSnapshot, conclusion: &Conclusion, context: &ReportContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", REPORT_TITLE);
    let _ = writeln!(out, "Date: {}", context.generated_at.format("%d.%m.%Y %H:%M:%S"));
    let _ = writeln!(out, "Version: {}", context.version);

    section(&mut out, SECTIONS[0]);
    let _ = writeln!(out, "Type: {}", snapshot.connection_type);
    let _ = writeln!(out, "Provider: {}", snapshot.provider_or_unknown());
    let vpn = match (snapshot.vpn_active, snapshot.vpn_protocol.as_deref()) {
        (true, Some(protocol)) => format!("ACTIVE ({})", protocol),
        (true, None) => "ACTIVE".to_string(),
        (false, _) => "NOT ACTIVE".to_string(),
    };
    let _ = writeln!(out, "VPN: {}", vpn);

    section(&mut out, SECTIONS[1]);
    let _ = writeln!(out, "Download: {}", mbps(snapshot.download_mbps));
    let _ = writeln!(out, "Upload: {}", mbps(snapshot.upload_mbps));

    section(&mut out, SECTIONS[2]);
    let ping = snapshot.ping_ms.map_or_else(|| NO_DATA.to_string(), |p| format!("{:.0} ms", p));
    let loss = snapshot.packet_loss_pct.map_or_else(|| NO_DATA.to_string(), |l| format!("{:.1}%", l));
    let _ = writeln!(out, "Ping: {}", ping);
    let _ = writeln!(out, "Packet loss: {}", loss);

    section(&mut out, SECTIONS[3]);
    if snapshot.results.is_empty() {
        let _ = writeln!(out, "No targets checked");
    }
    for result in &snapshot.results {
        let _ = writeln!(out, "{}: {}", result.target().label(), result.status().label());
    }
    if !snapshot.blocked_domains.is_empty() {
        let names: Vec<&str> = snapshot.blocked_domains.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Blocked sites: {}", names.join(", "));
    }

    section(&mut out, SECTIONS[4]);
    if snapshot.blocked_protocols.is_empty() {
        let _ = writeln!(out, "Blocked protocols: none detected");
    } else {
        let names: Vec<&str> = snapshot.blocked_protocols.iter().map(|p| p.name()).collect();
        let _ = writeln!(out, "Blocked protocols: {}", names.join(", "));
    }
    let _ = writeln!(out, "DPI: {}", if snapshot.dpi_detected { "DETECTED" } else { "not detected" });
    let _ = writeln!(out, "SNI filtering: {}", if snapshot.sni_blocked { "DETECTED" } else { "not detected" });

    section(&mut out, SECTIONS[5]);
    if let Some(healthy) = &conclusion.healthy {
        let _ = writeln!(out, "{}", healthy);
    }
    for issue in &conclusion.issues {
        let _ = writeln!(out, "[ISSUE] {}", issue.text);
    }
    if !conclusion.recommendations.is_empty() {
        let _ = writeln!(out, "Recommendations:");
        for recommendation in &conclusion.recommendations {
            let _ = writeln!(out, "- {}", recommendation);
        }
    }

    if !context.platform_text.is_empty() {
        section(&mut out, "PLATFORM REPORT");
        let _ = writeln!(out, "{}", context.platform_text);
    }

    if !context.notes.is_empty() {
        section(&mut out, "NOTES");
        for note in &context.notes {
            let _ = writeln!(out, "- {}", note);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::conclude;
    use crate::models::{ProbeOutcome, ProbeStatus, TargetResult};
    use crate::types::{ConnectionType, Target, VpnProtocol};
    use chrono::TimeZone;

    fn context() -> ReportContext {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        ReportContext::new(at)
    }

    fn section_positions(report: &str) -> Vec<usize> {
        SECTIONS
            .iter()
            .map(|name| report.find(&format!("----- {} -----", name)).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_snapshot_renders_all_sections_with_placeholders() {
        let snapshot = DiagnosticSnapshot::new();
        let report = render_report(&snapshot, &conclude(&snapshot), &context());

        let positions = section_positions(&report);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(report.contains("Date: 07.03.2026 09:05:01"));
        assert!(report.contains("Type: Unknown"));
        assert!(report.contains("Provider: Unknown"));
        assert!(report.contains("Download: N/A"));
        assert!(report.contains("Ping: N/A"));
        assert!(report.contains("No targets checked"));
        assert!(report.contains(crate::diagnostics::HEALTHY_STATEMENT));
        assert!(!report.contains("PLATFORM REPORT"));
    }

    #[test]
    fn test_numeric_precision() {
        let snapshot = DiagnosticSnapshot {
            connection_type: ConnectionType::WiFi,
            download_mbps: Some(12.345),
            upload_mbps: Some(3.0),
            ping_ms: Some(45.6),
            packet_loss_pct: Some(0.04),
            ..Default::default()
        };
        let report = render_report(&snapshot, &conclude(&snapshot), &context());
        assert!(report.contains("Download: 12.3 Mbps"));
        assert!(report.contains("Upload: 3.0 Mbps"));
        assert!(report.contains("Ping: 46 ms"));
        assert!(report.contains("Packet loss: 0.0%"));
    }

    #[test]
    fn test_results_issues_and_trailing_sections() {
        let mut snapshot = DiagnosticSnapshot {
            vpn_active: true,
            vpn_protocol: Some("VLESS".to_string()),
            ..Default::default()
        };
        snapshot.blocked_protocols.insert(VpnProtocol::OpenVpn);
        snapshot.results.push(TargetResult::new(
            ProbeOutcome::new(Target::domain("example.org").unwrap(), ProbeStatus::ReachableHttpOnly),
            3,
        ));

        let mut ctx = context();
        ctx.platform_text = "[TYPE] VPN".to_string();
        ctx.notes.push("Average ping: bad value".to_string());

        let report = render_report(&snapshot, &conclude(&snapshot), &ctx);
        assert!(report.contains("VPN: ACTIVE (VLESS)"));
        assert!(report.contains("example.org: REACHABLE (HTTP only)"));
        assert!(report.contains("Blocked protocols: OPENVPN"));
        assert!(report.contains("[ISSUE] Provider blocks VPN protocols: OPENVPN"));
        assert!(report.contains("Recommendations:\n- Run VPN servers on uncommon ports"));

        let conclusion_at = report.find("----- CONCLUSION -----").unwrap();
        let platform_at = report.find("----- PLATFORM REPORT -----").unwrap();
        let notes_at = report.find("----- NOTES -----").unwrap();
        assert!(conclusion_at < platform_at && platform_at < notes_at);
    }
}
