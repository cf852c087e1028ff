//! Field extraction from platform diagnostic text
//!
//! The text is produced outside this crate and its layout is not guaranteed.
//! Scanning is marker based and tolerant: unknown lines are ignored, missing
//! markers leave fields untouched, and values that fail to parse are recorded
//! in the returned [`ParseSummary`] instead of failing the run.

use crate::models::DiagnosticSnapshot;
use crate::types::{ConnectionType, VpnProtocol, NAMED_DOMAINS};

/// Snapshot field a line rule writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ConnectionType,
    VpnActive,
    PacketLoss,
    Ping,
    DownloadSpeed,
    UploadSpeed,
    Provider,
    DpiDetected,
}

/// `marker` starts the value, `terminator` (if any) ends it
#[derive(Debug, Clone, Copy)]
pub struct LineRule {
    pub marker: &'static str,
    pub terminator: Option<&'static str>,
    pub field: Field,
}

const fn rule(marker: &'static str, terminator: Option<&'static str>, field: Field) -> LineRule {
    LineRule { marker, terminator, field }
}

pub const LINE_RULES: &[LineRule] = &[
    rule("[TYPE]", None, Field::ConnectionType),
    rule("[VPN] ACTIVE", None, Field::VpnActive),
    rule("VPN connection active", None, Field::VpnActive),
    rule("VPN: ACTIVE", None, Field::VpnActive),
    rule("Packet loss:", Some("%"), Field::PacketLoss),
    rule("Average ping:", Some("ms"), Field::Ping),
    rule("Download speed:", Some("Mbps"), Field::DownloadSpeed),
    rule("Upload speed:", Some("Mbps"), Field::UploadSpeed),
    rule("[EXTRA INFO]", None, Field::Provider),
    rule("PROVIDER:", None, Field::Provider),
    rule("DPI Detection: [DETECTED]", None, Field::DpiDetected),
];

/// Markers meaning a protocol or site is blocked
pub const BLOCKED_MARKERS: &[&str] = &["BLOCKED", "HEAVILY BLOCKED", "PARTIALLY BLOCKED"];

/// Placeholder the producer prints for a missing provider
pub const PROVIDER_SENTINEL: &str = "N/A";

/// What a parsing pass found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseSummary {
    /// Rule hits that updated the snapshot
    pub matched: usize,
    /// One message per value that could not be parsed
    pub failures: Vec<String>,
}

impl ParseSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Update `snapshot` from `text`
pub fn parse_platform_report(text: &str, snapshot: &mut DiagnosticSnapshot) -> ParseSummary {
    let mut summary = ParseSummary::default();

    for line in text.lines() {
        for rule in LINE_RULES {
            let Some(start) = line.find(rule.marker) else {
                continue;
            };
            let rest = &line[start + rule.marker.len()..];
            let value = match rule.terminator {
                Some(terminator) => match rest.find(terminator) {
                    Some(end) => &rest[..end],
                    None => {
                        summary.failures.push(format!(
                            "'{}' is missing '{}': {}",
                            rule.marker,
                            terminator,
                            line.trim()
                        ));
                        continue;
                    }
                },
                None => rest,
            };

            match apply_rule(rule.field, value.trim(), snapshot) {
                Ok(true) => summary.matched += 1,
                Ok(false) => {}
                Err(message) => summary
                    .failures
                    .push(format!("{}: {}", rule.marker.trim_end_matches(':'), message)),
            }
        }

        if line_reports_block(line) {
            let trimmed = line.trim_start();
            for protocol in VpnProtocol::ALL {
                let named = line.contains(&protocol.marker()) || is_labelled(trimmed, protocol.name());
                if named && snapshot.blocked_protocols.insert(protocol) {
                    summary.matched += 1;
                }
            }

            let lowered = line.to_lowercase();
            for (domain, name) in NAMED_DOMAINS {
                let named = lowered.contains(domain) || is_labelled(trimmed, name);
                if named && snapshot.blocked_domains.insert(name.to_string()) {
                    summary.matched += 1;
                }
            }
        }
    }

    if text.contains("SNI") && text.contains("[BLOCKED]") {
        snapshot.sni_blocked = true;
        summary.matched += 1;
    }

    summary
}

/// A line counts as blocked when a blocked marker remains after removing "NOT BLOCKED"
fn line_reports_block(line: &str) -> bool {
    let without_negations = line.replace("NOT BLOCKED", "");
    BLOCKED_MARKERS.iter().any(|marker| without_negations.contains(marker))
}

/// `Label: value` lines of the short summary layout
fn is_labelled(line: &str, label: &str) -> bool {
    line.strip_prefix(label).is_some_and(|rest| rest.starts_with(':'))
}

/// Numbers may carry a leading `~` (approximate values) and a locale decimal comma
fn parse_number(value: &str) -> Result<f64, String> {
    let cleaned = value.trim().trim_start_matches('~').trim();
    let cleaned = if cleaned.contains('.') {
        cleaned.to_string()
    } else {
        cleaned.replacen(',', ".", 1)
    };
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("'{}' is not a number", value))
}

fn apply_rule(field: Field, value: &str, snapshot: &mut DiagnosticSnapshot) -> Result<bool, String> {
    match field {
        Field::ConnectionType => {
            let connection_type = value
                .parse::<ConnectionType>()
                .map_err(|_| format!("unrecognized connection type '{}'", value))?;
            snapshot.connection_type = connection_type;
            if connection_type == ConnectionType::Vpn {
                snapshot.vpn_active = true;
            }
        }
        Field::VpnActive => {
            snapshot.vpn_active = true;
            if let Some(protocol) = value.split_whitespace().next() {
                snapshot.vpn_protocol = Some(protocol.to_string());
            }
        }
        Field::PacketLoss => snapshot.packet_loss_pct = Some(parse_number(value)?),
        Field::Ping => snapshot.ping_ms = Some(parse_number(value)?),
        Field::DownloadSpeed => snapshot.download_mbps = Some(parse_number(value)?),
        Field::UploadSpeed => snapshot.upload_mbps = Some(parse_number(value)?),
        Field::Provider => {
            if value.is_empty() || value == PROVIDER_SENTINEL {
                return Ok(false);
            }
            snapshot.provider = Some(value.to_string());
        }
        Field::DpiDetected => snapshot.dpi_detected = true,
    }
    Ok(true)
}
