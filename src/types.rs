//! Type definitions shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Something whose reachability is under investigation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A normalized domain name, probed over HTTPS with HTTP fallback
    Domain(String),
    /// A named protocol endpoint, probed with a plain TCP connect
    Service { name: String, host: String, port: u16 },
}

impl Target {
    /// Validate and normalize a user-supplied domain string
    pub fn domain(raw: &str) -> Result<Self> {
        normalize_domain(raw).map(Target::Domain)
    }

    /// Parse a `name@host:port` service specification
    pub fn service(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (name, endpoint) = spec.split_once('@').ok_or_else(|| {
            AppError::validation(format!("'{}' is not a service (expected name@host:port)", spec))
        })?;
        let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
            AppError::validation(format!("'{}' is missing a port", spec))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(format!("'{}' has an empty service name", spec)));
        }
        let host = normalize_domain(host)?;
        let port: u16 = port.trim().parse().map_err(|_| {
            AppError::validation(format!("'{}' has an invalid port", spec))
        })?;
        if port == 0 {
            return Err(AppError::validation(format!("'{}' has port 0", spec)));
        }

        Ok(Target::Service {
            name: name.to_uppercase(),
            host,
            port,
        })
    }

    /// The host this target resolves to
    pub fn host(&self) -> &str {
        match self {
            Target::Domain(domain) => domain,
            Target::Service { host, .. } => host,
        }
    }

    /// String used for allow-list matching and de-duplication
    pub fn raw(&self) -> String {
        match self {
            Target::Domain(domain) => domain.clone(),
            Target::Service { host, port, .. } => format!("{}:{}", host, port),
        }
    }

    /// Display name used in reports
    pub fn label(&self) -> String {
        match self {
            Target::Domain(domain) => domain.clone(),
            Target::Service { name, host, port } => format!("{} ({}:{})", name, host, port),
        }
    }

    /// Identity key for duplicate detection (case-insensitive)
    fn key(&self) -> String {
        match self {
            Target::Domain(domain) => domain.to_lowercase(),
            Target::Service { name, host, port } => {
                format!("{}@{}:{}", name.to_lowercase(), host.to_lowercase(), port)
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Strip scheme, `www.` prefixes and any path, then check the result looks like a domain
pub fn normalize_domain(raw: &str) -> Result<String> {
    let lowered = raw.trim().to_lowercase();

    let mut domain = lowered.as_str();
    if let Some(rest) = domain.strip_prefix("http://") {
        domain = rest;
    } else if let Some(rest) = domain.strip_prefix("https://") {
        domain = rest;
    }
    while let Some(rest) = domain.strip_prefix("www.") {
        domain = rest;
    }
    if let Some((host, _path)) = domain.split_once('/') {
        domain = host;
    }

    if domain.is_empty() {
        return Err(AppError::validation(format!("'{}' is empty after normalization", raw.trim())));
    }
    if !domain.contains('.') {
        return Err(AppError::validation(format!("'{}' is not a domain", raw.trim())));
    }
    if domain.chars().any(char::is_whitespace) {
        return Err(AppError::validation(format!("'{}' contains whitespace", raw.trim())));
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::validation(format!("'{}' has an empty label", raw.trim())));
    }

    Ok(domain.to_string())
}

/// Result of adding a target to a [`TargetSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The target was new and has been appended
    Added(Target),
    /// An equivalent target was already present; nothing changed
    Duplicate(Target),
}

/// Ordered, duplicate-free list of targets for a check run
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, normalize and append a domain
    pub fn add(&mut self, raw_domain: &str) -> Result<AddOutcome> {
        let target = Target::domain(raw_domain)?;
        Ok(self.insert(target))
    }

    /// Validate and append a `name@host:port` service
    pub fn add_service(&mut self, spec: &str) -> Result<AddOutcome> {
        let target = Target::service(spec)?;
        Ok(self.insert(target))
    }

    /// Append an already-built target unless an equivalent one exists
    pub fn insert(&mut self, target: Target) -> AddOutcome {
        let key = target.key();
        if self.targets.iter().any(|existing| existing.key() == key) {
            AddOutcome::Duplicate(target)
        } else {
            self.targets.push(target.clone());
            AddOutcome::Added(target)
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Transport used for one probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    Https,
    Http,
    Tcp,
}

impl Transport {
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Https => "https",
            Transport::Http => "http",
            Transport::Tcp => "tcp",
        }
    }
}

/// Kind of link the device is using
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    WiFi,
    Mobile,
    Ethernet,
    Vpn,
    #[default]
    Unknown,
}

impl ConnectionType {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionType::WiFi => "Wi-Fi",
            ConnectionType::Mobile => "Mobile Data",
            ConnectionType::Ethernet => "Ethernet",
            ConnectionType::Vpn => "VPN",
            ConnectionType::Unknown => "Unknown",
        }
    }

    pub fn is_wifi(&self) -> bool {
        matches!(self, ConnectionType::WiFi)
    }
}

impl std::str::FromStr for ConnectionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        if lowered.starts_with("wi-fi") || lowered.starts_with("wifi") || lowered.starts_with("wlan") {
            Ok(ConnectionType::WiFi)
        } else if lowered.starts_with("mobile") || lowered.starts_with("cellular") {
            Ok(ConnectionType::Mobile)
        } else if lowered.starts_with("ethernet") {
            Ok(ConnectionType::Ethernet)
        } else if lowered.starts_with("vpn") {
            Ok(ConnectionType::Vpn)
        } else if lowered.starts_with("unknown") {
            Ok(ConnectionType::Unknown)
        } else {
            Err(AppError::parse(format!("Unknown connection type: {}", s)))
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// VPN transport protocols the platform layer reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VpnProtocol {
    Vless,
    Vmess,
    Trojan,
    Shadowsocks,
    WireGuard,
    OpenVpn,
}

impl VpnProtocol {
    /// Fixed scan order
    pub const ALL: [VpnProtocol; 6] = [
        VpnProtocol::Vless,
        VpnProtocol::Vmess,
        VpnProtocol::Trojan,
        VpnProtocol::Shadowsocks,
        VpnProtocol::WireGuard,
        VpnProtocol::OpenVpn,
    ];

    /// Upper-case name as printed by the platform report
    pub fn name(&self) -> &'static str {
        match self {
            VpnProtocol::Vless => "VLESS",
            VpnProtocol::Vmess => "VMESS",
            VpnProtocol::Trojan => "TROJAN",
            VpnProtocol::Shadowsocks => "SHADOWSOCKS",
            VpnProtocol::WireGuard => "WIREGUARD",
            VpnProtocol::OpenVpn => "OPENVPN",
        }
    }

    /// `[NAME]` marker used in the platform report
    pub fn marker(&self) -> String {
        format!("[{}]", self.name())
    }
}

impl fmt::Display for VpnProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Well-known sites tracked by name in the snapshot: (domain substring, display name)
pub const NAMED_DOMAINS: &[(&str, &str)] = &[
    ("youtube.com", "YouTube"),
    ("telegram.org", "Telegram"),
    ("t.me", "Telegram"),
    ("telegram.me", "Telegram"),
    ("vk.com", "VK"),
    ("discord.com", "Discord"),
    ("rutracker.org", "RuTracker"),
    ("github.com", "GitHub"),
    ("google.com", "Google"),
];

/// Display name for a domain that is (or is a subdomain of) a named site
pub fn named_domain(domain: &str) -> Option<&'static str> {
    let domain = domain.to_lowercase();
    NAMED_DOMAINS
        .iter()
        .find(|(suffix, _)| domain == *suffix || domain.ends_with(&format!(".{}", suffix)))
        .map(|(_, name)| *name)
}
