//! Topic help with examples and interpretation notes

use crate::config::env::EnvManager;
use crate::output::SECTIONS;
use colored::*;

/// Topic help printed by `--help-topic`
pub struct HelpSystem {
    platform: &'static str,
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpSystem {
    pub const TOPICS: &'static [&'static str] = &["targets", "platform", "output", "env", "examples"];

    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS,
        }
    }

    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "targets" | "domains" => Some(self.format_targets_help(use_colors)),
            "platform" | "report" => Some(self.format_platform_help(use_colors)),
            "output" => Some(self.format_output_help(use_colors)),
            "env" | "environment" | "config" => Some(self.format_environment_help(use_colors)),
            "examples" => Some(self.format_examples(use_colors)),
            _ => None,
        }
    }

    fn header(&self, text: &str, use_colors: bool) -> String {
        if use_colors {
            format!("{}\n\n", text.bright_green().bold())
        } else {
            format!("{}\n\n", text)
        }
    }

    fn format_targets_help(&self, use_colors: bool) -> String {
        let mut help = self.header("TARGETS:", use_colors);
        help.push_str("Domains are normalized before probing:\n");
        help.push_str("  - http:// or https:// and any leading www. are stripped\n");
        help.push_str("  - everything after the first / is dropped\n");
        help.push_str("  - the result must contain a dot; repeats are ignored\n\n");
        help.push_str("Each domain gets HTTPS HEAD attempts with backoff, then one plain HTTP\n");
        help.push_str("attempt if every HTTPS attempt was blocked or timed out.\n\n");
        help.push_str("Services are written name@host:port and checked with a TCP connect.\n");
        help.push_str("Domains on the known-reachable list are reported reachable without probing.\n");
        help
    }

    fn format_platform_help(&self, use_colors: bool) -> String {
        let mut help = self.header("PLATFORM REPORT:", use_colors);
        help.push_str("--platform-report reads the text produced by the device diagnostic tool.\n");
        help.push_str("Recognized lines include:\n");
        for example in [
            "[TYPE] Wi-Fi",
            "[VPN] ACTIVE VLESS",
            "Download speed: ~12.3 Mbps",
            "Average ping: 45 ms",
            "Packet loss: 0.5%",
            "[SHADOWSOCKS] BLOCKED",
            "youtube.com - BLOCKED",
            "DPI Detection: [DETECTED]",
        ] {
            help.push_str(&format!("  {}\n", example));
        }
        help.push_str(&format!(
            "\nWithout a report the connection block shows Unknown (platform: {}).\n",
            self.platform
        ));
        help
    }

    fn format_output_help(&self, use_colors: bool) -> String {
        let mut help = self.header("OUTPUT:", use_colors);
        help.push_str("Report sections, always in this order:\n");
        for name in SECTIONS {
            help.push_str(&format!("  {}\n", name));
        }
        help.push_str("\nSpeeds and packet loss use one decimal place, ping none.\n");
        help.push_str("--json prints the snapshot and conclusion instead of the text report.\n");
        help.push_str("--save writes network_diagnostic_YYYY-MM-DD_HH-MM-SS.txt to --report-dir.\n");
        help.push_str("Progress lines go to stderr, the report to stdout.\n");
        help
    }

    fn format_environment_help(&self, use_colors: bool) -> String {
        let mut help = self.header("ENVIRONMENT VARIABLES:", use_colors);
        help.push_str("Priority: CLI arguments > environment > .env file > defaults\n\n");
        for (name, description, example) in EnvManager::get_supported_env_vars() {
            if use_colors {
                help.push_str(&format!("  {}: {}\n", name.bright_yellow().bold(), description));
            } else {
                help.push_str(&format!("  {}: {}\n", name, description));
            }
            help.push_str(&format!("      e.g. {}={}\n", name, example));
        }
        help
    }

    fn format_examples(&self, use_colors: bool) -> String {
        let mut help = self.header("EXAMPLES:", use_colors);
        let examples = [
            ("Default targets", "nau"),
            ("Check specific sites", "nau -d youtube.com -d t.me --attempts 3"),
            ("Include a VPN endpoint", "nau --service wireguard@vpn.example.org:51820"),
            ("Use a device report and save", "nau -p diag.txt --save --report-dir reports"),
            ("Machine-readable output", "nau --json --no-color"),
        ];
        for (title, command) in examples {
            if use_colors {
                help.push_str(&format!("  {}\n    {}\n", title.bright_cyan(), command.bright_white()));
            } else {
                help.push_str(&format!("  {}\n    {}\n", title, command));
            }
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_topic_renders() {
        let help = HelpSystem::new();
        for topic in HelpSystem::TOPICS {
            let text = help.display_topic_help(topic, false).unwrap();
            assert!(!text.is_empty(), "{}", topic);
        }
        assert!(help.display_topic_help("dns", false).is_none());
    }

    #[test]
    fn test_env_topic_lists_variables() {
        let text = HelpSystem::new().display_topic_help("env", false).unwrap();
        assert!(text.contains("TARGET_DOMAINS"));
        assert!(text.contains("MARK_ABANDONED"));
    }
}
