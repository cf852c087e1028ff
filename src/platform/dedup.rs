//! Line deduplication for platform diagnostic text

use std::collections::HashSet;

/// Headers that always open a new paragraph
pub const SECTION_HEADERS: &[&str] = &["VPN PROTOCOLS:", "PING TEST:"];

/// Trim lines, drop blanks and repeats, and separate known section headers
///
/// Repeats are exact matches after trimming; the first occurrence wins. A
/// header gets one blank line before it unless it is the first line emitted.
/// Blank input lines are always dropped, so the line before a header is never
/// blank and exactly one separator is added.
pub fn format_platform_text(input: &str) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || !seen.insert(line) {
            continue;
        }

        let is_header = SECTION_HEADERS.iter().any(|header| line.starts_with(header));
        if is_header && lines.last().is_some_and(|previous| !previous.is_empty()) {
            lines.push("");
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_drops_blank_and_repeated_lines() {
        let input = "  [TYPE] Wi-Fi \n\n[VPN] NOT ACTIVE\n[TYPE] Wi-Fi\n\t\n[VPN] NOT ACTIVE  ";
        assert_eq!(format_platform_text(input), "[TYPE] Wi-Fi\n[VPN] NOT ACTIVE");
    }

    #[test]
    fn test_headers_get_one_separator() {
        let input = "[TYPE] Wi-Fi\nPING TEST: 8.8.8.8\nAverage ping: 20 ms\n\n\nVPN PROTOCOLS: 6 tested\n[VLESS] OK";
        assert_eq!(
            format_platform_text(input),
            "[TYPE] Wi-Fi\n\nPING TEST: 8.8.8.8\nAverage ping: 20 ms\n\nVPN PROTOCOLS: 6 tested\n[VLESS] OK"
        );
    }

    #[test]
    fn test_leading_header_has_no_separator() {
        assert_eq!(format_platform_text("\n\nPING TEST:\nok"), "PING TEST:\nok");
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(format_platform_text("BLOCKED\nblocked"), "BLOCKED\nblocked");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_platform_text(""), "");
        assert_eq!(format_platform_text("\n \n"), "");
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z0-9 :%\\[\\]]{0,12}",
            Just(String::new()),
            Just("PING TEST:".to_string()),
            Just("VPN PROTOCOLS:".to_string()),
            Just("[TYPE] Wi-Fi".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_each_distinct_line_once_in_first_seen_order(lines in proptest::collection::vec(line_strategy(), 0..40)) {
            let input = lines.join("\n");
            let output = format_platform_text(&input);

            let mut expected: Vec<String> = Vec::new();
            for line in &lines {
                let trimmed = line.trim().to_string();
                if !trimmed.is_empty() && !expected.contains(&trimmed) {
                    expected.push(trimmed);
                }
            }
            let emitted: Vec<String> = output
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            prop_assert_eq!(emitted, expected);
        }

        #[test]
        fn prop_ping_header_after_text_gets_exactly_one_blank(before in "[a-z]{1,10}( [a-z]{1,10})?") {
            let output = format_platform_text(&format!("{}\nPING TEST:", before));
            prop_assert_eq!(output, format!("{}\n\nPING TEST:", before.trim()));
        }

        #[test]
        fn prop_ping_header_after_blank_gets_no_extra_blank(before in "[a-z]{1,10}", blanks in 1usize..4) {
            let input = format!("{}{}PING TEST:", before, "\n".repeat(blanks + 1));
            let output = format_platform_text(&input);
            prop_assert_eq!(output, format!("{}\n\nPING TEST:", before));
        }
    }
}
