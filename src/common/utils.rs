//! Common utilities and helper functions
//!
//! Formatting and string-cleaning helpers shared by the manifest decoder,
//! the tag aggregator and the CLI.

use chrono::{DateTime, Utc};

/// Marker the Docker builder prefixes onto metadata-only instructions
pub const NOP_MARKER: &str = "/bin/sh -c #(nop)";

/// Length of the abbreviated image id shown in listings
pub const SHORT_ID_LEN: usize = 7;

/// Format utilities
pub struct FormatUtils;

impl FormatUtils {
    /// Format bytes as human readable size
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

        if bytes == 0 {
            return "0 B".to_string();
        }

        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Relative rendering of `time` as seen from `now`, e.g. "3 hours ago"
    pub fn time_ago_from(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let Some(time) = time else {
            return "never".to_string();
        };

        let secs = (now - time).num_seconds();
        if secs < 0 {
            return "in the future".to_string();
        }
        if secs < 10 {
            return "just now".to_string();
        }

        let (value, unit) = match secs {
            s if s < 60 => (s, "second"),
            s if s < 3_600 => (s / 60, "minute"),
            s if s < 86_400 => (s / 3_600, "hour"),
            s if s < 2_592_000 => (s / 86_400, "day"),
            s if s < 31_536_000 => (s / 2_592_000, "month"),
            s => (s / 31_536_000, "year"),
        };

        if value == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", value, unit)
        }
    }

    pub fn time_ago(time: Option<DateTime<Utc>>) -> String {
        Self::time_ago_from(time, Utc::now())
    }
}

/// Identifier and command-line cleaning utilities
pub struct IdUtils;

impl IdUtils {
    /// First seven characters of an image id, or the whole id when shorter
    pub fn short_id(id: &str) -> String {
        id.chars().take(SHORT_ID_LEN).collect()
    }

    /// Remove every occurrence of the builder no-op marker, leaving the rest untouched
    pub fn clean_command(command: &str) -> String {
        command.replace(NOP_MARKER, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(FormatUtils::format_bytes(0), "0 B");
        assert_eq!(FormatUtils::format_bytes(512), "512 B");
        assert_eq!(FormatUtils::format_bytes(1024), "1.00 KB");
        assert_eq!(FormatUtils::format_bytes(1536), "1.50 KB");
        assert_eq!(FormatUtils::format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(FormatUtils::time_ago_from(None, now), "never");
        assert_eq!(FormatUtils::time_ago_from(Some(now), now), "just now");
        assert_eq!(
            FormatUtils::time_ago_from(Some(now - Duration::seconds(45)), now),
            "45 seconds ago"
        );
        assert_eq!(
            FormatUtils::time_ago_from(Some(now - Duration::minutes(1)), now),
            "1 minute ago"
        );
        assert_eq!(
            FormatUtils::time_ago_from(Some(now - Duration::hours(5)), now),
            "5 hours ago"
        );
        assert_eq!(
            FormatUtils::time_ago_from(Some(now - Duration::days(400)), now),
            "1 year ago"
        );
        assert_eq!(
            FormatUtils::time_ago_from(Some(now + Duration::hours(1)), now),
            "in the future"
        );
    }

    #[test]
    fn test_short_id_clamps() {
        assert_eq!(IdUtils::short_id("9e7424e5dbae1e0e"), "9e7424e");
        assert_eq!(IdUtils::short_id("abc"), "abc");
        assert_eq!(IdUtils::short_id(""), "");
    }

    #[test]
    fn test_clean_command_strips_marker_only() {
        assert_eq!(
            IdUtils::clean_command("/bin/sh -c #(nop)  ADD file"),
            "  ADD file"
        );
        assert_eq!(IdUtils::clean_command("/bin/sh -c apk add curl"), "/bin/sh -c apk add curl");
    }
}
