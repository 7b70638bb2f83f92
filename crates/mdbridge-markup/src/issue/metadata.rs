//! Issue summary and time-estimate extraction from markdown source.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

/// Marker phrase that starts the estimate footer of an issue document.
pub const DEFAULT_ESTIMATE_MARKER: &str = "Estimated Time Frame";

static DAY_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*-\s*(\d+)\s*days?").unwrap());
static DAYS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*days?").unwrap());
static TIME_ESTIMATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([wdhms])$").unwrap());

/// Markdown split at the estimate marker line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EstimateSplit {
    /// Content before the marker line. The marker line itself is excluded.
    pub content: String,
    /// Day count parsed from the marker line (upper bound of a range).
    pub days: Option<u32>,
    /// Whether a marker line was found at all.
    pub marker_found: bool,
}

impl EstimateSplit {
    /// The day count as an estimate string such as `"5d"`.
    #[must_use]
    pub fn estimate(&self) -> Option<String> {
        self.days.map(|days| format!("{days}d"))
    }

    /// The day count as a duration.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.estimate().as_deref().and_then(parse_time_estimate)
    }
}

/// First line of the markdown with `#` characters and surrounding whitespace removed.
#[must_use]
pub fn extract_title(markdown: &str) -> String {
    markdown
        .lines()
        .next()
        .unwrap_or_default()
        .replace('#', "")
        .trim()
        .to_owned()
}

/// Cut the markdown at the first line containing `marker`.
///
/// The marker line is parsed for `N days` or `A-B days` (the range resolves to
/// `B`). Everything from the marker line onward is dropped, even when no day
/// count can be parsed. Without a marker the content is returned unchanged.
#[must_use]
pub fn split_at_estimate(markdown: &str, marker: &str) -> EstimateSplit {
    if marker.is_empty() {
        return EstimateSplit {
            content: markdown.to_owned(),
            ..EstimateSplit::default()
        };
    }

    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        if line.contains(marker) {
            let days = parse_days(line);
            match days {
                Some(days) => info!("Estimated time: {days}d"),
                None => warn!("No day count found in estimate line: {}", line.trim()),
            }
            return EstimateSplit {
                content: markdown[..offset].to_owned(),
                days,
                marker_found: true,
            };
        }
        offset += line.len();
    }

    EstimateSplit {
        content: markdown.to_owned(),
        ..EstimateSplit::default()
    }
}

fn parse_days(line: &str) -> Option<u32> {
    if let Some(caps) = DAY_RANGE_RE.captures(line) {
        let low = caps[1].parse::<u32>().ok()?;
        let high = caps[2].parse::<u32>().ok()?;
        return Some(low.max(high));
    }
    DAYS_RE
        .captures(line)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

/// Parse an estimate such as `2h`, `1d`, `30m`, `1w`, `3600s` or `1.5h`.
///
/// Fractions of a second are truncated. Returns `None` (with a warning) when the
/// value does not parse.
#[must_use]
pub fn parse_time_estimate(value: &str) -> Option<Duration> {
    let normalized = value.trim().to_ascii_lowercase();
    let Some(caps) = TIME_ESTIMATE_RE.captures(&normalized) else {
        warn!("Invalid time estimate format: {value}");
        return None;
    };

    let amount: f64 = caps[1].parse().ok()?;
    let unit_seconds: f64 = match &caps[2] {
        "w" => 604_800.0,
        "d" => 86_400.0,
        "h" => 3_600.0,
        "m" => 60.0,
        _ => 1.0,
    };

    match Duration::try_from_secs_f64(amount * unit_seconds) {
        Ok(duration) => Some(Duration::from_secs(duration.as_secs())),
        Err(e) => {
            warn!("Time estimate out of range: {value}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("# My Title\n\nbody"), "My Title");
        assert_eq!(extract_title("### Deep ##\n"), "Deep");
        assert_eq!(extract_title("Plain first line\nmore"), "Plain first line");
        assert_eq!(extract_title(""), "");
    }

    #[test]
    fn test_split_at_day_range() {
        let markdown = "# Task\n\nDo things.\n\nEstimated Time Frame: 2-5 days\n\nFooter";
        let split = split_at_estimate(markdown, DEFAULT_ESTIMATE_MARKER);
        assert_eq!(split.content, "# Task\n\nDo things.\n\n");
        assert_eq!(split.days, Some(5));
        assert_eq!(split.estimate().as_deref(), Some("5d"));
        assert_eq!(split.duration(), Some(Duration::from_secs(5 * 86_400)));
        assert!(split.marker_found);
    }

    #[test]
    fn test_split_single_day_count() {
        let split = split_at_estimate("Body\n## Estimated Time Frame: 3 days\n", DEFAULT_ESTIMATE_MARKER);
        assert_eq!(split.content, "Body\n");
        assert_eq!(split.days, Some(3));
    }

    #[test]
    fn test_marker_line_is_excluded_without_day_count() {
        let split = split_at_estimate("Body\nEstimated Time Frame: soon\nAfter", DEFAULT_ESTIMATE_MARKER);
        assert_eq!(split.content, "Body\n");
        assert_eq!(split.days, None);
        assert!(split.marker_found);
    }

    #[test]
    fn test_without_marker_keeps_everything() {
        let markdown = "Line one\nLine two\nLast line";
        let split = split_at_estimate(markdown, DEFAULT_ESTIMATE_MARKER);
        assert_eq!(split.content, markdown);
        assert_eq!(split.days, None);
        assert!(!split.marker_found);
    }

    #[test]
    fn test_custom_marker() {
        let split = split_at_estimate("A\nEffort: 1 day\nB", "Effort");
        assert_eq!(split.content, "A\n");
        assert_eq!(split.days, Some(1));
    }

    #[test]
    fn test_parse_time_estimate_units() {
        assert_eq!(parse_time_estimate("1w"), Some(Duration::from_secs(604_800)));
        assert_eq!(parse_time_estimate("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_time_estimate("2h"), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_time_estimate("30m"), Some(Duration::from_secs(1_800)));
        assert_eq!(parse_time_estimate("3600s"), Some(Duration::from_secs(3_600)));
    }

    #[test]
    fn test_parse_time_estimate_fraction_and_case() {
        assert_eq!(parse_time_estimate("1.5h"), Some(Duration::from_secs(5_400)));
        assert_eq!(parse_time_estimate(" 2 H "), Some(Duration::from_secs(7_200)));
    }

    #[test]
    fn test_parse_time_estimate_invalid() {
        assert_eq!(parse_time_estimate(""), None);
        assert_eq!(parse_time_estimate("two hours"), None);
        assert_eq!(parse_time_estimate("5y"), None);
        assert_eq!(parse_time_estimate("-1h"), None);
    }
}
