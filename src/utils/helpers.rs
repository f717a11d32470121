/// Helper functions for interval parsing and display

use std::time::Duration;

/// Refresh interval used when none (or an unusable one) is given
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

/// Longest refresh interval accepted; anything above is treated as unusable
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Parse a refresh interval.
///
/// Plain numbers are seconds and may be fractional (`0.1`, `2`); humantime
/// literals such as `500ms` are accepted as well. Zero, negative, unparsable
/// and longer-than-a-day values yield `None`.
pub fn parse_interval(raw: &str) -> Option<Duration> {
    let raw = raw.trim();

    let parsed = match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Duration::try_from_secs_f64(secs).ok(),
        Ok(_) => None,
        Err(_) => humantime::parse_duration(raw).ok(),
    };

    parsed.filter(|interval| !interval.is_zero() && *interval <= MAX_INTERVAL)
}

/// Format a duration as whole milliseconds, e.g. `12ms`
pub fn format_millis(duration: Duration) -> String {
    format!("{:.0}ms", duration.as_secs_f64() * 1000.0)
}
