//! Human-friendly durations such as `"2s"`, `"30m"` or `"1d"`.

use std::time::Duration;

/// Parse an interval string like "1h", "30m", "6h", "1d", "45s" or raw seconds.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let (value, unit, secs_per_unit) = if let Some(hours) = s.strip_suffix('h') {
        (hours, "hours", 3600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, "minutes", 60)
    } else if let Some(days) = s.strip_suffix('d') {
        (days, "days", 86400)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, "seconds", 1)
    } else {
        let secs = s
            .parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '2s', '30m', '1h'", s))?;
        return Ok(Duration::from_secs(secs));
    };

    let count = value
        .parse::<u64>()
        .map_err(|_| format!("Invalid {}: {}", unit, value))?;
    let secs = count
        .checked_mul(secs_per_unit)
        .ok_or_else(|| format!("Interval too large: {}", s))?;

    Ok(Duration::from_secs(secs))
}

/// Format an interval for display, using the largest unit that divides it.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else if secs == 0 && !interval.is_zero() {
        format!("{}ms", interval.as_millis())
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_interval("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_interval("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_interval("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_interval(" 90 ").unwrap(), Duration::from_secs(90));
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("h").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_overflow() {
        let err = parse_interval("18446744073709551615h").unwrap_err();
        assert!(err.contains("too large"));
        assert!(parse_interval("999999999999999999d").is_err());
        assert_eq!(
            parse_interval("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(3600)), "1h");
        assert_eq!(format_interval(Duration::from_secs(1800)), "30m");
        assert_eq!(format_interval(Duration::from_secs(86400)), "1d");
        assert_eq!(format_interval(Duration::from_secs(90)), "90s");
        assert_eq!(format_interval(Duration::from_millis(250)), "250ms");
    }
}
