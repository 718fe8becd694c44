//! Resolution of time strings (`yesterday`, `-2 hours`, `2024-01-31`) to Unix timestamps.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::value::{parse_number, Value};

/// Resolves `text` to a Unix timestamp (seconds, UTC) relative to `now`.
///
/// Accepted forms:
/// - plain numbers, taken as timestamps
/// - `now`, `today`, `yesterday`, `tomorrow` (the latter three at midnight)
/// - relative offsets: `-1 day`, `+2 hours`, `30 minutes`, `3 weeks ago`
/// - `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and RFC 3339
///
/// Returns `None` if the text is not understood.
pub fn resolve_timestamp(text: &str, now: DateTime<Utc>) -> Option<i64> {
    let trimmed = text.trim();
    if let Some(n) = parse_number(trimmed) {
        return Some(n as i64);
    }

    let lower = trimmed.to_lowercase();
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    match lower.as_str() {
        "now" => return Some(now.timestamp()),
        "today" => return Some(midnight.timestamp()),
        "yesterday" => return Some((midnight - Duration::days(1)).timestamp()),
        "tomorrow" => return Some((midnight + Duration::days(1)).timestamp()),
        _ => {}
    }

    if let Some(offset) = parse_relative(&lower) {
        return Some((now + offset).timestamp());
    }

    parse_absolute(trimmed)
}

/// Resolves a [`Value`] to a timestamp. Numbers are taken as they are.
pub fn resolve_value(value: &Value, now: DateTime<Utc>) -> Option<i64> {
    match value {
        Value::Number(n) => Some(*n as i64),
        Value::String(s) => resolve_timestamp(s, now),
        Value::Null | Value::Bool(_) => None,
    }
}

/// Parses `[+|-]N unit[s]` or `N unit[s] ago` into a signed duration.
fn parse_relative(text: &str) -> Option<Duration> {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    let mut sign = 1i64;
    if words.last() == Some(&"ago") {
        words.pop();
        sign = -1;
    }

    let (amount, unit) = match words.as_slice() {
        [amount, unit] => (*amount, *unit),
        // "-2hours" style without a space
        [joined] => {
            let split = joined
                .char_indices()
                .find(|(_, c)| c.is_alphabetic())
                .map(|(idx, _)| idx)?;
            (&joined[..split], &joined[split..])
        }
        _ => return None,
    };

    let amount: i64 = amount.strip_prefix('+').unwrap_or(amount).parse().ok()?;
    let unit = unit.strip_suffix('s').unwrap_or(unit);
    let seconds = match unit {
        "sec" | "second" => 1,
        "min" | "minute" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        "week" => 7 * 86_400,
        "month" => 30 * 86_400,
        "year" => 365 * 86_400,
        _ => return None,
    };
    Some(Duration::seconds(sign * amount * seconds))
}

/// Parses absolute dates and date-times, interpreted as UTC.
fn parse_absolute(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(resolve_timestamp("1700000000", now()), Some(1_700_000_000));
        assert_eq!(resolve_value(&Value::Number(42.0), now()), Some(42));
    }

    #[test]
    fn test_keywords() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap().timestamp();
        assert_eq!(resolve_timestamp("now", now()), Some(now().timestamp()));
        assert_eq!(resolve_timestamp("Today", now()), Some(midnight));
        assert_eq!(resolve_timestamp("yesterday", now()), Some(midnight - 86_400));
        assert_eq!(resolve_timestamp("tomorrow", now()), Some(midnight + 86_400));
    }

    #[test]
    fn test_relative_offsets() {
        let base = now().timestamp();
        assert_eq!(resolve_timestamp("-1 day", now()), Some(base - 86_400));
        assert_eq!(resolve_timestamp("+2 hours", now()), Some(base + 7_200));
        assert_eq!(resolve_timestamp("30 minutes ago", now()), Some(base - 1_800));
        assert_eq!(resolve_timestamp("-2hours", now()), Some(base - 7_200));
        assert_eq!(resolve_timestamp("1 week", now()), Some(base + 604_800));
    }

    #[test]
    fn test_absolute_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap().timestamp();
        assert_eq!(resolve_timestamp("2024-01-31", now()), Some(expected));
        assert_eq!(
            resolve_timestamp("2024-01-31 10:00:00", now()),
            Some(expected + 36_000)
        );
        assert_eq!(
            resolve_timestamp("2024-01-31T10:00:00+00:00", now()),
            Some(expected + 36_000)
        );
    }

    #[test]
    fn test_unknown_strings() {
        assert_eq!(resolve_timestamp("whenever", now()), None);
        assert_eq!(resolve_timestamp("3 fortnights", now()), None);
        assert_eq!(resolve_value(&Value::Null, now()), None);
    }
}
