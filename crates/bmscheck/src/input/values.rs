//! Raw cell value parsing for readings and timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Datetime layouts seen in BMS trend exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    // Niagara history export, e.g. "15-Jan-24 10:15:00 AM"
    "%d-%b-%y %I:%M:%S %p",
    "%d-%b-%Y %I:%M:%S %p",
    "%d-%b-%y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// On/off style words accepted as binary status readings.
const STATUS_WORDS: &[(&str, f64)] = &[
    ("on", 1.0),
    ("off", 0.0),
    ("true", 1.0),
    ("false", 0.0),
    ("active", 1.0),
    ("inactive", 0.0),
    ("open", 1.0),
    ("closed", 0.0),
    ("yes", 1.0),
    ("no", 0.0),
];

/// Parse a trimmed cell as a finite numeric reading.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Map an on/off style word to 1.0 / 0.0.
pub fn parse_status_word(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    STATUS_WORDS
        .iter()
        .find(|(word, _)| trimmed.eq_ignore_ascii_case(word))
        .map(|(_, value)| *value)
}

/// Parse a cell as a reading, accepting status words when `allow_status` is set.
pub fn parse_reading(raw: &str, allow_status: bool) -> Option<f64> {
    parse_number(raw).or_else(|| {
        if allow_status {
            parse_status_word(raw)
        } else {
            None
        }
    })
}

/// Parse a cell as a timestamp.
///
/// Offsets are normalized to UTC. A trailing zone abbreviation such as
/// `EST` is ignored.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if !looks_like_timestamp(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    let text = strip_zone_abbreviation(trimmed);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Render a timestamp in ISO 8601 form.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn looks_like_timestamp(s: &str) -> bool {
    s.len() >= 8
        && s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes().any(|b| matches!(b, b'-' | b'/' | b':'))
}

fn strip_zone_abbreviation(s: &str) -> &str {
    match s.rsplit_once(' ') {
        Some((head, tail))
            if (2..=5).contains(&tail.len())
                && tail.bytes().all(|b| b.is_ascii_alphabetic())
                && !tail.eq_ignore_ascii_case("am")
                && !tail.eq_ignore_ascii_case("pm") =>
        {
            head.trim_end()
        }
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 72.5 "), Some(72.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("72.5F"), None);
    }

    #[test]
    fn test_status_words_only_when_allowed() {
        assert_eq!(parse_reading("ON", true), Some(1.0));
        assert_eq!(parse_reading("Closed", true), Some(0.0));
        assert_eq!(parse_reading("ON", false), None);
        assert_eq!(parse_reading("1", false), Some(1.0));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();

        for raw in [
            "2024-01-15 10:15:00",
            "2024-01-15T10:15:00",
            "2024-01-15 10:15",
            "2024/01/15 10:15:00",
            "01/15/2024 10:15",
            "01/15/2024 10:15:00 AM",
            "15-Jan-24 10:15:00 AM EST",
            "2024-01-15T10:15:00Z",
            "2024-01-15T05:15:00-05:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "failed on {raw}");
        }
    }

    #[test]
    fn test_parse_timestamp_date_only_and_rejects() {
        let ts = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(ts.hour(), 0);
        assert!(parse_timestamp("72.5").is_none());
        assert!(parse_timestamp("12345678").is_none());
        assert!(parse_timestamp("AHU1_SAT").is_none());
        assert!(parse_timestamp("2024-13-45 99:00").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = parse_timestamp("2024-01-15 10:15").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T10:15:00");
    }
}
