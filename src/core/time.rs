use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width UTC timestamp; lexical order matches chronological order.
pub fn now_rfc3339() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generates_non_empty_timestamp() {
        assert!(!now_rfc3339().is_empty());
    }

    #[test]
    fn formats_with_fixed_microsecond_width() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-01T10:00:00.000000Z");
    }

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_timestamp("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(parsed), "2024-01-01T10:00:00.000000Z");
        assert!(parse_timestamp("yesterday").is_none());
    }
}
