use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%Y/%m/%d"];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a free-form date into naive UTC.
///
/// Offsets are applied and then dropped, so every timestamp handed to the
/// scorer lives in the same frame. Anything unrecognised is `None`.
pub fn normalize(raw: Option<&str>) -> Option<NaiveDateTime> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, sec)
            .unwrap()
    }

    #[test]
    fn offset_is_converted_to_naive_utc() {
        assert_eq!(
            normalize(Some("2025-03-01T00:00:00+05:00")),
            Some(at(2025, 2, 28, 19, 0, 0))
        );
        assert_eq!(
            normalize(Some("2025-03-01T00:00:00-0130")),
            Some(at(2025, 3, 1, 1, 30, 0))
        );
    }

    #[test]
    fn trailing_z_and_fractional_seconds() {
        assert_eq!(
            normalize(Some("2025-06-10T08:15:30Z")),
            Some(at(2025, 6, 10, 8, 15, 30))
        );
        let frac = normalize(Some("2025-06-10T08:15:30.250+00:00")).unwrap();
        assert_eq!(frac.and_utc().timestamp_millis() % 1000, 250);
        assert!(normalize(Some("2025-06-10T08:15:30.5")).is_some());
    }

    #[test]
    fn plain_and_human_readable_dates() {
        let expected = Some(at(2025, 3, 7, 0, 0, 0));
        assert_eq!(normalize(Some("2025-03-07")), expected);
        assert_eq!(normalize(Some("2025/03/07")), expected);
        assert_eq!(normalize(Some("Mar 07, 2025")), expected);
        assert_eq!(normalize(Some("March 07, 2025")), expected);
        assert_eq!(normalize(Some("  2025-03-07  ")), expected);
    }

    #[test]
    fn unknown_inputs_yield_none() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(Some("yesterday")), None);
        assert_eq!(normalize(Some("2025-13-45")), None);
    }
}
