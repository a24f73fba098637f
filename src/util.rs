// Utility helpers for parsing and number formatting.
//
// Every coercion here returns `None` instead of failing, so a dirty cell
// turns into a missing value and the rest of the row still loads.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];
// Offset-carrying layouts; the calendar date is taken in the stated offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Parse a numeric cell.
///
/// - Trims whitespace.
/// - Empty cells and `NaN` are missing.
/// - Thousands separators are not accepted; `"1,000"` is missing.
/// - `inf` / `-inf` parse to infinities like any float literal.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_nan() {
        return None;
    }
    Some(v)
}

/// Parse an integral label such as a week or month number.
///
/// Accepts `"7"` and `"7.0"` alike; a fractional or non-finite value is
/// missing.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let v = parse_f64_safe(s)?;
    if !v.is_finite() || v.fract() != 0.0 {
        return None;
    }
    if v < i64::MIN as f64 || v > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

/// Parse a date or datetime cell into its calendar date.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    None
}

/// Render a possibly-missing value at full precision.
///
/// Takes `&Option<f64>` so it can be used as a `tabled` display hook.
pub fn display_value(v: &Option<f64>) -> String {
    match v {
        Some(x) => x.to_string(),
        None => "NaN".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_coerce_or_go_missing() {
        assert_eq!(parse_f64_safe(Some(" 12.5 ")), Some(12.5));
        assert_eq!(parse_f64_safe(Some("N/A")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("1,000")), None);
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_f64_safe(Some("inf")), Some(f64::INFINITY));
    }

    #[test]
    fn week_labels_must_be_integral() {
        assert_eq!(parse_i64_safe(Some("7")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.0")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.5")), None);
        assert_eq!(parse_i64_safe(Some("inf")), None);
        assert_eq!(parse_i64_safe(Some("week 7")), None);
    }

    #[test]
    fn dates_accept_common_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date_safe(Some("2024-03-09")), Some(d));
        assert_eq!(parse_date_safe(Some("03/09/2024")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-03-09 17:45:00")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-03-09T17:45:00.123")), Some(d));
        assert_eq!(parse_date_safe(Some("yesterday")), None);
        assert_eq!(parse_date_safe(Some("2024-03-09 23:59:59 extra")), None);
        assert_eq!(parse_date_safe(Some("2024-02-30")), None);
    }

    #[test]
    fn timestamps_without_seconds_keep_their_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(parse_date_safe(Some("2024-01-03 17:45")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03T17:45")), Some(d));
        assert_eq!(parse_date_safe(Some("01/03/2024 17:45:10")), Some(d));
    }

    #[test]
    fn timestamps_with_offsets_keep_their_local_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(parse_date_safe(Some("2024-01-03T17:45:00Z")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03T17:45:00+05:30")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03T23:30:00.250-08:00")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03 17:45:00+0530")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03 17:45:00+05:30")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-01-03T17:45+05:30")), Some(d));
    }

    #[test]
    fn display_keeps_full_precision() {
        assert_eq!(display_value(&Some(30000.0)), "30000");
        assert_eq!(display_value(&Some(1.0 / 3.0)), (1.0f64 / 3.0).to_string());
        assert_eq!(display_value(&Some(f64::INFINITY)), "inf");
        assert_eq!(display_value(&None), "NaN");
        assert_eq!(format_int(12345usize), "12,345");
    }
}
