//! Lenient date coercion.
//!
//! Every coercion returns an `Option`: a cell that cannot be read as a date is
//! simply not a date, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::CellValue;

/// Coerce a cell to a calendar date using the given `chrono` format strings.
///
/// Typed dates pass through, timestamps are truncated to their date, text is
/// tried as RFC 3339 first and then against each format in order (datetime
/// formats are tried before date-only ones by the caller's ordering).
pub fn coerce_date(value: &CellValue, formats: &[String]) -> Option<NaiveDate> {
    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s, formats),
        _ => None,
    }
}

/// Parse free text as a date. Empty or whitespace-only text never parses.
pub fn parse_date_text(text: &str, formats: &[String]) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(trimmed, fmt)
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(trimmed, fmt))
            .ok()
    })
}

/// Days since 1970-01-01, the axis used for date histograms.
pub fn epoch_days(date: NaiveDate) -> i64 {
    date.signed_duration_since(NaiveDate::default()).num_days()
}

/// Inverse of [`epoch_days`].
pub fn from_epoch_days(days: i64) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::try_days(days)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_date_formats;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        let formats = default_date_formats();
        assert_eq!(parse_date_text("2019-03-04", &formats), Some(ymd(2019, 3, 4)));
        assert_eq!(parse_date_text("2019/03/04", &formats), Some(ymd(2019, 3, 4)));
        assert_eq!(parse_date_text("04/03/2019", &formats), Some(ymd(2019, 3, 4)));
        assert_eq!(parse_date_text("2019-03-04 10:30:00", &formats), Some(ymd(2019, 3, 4)));
        assert_eq!(parse_date_text("2019-03-04T10:30:00Z", &formats), Some(ymd(2019, 3, 4)));
    }

    #[test]
    fn rejects_garbage_without_failing() {
        let formats = default_date_formats();
        assert_eq!(parse_date_text("J-12", &formats), None);
        assert_eq!(parse_date_text("", &formats), None);
        assert_eq!(parse_date_text("2019-02-30", &formats), None);
        assert_eq!(coerce_date(&CellValue::Integer(20190304), &formats), None);
        assert_eq!(coerce_date(&CellValue::Null, &formats), None);
    }

    #[test]
    fn typed_values_pass_through() {
        let dt = ymd(2021, 6, 1).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(coerce_date(&CellValue::DateTime(dt), &[]), Some(ymd(2021, 6, 1)));
        assert_eq!(coerce_date(&CellValue::Date(ymd(2021, 6, 1)), &[]), Some(ymd(2021, 6, 1)));
    }

    #[test]
    fn epoch_day_round_trip() {
        let d = ymd(2020, 2, 29);
        assert_eq!(from_epoch_days(epoch_days(d)), Some(d));
        assert_eq!(epoch_days(ymd(1970, 1, 2)), 1);
    }
}
