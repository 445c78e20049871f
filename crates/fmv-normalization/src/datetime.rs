//! Date parsing against the configured format list.

use chrono::{Days, NaiveDate};

/// Parse a date using `formats` in order; the first format that matches wins.
///
/// An ISO datetime (`2024-01-31T08:00:00`, `2024-01-31 00:00:00`) is read by its
/// date part, which is how spreadsheet exports usually render date cells.
pub fn parse_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format.as_ref()) {
            return Some(date);
        }
    }
    iso_datetime_prefix(trimmed)
}

fn iso_datetime_prefix(value: &str) -> Option<NaiveDate> {
    let (date, time) = value.split_at_checked(10)?;
    if !time.starts_with(['T', ' ']) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Converts an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: i64) -> Option<NaiveDate> {
    if !(1..=2_958_465).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(u64::try_from(serial).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d", "%d-%b-%Y"];

    fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    #[test]
    fn first_matching_format_wins() {
        assert_eq!(parse_date("2024-03-05", FORMATS), ymd(2024, 3, 5));
        assert_eq!(parse_date("05/03/2024", FORMATS), ymd(2024, 3, 5));
        assert_eq!(parse_date("20240305", FORMATS), ymd(2024, 3, 5));
        assert_eq!(parse_date("05-Mar-2024", FORMATS), ymd(2024, 3, 5));
    }

    #[test]
    fn accepts_datetime_prefix() {
        assert_eq!(parse_date("2024-01-31 00:00:00", FORMATS), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T08:15:00", FORMATS), ymd(2024, 1, 31));
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(parse_date("", FORMATS), None);
        assert_eq!(parse_date("31/02/2024", FORMATS), None);
        assert_eq!(parse_date("pronto", FORMATS), None);
    }

    #[test]
    fn converts_excel_serials() {
        assert_eq!(excel_serial_to_date(45_292), ymd(2024, 1, 1));
        assert_eq!(excel_serial_to_date(0), None);
    }
}
