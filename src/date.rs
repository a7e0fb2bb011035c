use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses the calendar date of a transaction date field
///
/// Accepted, in order: `YYYY-MM-DD`, RFC 3339, naive ISO date-times and
/// RFC 2822 (`Mon, 15 Jan 2024 00:00:00 GMT`, which is how the backend
/// encodes dates by default). Date-times keep the date as written, no time
/// zone conversion is applied.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Some(date_time.date_naive());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date_time.date());
        }
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|date_time| date_time.date_naive())
}

/// Whether both dates fall into the same calendar month of the same year
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// The first day of the month `date` is in
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plain_dates() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(" 2024-01-15 "), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn date_times_keep_their_written_date() {
        assert_eq!(parse_date("2024-01-15T23:30:00-05:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T23:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T23:30:00.250"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 08:00:00"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn http_dates() {
        assert_eq!(parse_date("Mon, 15 Jan 2024 00:00:00 GMT"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn months() {
        assert!(same_month(ymd(2024, 1, 1), ymd(2024, 1, 31)));
        assert!(!same_month(ymd(2024, 1, 1), ymd(2023, 1, 1)));
        assert!(!same_month(ymd(2024, 1, 31), ymd(2024, 2, 1)));
        assert_eq!(first_of_month(ymd(2024, 2, 29)), ymd(2024, 2, 1));
    }
}
