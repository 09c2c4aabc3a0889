use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, SeriesError};

/// Formats accepted for the `data` field of published records, most common
/// first.
const REPORT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a report timestamp such as `"2020-02-24T18:00:00"`.
///
/// Offsets (`Z`, `+01:00`) are accepted and dropped: report dates are local
/// wall-clock times and only their calendar day matters downstream. A bare
/// `YYYY-MM-DD` is read as midnight.
pub fn parse_report_date(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SeriesError::MalformedDate(s.to_string()));
    }

    for fmt in REPORT_DATE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(day_start(date));
    }

    Err(SeriesError::MalformedDate(s.to_string()))
}

/// Calendar day of a report timestamp, time-of-day discarded.
pub fn report_day(s: &str) -> Result<NaiveDate> {
    parse_report_date(s).map(|dt| dt.date())
}

/// Midnight at the start of `date`.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// `true` when both timestamps fall on the same year, month and day.
pub fn same_calendar_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}
