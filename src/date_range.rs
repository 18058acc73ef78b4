use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::errors::AnalyzerError;

/// Timestamp format the Transparency Platform expects, fixed +03:00 offset.
pub const ISO_FMT: &str = "%Y-%m-%dT%H:%M:%S+03:00";

fn month_start(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
        .unwrap_or(dt.date())
        .and_hms_opt(0, 0, 0)
        .unwrap_or(dt)
}

fn next_month(dt: NaiveDateTime) -> NaiveDateTime {
    let (y, m) = if dt.month() == 12 {
        (dt.year() + 1, 1)
    } else {
        (dt.year(), dt.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .unwrap_or(dt.date())
        .and_hms_opt(0, 0, 0)
        .unwrap_or(dt)
}

/// Split `[start, end]` into calendar-month request windows, each
/// formatted as an ISO-8601 pair with the fixed +03:00 suffix. The
/// upstream API caps a request window and keys some endpoints by
/// month-sensitive fields, so every window must stay inside one month.
pub fn month_ranges(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<(String, String)>, AnalyzerError> {
    if end < start {
        return Err(AnalyzerError::InvalidRange { start, end });
    }
    let mut ranges = Vec::new();
    let mut cursor = month_start(start);
    while cursor <= end {
        let boundary = next_month(cursor);
        let period_start = start.max(cursor);
        let period_end = end.min(boundary - Duration::days(1));
        ranges.push((
            period_start.format(ISO_FMT).to_string(),
            period_end.format(ISO_FMT).to_string(),
        ));
        cursor = boundary;
    }
    Ok(ranges)
}
