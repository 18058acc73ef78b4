use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Canonical join key for one hourly observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeKey {
    pub ts: NaiveDateTime,
    pub day: NaiveDate,
    pub hour: String,
}

fn day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("valid regex"))
}

fn hour_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}:\d{2})").expect("valid regex"))
}

fn embedded_hour_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"T(\d{2}:\d{2})").expect("valid regex"))
}

/// Reconcile the date/hour string shapes the four endpoints return into
/// one canonical key. Priority: leading `HH:MM` of the dedicated hour
/// field, else `HH:MM` after the `T` inside the date field, else
/// `"00:00"`. Rows that do not combine into a valid timestamp are
/// dropped (`None`), not raised.
pub fn normalize_time_key(date_raw: &str, hour_raw: Option<&str>) -> Option<TimeKey> {
    let day_str = day_re().captures(date_raw)?.get(1)?.as_str();
    let day = NaiveDate::parse_from_str(day_str, "%Y-%m-%d").ok()?;

    let hour = hour_raw
        .and_then(|h| hour_re().captures(h))
        .or_else(|| embedded_hour_re().captures(date_raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "00:00".to_string());

    let time = NaiveTime::parse_from_str(&hour, "%H:%M").ok()?;
    Some(TimeKey {
        ts: day.and_time(time),
        day,
        hour,
    })
}
