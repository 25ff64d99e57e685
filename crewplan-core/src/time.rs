//! Time utilities: timestamp normalization and local-calendar bucketing.
//!
//! Two parsing paths exist and they are not symmetric:
//! - session timestamps are stored naive and mean UTC, so a missing zone
//!   suffix is normalized to `Z` ([`normalize_timestamp`]);
//! - task instants (`created_at`, `assigned_date`, ...) without a zone are read
//!   in the viewer's local zone ([`parse_instant`]).

use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use regex::Regex;

static ZONE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[Zz]|[+-]\d{2}:?\d{2})$").expect("zone suffix regex is valid")
});

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Accept `"2026-03-02 10:00:00"` as well as the `T` separator.
fn with_t_separator(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    if s.as_bytes().get(10) == Some(&b' ') {
        s.replace_range(10..=10, "T");
    }
    s
}

/// Whether the time part of a timestamp carries `Z` or a numeric offset.
pub fn has_zone_suffix(raw: &str) -> bool {
    let s = with_t_separator(raw);
    match s.split_once('T') {
        Some((_, time)) => ZONE_SUFFIX.is_match(time),
        None => false,
    }
}

/// Treat a zone-less timestamp as UTC by appending `Z`.
pub fn normalize_timestamp(raw: &str) -> String {
    let s = with_t_separator(raw);
    if s.is_empty() || has_zone_suffix(&s) {
        s
    } else {
        format!("{s}Z")
    }
}

fn parse_with_offset(s: &str) -> Option<DateTime<Utc>> {
    let s = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::<FixedOffset>::parse_from_str(&s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a session `start_time`/`end_time`. Zone-less values are UTC.
pub fn parse_session_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = normalize_timestamp(raw);
    if s.is_empty() {
        return None;
    }
    parse_with_offset(&s)
}

/// Parse a task instant. Zone-less values are local to `tz`; a bare date is
/// local midnight.
pub fn parse_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let s = with_t_separator(raw);
    if s.is_empty() {
        return None;
    }
    if has_zone_suffix(&s) {
        return parse_with_offset(&s);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;
    Some(resolve_local(naive, tz))
}

/// Map a local wall-clock time to an absolute instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are pushed forward past the gap.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }
    let shifted = naive + Duration::hours(1);
    match tz.from_local_datetime(&shifted).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => tz.from_utc_datetime(&naive).with_timezone(&Utc),
    }
}

pub fn local_date(dt: DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

/// `YYYY-MM-DD` from the local calendar fields. The day-bucketing key.
pub fn local_date_key(dt: DateTime<Utc>, tz: Tz) -> String {
    local_date(dt, tz).format("%Y-%m-%d").to_string()
}

/// `hours + minutes / 60` in local time. Seconds are dropped.
pub fn local_hour_of_day(dt: DateTime<Utc>, tz: Tz) -> f64 {
    let local = dt.with_timezone(&tz);
    f64::from(local.hour()) + f64::from(local.minute()) / 60.0
}

/// The instant at fractional `hour` of local `date`. `hour` may be 24.0.
pub fn local_instant(date: NaiveDate, hour: f64, tz: Tz) -> DateTime<Utc> {
    let seconds = (hour.clamp(0.0, 24.0) * 3600.0).round() as i64;
    let naive = date.and_time(NaiveTime::MIN) + Duration::seconds(seconds);
    resolve_local(naive, tz)
}

/// Elapsed hours between two instants.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}
