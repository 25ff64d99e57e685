//! Duration parsing and display.
//!
//! Storage holds effort either as an hour count (`4`, `"2.5"`) or as `"H:MM"`.
//! Everything is normalized to fractional hours.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HOURS_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<h>\d+):(?P<m>\d{1,2})$").expect("H:MM regex is valid")
});

/// A duration as it arrives from storage: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Hours(f64),
    Text(String),
}

impl RawDuration {
    pub fn hours(&self) -> f64 {
        match self {
            RawDuration::Hours(h) => sanitize(*h),
            RawDuration::Text(s) => parse_duration_to_hours(s),
        }
    }
}

fn sanitize(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

/// `"H:MM"` → `H + M/60`; numeric strings parse as-is; anything else is 0.
pub fn parse_duration_to_hours(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() {
        return 0.0;
    }

    if let Some(caps) = HOURS_MINUTES.captures(value) {
        let h: f64 = caps["h"].parse().unwrap_or(0.0);
        let m: f64 = caps["m"].parse().unwrap_or(0.0);
        return sanitize(h + m / 60.0);
    }

    value.parse::<f64>().map(sanitize).unwrap_or(0.0)
}

/// Human display: `"45 min"`, `"1 hr"`, `"2 hr 30 min"`.
pub fn format_duration(hours: f64) -> String {
    let total_minutes = (sanitize(hours) * 60.0).round() as i64;
    if total_minutes == 0 {
        return "0 min".to_string();
    }

    let h = total_minutes / 60;
    let m = total_minutes % 60;
    match (h, m) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} hr"),
        (h, m) => format!("{h} hr {m} min"),
    }
}

/// `"H:MM"` form of fractional hours, the shape `parse_duration_to_hours` reads.
pub fn format_hours_as_hmm(hours: f64) -> String {
    let total_minutes = (sanitize(hours) * 60.0).round() as i64;
    format!("{}:{:02}", total_minutes / 60, total_minutes % 60)
}
