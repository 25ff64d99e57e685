//! Elapsed working time between two instants, for reporting.

use chrono::{DateTime, Utc};

use crate::company::CompanyConfig;
use crate::time::{hours_between, local_date, local_instant};

/// Day-walk safety cap.
pub const MAX_BUSINESS_DAYS: usize = 1000;
/// Results never drop below this.
pub const MIN_BUSINESS_HOURS: f64 = 0.1;

/// Sum of the overlap between `[start, end]` and each local day's working
/// window.
pub fn calculate_business_duration(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &CompanyConfig,
) -> f64 {
    let tz = config.timezone;
    let last = local_date(end, tz);
    let mut date = local_date(start, tz);
    let mut total = 0.0;

    for _ in 0..MAX_BUSINESS_DAYS {
        if date > last {
            break;
        }
        let open = local_instant(date, config.day_start(), tz);
        let close = local_instant(date, config.day_end(), tz);
        let from = start.max(open);
        let to = end.min(close);
        if to > from {
            total += hours_between(from, to);
        }
        let Some(next) = date.succ_opt() else {
            break;
        };
        date = next;
    }

    total.max(MIN_BUSINESS_HOURS)
}
