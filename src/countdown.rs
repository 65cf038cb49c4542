//! Countdown Formatter
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CountdownResult {
    Expired,
    Remaining { days: u64, hours: u64, minutes: u64 },
}

impl CountdownResult {
    pub fn is_expired(&self) -> bool {
        matches!(self, CountdownResult::Expired)
    }
}

/// Time left until `expiry`, measured from `now`
///
/// Both sides are absolute instants. Seconds are truncated, so anything
/// under a minute still in the future is `Remaining` with all zeros.
pub fn compute_remaining(expiry: DateTime<Utc>, now: DateTime<Utc>) -> CountdownResult {
    let left = expiry - now;
    if left <= Duration::zero() {
        return CountdownResult::Expired;
    }

    let total_minutes = u64::try_from(left.num_minutes()).unwrap_or(0);

    CountdownResult::Remaining {
        days: total_minutes / MINUTES_PER_DAY,
        hours: (total_minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR,
        minutes: total_minutes % MINUTES_PER_HOUR,
    }
}

pub fn compute_remaining_now(expiry: DateTime<Utc>) -> CountdownResult {
    compute_remaining(expiry, Utc::now())
}

impl fmt::Display for CountdownResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CountdownResult::Expired => f.write_str("Expired"),
            CountdownResult::Remaining { days, hours, .. } if days > 0 => {
                write!(f, "{}d {}h", days, hours)
            }
            CountdownResult::Remaining { hours, minutes, .. } if hours > 0 => {
                write!(f, "{}h {}m", hours, minutes)
            }
            CountdownResult::Remaining { minutes, .. } => write!(f, "{}m", minutes),
        }
    }
}
