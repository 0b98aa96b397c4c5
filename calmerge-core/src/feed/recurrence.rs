//! RRULE expansion for recurring feed entries.

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::constants::MAX_RECURRENCE_INSTANCES;
use crate::error::{CalMergeError, CalMergeResult};
use crate::feed::parse::{FeedTime, resolve_tzid};

/// Build an iCalendar-format DTSTART + RRULE block for the rrule crate.
///
/// Returns `None` for all-day masters, which are never synced.
fn build_rrule_string(start: &FeedTime, rrule: &str, default_tz: Tz) -> Option<String> {
    let dtstart = match start {
        FeedTime::Date(_) => return None,
        FeedTime::Utc(dt) => format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")),
        FeedTime::Floating(dt) => format!(
            "DTSTART;TZID={}:{}",
            default_tz.name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
        FeedTime::Zoned { datetime, tzid } => format!(
            "DTSTART;TZID={}:{}",
            resolve_tzid(tzid, default_tz).name(),
            datetime.format("%Y%m%dT%H%M%S")
        ),
    };

    Some(format!("{dtstart}\nRRULE:{rrule}"))
}

/// Occurrence start instants of a recurring entry within `[from, to)`.
///
/// EXDATEs and instance overrides are the caller's concern.
pub fn occurrences(
    start: &FeedTime,
    rrule: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    default_tz: Tz,
) -> CalMergeResult<Vec<DateTime<Utc>>> {
    let Some(rrule_str) = build_rrule_string(start, rrule, default_tz) else {
        return Ok(Vec::new());
    };

    let rrule_set: RRuleSet = rrule_str
        .parse()
        .map_err(|e| CalMergeError::IcsParse(format!("Failed to parse RRULE '{rrule}': {e}")))?;

    // after/before are exclusive; widen by a second and filter exactly below
    let tz: rrule::Tz = Utc.into();
    let after = (from - TimeDelta::seconds(1)).with_timezone(&tz);
    let before = (to + TimeDelta::seconds(1)).with_timezone(&tz);

    let result = rrule_set
        .after(after)
        .before(before)
        .all(MAX_RECURRENCE_INSTANCES);

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| *dt >= from && *dt < to)
        .collect())
}
