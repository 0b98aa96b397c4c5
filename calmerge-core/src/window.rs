//! The slice of time a run looks at.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::skip_days::SkipDays;

/// Instants from the start of `today` up to the end of the lookahead,
/// minus skip days (except an armed override date).
///
/// The same window filters feed entries and target events, so anything a
/// run would never add is also never deleted.
#[derive(Debug, Clone)]
pub struct SyncWindow {
    pub from: DateTime<Utc>,
    /// Exclusive
    pub to: DateTime<Utc>,
    pub timezone: Tz,
    pub skip_days: SkipDays,
    pub override_date: Option<NaiveDate>,
}

impl SyncWindow {
    pub fn new(
        today: NaiveDate,
        future_events_days: u32,
        timezone: Tz,
        skip_days: SkipDays,
        override_date: Option<NaiveDate>,
    ) -> Self {
        // Saturates at the end of the calendar instead of panicking
        let end_day = today
            .checked_add_days(Days::new(u64::from(future_events_days) + 1))
            .unwrap_or(NaiveDate::MAX);

        SyncWindow {
            from: start_of_day(timezone, today),
            to: start_of_day(timezone, end_day),
            timezone,
            skip_days,
            override_date,
        }
    }

    /// A window covering exactly one local day, with no skip policy.
    pub fn single_day(date: NaiveDate, timezone: Tz) -> Self {
        SyncWindow::new(date, 0, timezone, SkipDays::default(), None)
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }

    pub fn admits(&self, start: DateTime<Utc>) -> bool {
        if !self.contains(start) {
            return false;
        }

        let date = self.local_date(start);
        !self.skip_days.contains(date) || self.override_date == Some(date)
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339()
    }
}

pub fn start_of_day(timezone: Tz, date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(timezone, date.and_time(NaiveTime::MIN))
}

/// Resolve a wall-clock time in `timezone` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are pushed forward by an hour.
pub fn local_to_utc(timezone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    timezone
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            timezone
                .from_local_datetime(&(local + TimeDelta::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}
