//! Turning ICS feed content into source events for one sync window.

mod parse;
mod recurrence;

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::error::CalMergeResult;
use crate::event::SourceEvent;
use crate::window::SyncWindow;

pub use parse::{FeedEntry, FeedTime, parse_feed, resolve_tzid};
pub use recurrence::occurrences;

/// Parse `content` and keep what the window admits, labelled for one source.
pub fn parse_and_filter(
    content: &str,
    label: &str,
    tag: &str,
    window: &SyncWindow,
) -> CalMergeResult<Vec<SourceEvent>> {
    let entries = parse_feed(content)?;
    Ok(source_events(&entries, label, tag, window))
}

/// Expand feed entries into timed source events inside `window`.
///
/// Cancelled, transparent and all-day entries are dropped. Recurring masters
/// are expanded, minus their EXDATEs and any instance that has its own
/// RECURRENCE-ID override in the feed. The result is ordered by start.
pub fn source_events(
    entries: &[FeedEntry],
    label: &str,
    tag: &str,
    window: &SyncWindow,
) -> Vec<SourceEvent> {
    let tz = window.timezone;

    let overridden: HashSet<(&str, DateTime<Utc>)> = entries
        .iter()
        .filter_map(|e| {
            let uid = e.uid.as_deref()?;
            let instant = e.recurrence_id.as_ref()?.to_utc(tz)?;
            Some((uid, instant))
        })
        .collect();

    let mut events = Vec::new();

    for entry in entries {
        if entry.cancelled || entry.transparent || entry.start.is_date() {
            debug!(summary = %entry.summary, "skipping non-blocking entry");
            continue;
        }
        let Some(start) = entry.start.to_utc(tz) else {
            continue;
        };
        let duration = entry
            .end
            .as_ref()
            .and_then(|end| end.to_utc(tz))
            .map(|end| end - start)
            .filter(|d| *d >= TimeDelta::zero())
            .unwrap_or_else(TimeDelta::zero);

        let starts = match (&entry.rrule, &entry.recurrence_id) {
            (Some(rule), None) => {
                let excluded: Vec<DateTime<Utc>> =
                    entry.exdates.iter().filter_map(|x| x.to_utc(tz)).collect();
                let excluded_dates: Vec<_> = entry
                    .exdates
                    .iter()
                    .filter_map(|x| match x {
                        FeedTime::Date(d) => Some(*d),
                        _ => None,
                    })
                    .collect();

                match occurrences(&entry.start, rule, window.from, window.to, tz) {
                    Ok(found) => found
                        .into_iter()
                        .filter(|s| !excluded.contains(s))
                        .filter(|s| !excluded_dates.contains(&window.local_date(*s)))
                        .filter(|s| {
                            entry
                                .uid
                                .as_deref()
                                .is_none_or(|uid| !overridden.contains(&(uid, *s)))
                        })
                        .collect(),
                    Err(e) => {
                        warn!(summary = %entry.summary, error = %e, "using first occurrence only");
                        vec![start]
                    }
                }
            }
            _ => vec![start],
        };

        events.extend(
            starts
                .into_iter()
                .filter(|s| window.admits(*s))
                .map(|s| SourceEvent {
                    raw_title: entry.summary.clone(),
                    start: s,
                    end: s + duration,
                    label: label.to_string(),
                    tag: tag.to_string(),
                }),
        );
    }

    events.sort_by_key(|e| e.start);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skip_days::SkipDays;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;

    // Monday 2025-02-24 .. Sunday 2025-03-02
    const FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
SUMMARY:Standup\r\n\
DTSTART:20250224T090000Z\r\n\
DTEND:20250224T091500Z\r\n\
RRULE:FREQ=DAILY\r\n\
EXDATE:20250225T090000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
RECURRENCE-ID:20250226T090000Z\r\n\
SUMMARY:Standup (moved)\r\n\
DTSTART:20250226T110000Z\r\n\
DTEND:20250226T111500Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:offsite@example.com\r\n\
SUMMARY:Offsite\r\n\
DTSTART;VALUE=DATE:20250227\r\n\
DTEND;VALUE=DATE:20250228\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:hold@example.com\r\n\
SUMMARY:Hold\r\n\
DTSTART:20250224T130000Z\r\n\
DTEND:20250224T140000Z\r\n\
TRANSP:TRANSPARENT\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:review@example.com\r\n\
SUMMARY:Review\r\n\
DTSTART:20250224T150000Z\r\n\
DTEND:20250224T160000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, m, d, h, 0, 0).unwrap()
    }

    fn window(skip: &[u8], override_date: Option<NaiveDate>) -> SyncWindow {
        SyncWindow::new(
            date(24),
            6,
            Tz::UTC,
            SkipDays::new(skip.iter().copied()).unwrap(),
            override_date,
        )
    }

    fn starts(events: &[SourceEvent]) -> Vec<(String, DateTime<Utc>)> {
        events
            .iter()
            .map(|e| (e.raw_title.clone(), e.start))
            .collect()
    }

    #[test]
    fn expands_recurrence_without_exdates_or_overridden_instances() {
        let events = parse_and_filter(FEED, "Google", "WRK", &window(&[], None)).unwrap();
        let standups: Vec<_> = starts(&events)
            .into_iter()
            .filter(|(t, _)| t == "Standup")
            .map(|(_, s)| s)
            .collect();

        assert_eq!(
            standups,
            vec![at(2, 24, 9), at(2, 27, 9), at(2, 28, 9), at(3, 1, 9), at(3, 2, 9)]
        );
        assert!(
            starts(&events).contains(&("Standup (moved)".to_string(), at(2, 26, 11)))
        );
    }

    #[test]
    fn drops_all_day_and_transparent_entries() {
        let events = parse_and_filter(FEED, "Google", "WRK", &window(&[], None)).unwrap();
        assert!(events.iter().all(|e| e.raw_title != "Offsite" && e.raw_title != "Hold"));
        assert!(events.iter().any(|e| e.raw_title == "Review"));
    }

    #[test]
    fn keeps_duration_and_labels() {
        let events = parse_and_filter(FEED, "Google", "WRK", &window(&[], None)).unwrap();
        let review = events.iter().find(|e| e.raw_title == "Review").unwrap();

        assert_eq!(review.end - review.start, TimeDelta::hours(1));
        assert_eq!(review.composed_title(), "[WRK] Review/Google");
    }

    #[test]
    fn skip_days_are_excluded_unless_overridden() {
        // Sat + Sun skipped, Sunday armed
        let events =
            parse_and_filter(FEED, "Google", "WRK", &window(&[5, 6], Some(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap())))
                .unwrap();
        let days: Vec<_> = events.iter().map(|e| e.start).collect();

        assert!(!days.contains(&at(3, 1, 9)));
        assert!(days.contains(&at(3, 2, 9)));
    }

    #[test]
    fn output_is_ordered_by_start() {
        let events = parse_and_filter(FEED, "Google", "WRK", &window(&[], None)).unwrap();
        assert!(events.windows(2).all(|w| w[0].start <= w[1].start));
    }
}
