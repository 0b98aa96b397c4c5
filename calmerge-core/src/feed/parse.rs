//! ICS feed parsing using the icalendar crate's parser.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::debug;

use crate::constants::UNTITLED_EVENT;
use crate::error::{CalMergeError, CalMergeResult};
use crate::window::local_to_utc;

/// A DTSTART/DTEND/EXDATE value as written in the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedTime {
    /// All-day
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    /// No zone given; read in the configured timezone
    Floating(NaiveDateTime),
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl FeedTime {
    pub fn is_date(&self) -> bool {
        matches!(self, FeedTime::Date(_))
    }

    /// The instant this time denotes. All-day dates have none.
    pub fn to_utc(&self, default_tz: Tz) -> Option<DateTime<Utc>> {
        match self {
            FeedTime::Date(_) => None,
            FeedTime::Utc(dt) => Some(*dt),
            FeedTime::Floating(naive) => Some(local_to_utc(default_tz, *naive)),
            FeedTime::Zoned { datetime, tzid } => {
                Some(local_to_utc(resolve_tzid(tzid, default_tz), *datetime))
            }
        }
    }
}

/// Map a TZID parameter to a timezone, falling back to `default_tz` for
/// names chrono-tz does not know (e.g. Windows zone names).
pub fn resolve_tzid(tzid: &str, default_tz: Tz) -> Tz {
    let name = tzid.trim_matches('"').trim_start_matches('/');

    name.parse::<Tz>().unwrap_or_else(|_| {
        debug!(tzid, fallback = %default_tz.name(), "unknown TZID");
        default_tz
    })
}

/// One VEVENT from a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub uid: Option<String>,
    pub summary: String,
    pub start: FeedTime,
    pub end: Option<FeedTime>,
    /// TRANSP:TRANSPARENT (free/busy-only entries)
    pub transparent: bool,
    /// STATUS:CANCELLED
    pub cancelled: bool,
    pub rrule: Option<String>,
    pub exdates: Vec<FeedTime>,
    /// Set on instance overrides of a recurring event
    pub recurrence_id: Option<FeedTime>,
}

/// Parse every VEVENT in an ICS document.
///
/// Events without a usable DTSTART are skipped.
pub fn parse_feed(content: &str) -> CalMergeResult<Vec<FeedEntry>> {
    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| CalMergeError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(parse_entry)
        .collect())
}

fn parse_entry(vevent: &Component) -> Option<FeedEntry> {
    let start = to_feed_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_feed_time);

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_EVENT.to_string());

    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let transparent = vevent
        .find_prop("TRANSP")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("TRANSPARENT"));
    let cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("CANCELLED"));

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_feed_time);

    Some(FeedEntry {
        uid,
        summary: summary.trim().to_string(),
        start,
        end,
        transparent,
        cancelled,
        rrule,
        exdates,
        recurrence_id,
    })
}

fn to_feed_time(dpt: DatePerhapsTime) -> FeedTime {
    match dpt {
        DatePerhapsTime::Date(d) => FeedTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => FeedTime::Utc(dt),
            CalendarDateTime::Floating(naive) => FeedTime::Floating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => FeedTime::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

/// Parse an EXDATE property, which may carry a TZID or VALUE=DATE parameter
/// and a comma-separated list of values.
fn parse_exdate_property(prop: &Property) -> Vec<FeedTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if is_date {
                return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(FeedTime::Date);
            }

            if let Some(utc) = s.strip_suffix('Z') {
                return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| FeedTime::Utc(dt.and_utc()));
            }

            let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
            Some(match &tzid {
                Some(tz) => FeedTime::Zoned {
                    datetime: naive,
                    tzid: tz.clone(),
                },
                None => FeedTime::Floating(naive),
            })
        })
        .collect()
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
