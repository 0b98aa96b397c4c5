//! Weekday skip policy.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{CalMergeError, CalMergeResult};

/// Weekdays on which syncing is normally suppressed.
///
/// Numbered 0 (Monday) to 6 (Sunday).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipDays(BTreeSet<u8>);

impl SkipDays {
    pub fn new(days: impl IntoIterator<Item = u8>) -> CalMergeResult<Self> {
        let days: BTreeSet<u8> = days.into_iter().collect();

        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(CalMergeError::Config(format!(
                "skip day {bad} is out of range (0 = Monday .. 6 = Sunday)"
            )));
        }

        Ok(SkipDays(days))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_monday() as u8;
        self.0.contains(&weekday)
    }

    /// The first skip day strictly after `date`, or `None` when nothing is
    /// ever skipped.
    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        (1..=7)
            .map(|n| date + Days::new(n))
            .find(|d| self.contains(*d))
    }
}

impl fmt::Display for SkipDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        let names: Vec<_> = self.0.iter().map(|d| NAMES[*d as usize]).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-02-22 is a Saturday
    const SAT: (i32, u32, u32) = (2025, 2, 22);

    #[test]
    fn weekend_days_are_skipped() {
        let skip = SkipDays::new([5, 6]).unwrap();
        assert!(skip.contains(date(SAT.0, SAT.1, SAT.2)));
        assert!(skip.contains(date(2025, 2, 23)));
        assert!(!skip.contains(date(2025, 2, 24)));
    }

    #[test]
    fn empty_set_never_skips() {
        let skip = SkipDays::default();
        assert!(!skip.contains(date(SAT.0, SAT.1, SAT.2)));
        assert_eq!(skip.next_after(date(SAT.0, SAT.1, SAT.2)), None);
    }

    #[test]
    fn out_of_range_day_is_rejected() {
        assert!(SkipDays::new([7]).is_err());
    }

    #[test]
    fn next_after_is_strictly_later() {
        let skip = SkipDays::new([5, 6]).unwrap();
        // Saturday -> Sunday, Sunday -> next Saturday, Monday -> Saturday
        assert_eq!(skip.next_after(date(2025, 2, 22)), Some(date(2025, 2, 23)));
        assert_eq!(skip.next_after(date(2025, 2, 23)), Some(date(2025, 3, 1)));
        assert_eq!(skip.next_after(date(2025, 2, 24)), Some(date(2025, 3, 1)));
    }

    #[test]
    fn single_skip_day_wraps_a_full_week() {
        let skip = SkipDays::new([0]).unwrap();
        // Monday -> following Monday
        assert_eq!(skip.next_after(date(2025, 2, 24)), Some(date(2025, 3, 3)));
    }

    #[test]
    fn display_uses_day_names() {
        let skip = SkipDays::new([6, 5]).unwrap();
        assert_eq!(skip.to_string(), "Sat, Sun");
    }
}
