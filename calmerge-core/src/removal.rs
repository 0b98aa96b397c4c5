//! Scoped deletion of events calmerge created.
//!
//! Every delete, whether planned by reconciliation or ordered by a cancel,
//! goes through [`delete_managed`], which refuses titles outside the grammar.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::catalog::{EventCatalog, OperationFailure};
use crate::error::{CalMergeError, CalMergeResult};
use crate::event::TargetEvent;
use crate::reconcile::EventAction;

/// Which events on a date a removal covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Events on the date starting at or after now
    FutureToday,
    /// Every event on the date
    AllDay,
}

impl fmt::Display for RemoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveMode::FutureToday => write!(f, "FUTURE_TODAY"),
            RemoveMode::AllDay => write!(f, "ALL_DAY"),
        }
    }
}

/// Outcome of a scoped removal.
#[derive(Debug, Default)]
pub struct RemovalReport {
    /// Events deleted, or that would have been in a dry run
    pub removed: usize,
    pub failures: Vec<OperationFailure>,
}

/// Pick the managed events on `date` (local to `timezone`) covered by `mode`.
pub fn select_for_removal<'a>(
    events: &'a [TargetEvent],
    date: NaiveDate,
    mode: RemoveMode,
    now: DateTime<Utc>,
    timezone: Tz,
) -> Vec<&'a TargetEvent> {
    events
        .iter()
        .filter(|e| e.is_managed())
        .filter(|e| e.start.with_timezone(&timezone).date_naive() == date)
        .filter(|e| match mode {
            RemoveMode::FutureToday => e.start >= now,
            RemoveMode::AllDay => true,
        })
        .collect()
}

/// Delete one event, provided its title marks it as ours.
pub async fn delete_managed<C: EventCatalog>(
    catalog: &C,
    event: &TargetEvent,
    dry_run: bool,
) -> CalMergeResult<()> {
    if !event.is_managed() {
        return Err(CalMergeError::NotManaged(event.title.clone()));
    }

    if dry_run {
        info!(title = %event.title, start = %event.start, "dry run: would delete");
        return Ok(());
    }

    catalog.delete_event(&event.reference).await
}

/// Remove the managed events on `date` selected by `mode`.
///
/// Failures are collected and the rest of the batch still runs.
pub async fn remove_scoped<C: EventCatalog>(
    catalog: &C,
    events: &[TargetEvent],
    date: NaiveDate,
    mode: RemoveMode,
    now: DateTime<Utc>,
    timezone: Tz,
    dry_run: bool,
) -> RemovalReport {
    let mut report = RemovalReport::default();

    for event in select_for_removal(events, date, mode, now, timezone) {
        match delete_managed(catalog, event, dry_run).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!(title = %event.title, error = %e, "removal failed");
                report.failures.push(OperationFailure {
                    action: EventAction::Delete,
                    title: event.title.clone(),
                    start: event.start,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(%date, %mode, removed = report.removed, failed = report.failures.len(), dry_run, "scoped removal finished");
    report
}
