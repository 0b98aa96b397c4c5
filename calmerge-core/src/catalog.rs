//! The target calendar, as the engines see it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::CalMergeResult;
use crate::event::{EventRef, NewEvent, TargetEvent};
use crate::reconcile::EventAction;
use crate::window::SyncWindow;

/// Read/write access to the target calendar.
///
/// Calendar storage lives behind this trait; see [`crate::remote::Remote`]
/// for the provider-backed implementation.
#[allow(async_fn_in_trait)]
pub trait EventCatalog {
    /// Events on the target calendar whose start falls inside `window`'s
    /// time range. Skip-day filtering is the caller's job.
    async fn events(&self, window: &SyncWindow) -> CalMergeResult<Vec<TargetEvent>>;

    async fn create_event(&self, event: &NewEvent) -> CalMergeResult<()>;

    async fn delete_event(&self, reference: &EventRef) -> CalMergeResult<()>;
}

/// A single add or delete the backend rejected.
#[derive(Debug, Clone)]
pub struct OperationFailure {
    pub action: EventAction,
    pub title: String,
    pub start: DateTime<Utc>,
    pub error: String,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.action,
            self.title,
            self.start.to_rfc3339(),
            self.error
        )
    }
}
