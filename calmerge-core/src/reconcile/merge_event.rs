use std::fmt;

use chrono::{DateTime, Utc};

use crate::event::{NewEvent, TargetEvent};
use crate::reconcile::EventAction;

/// One planned operation against the target calendar.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeEvent {
    /// Create an event derived from a source feed entry
    Add(NewEvent),
    /// Remove a managed event no source produces any more
    Delete(TargetEvent),
}

impl MergeEvent {
    pub fn action(&self) -> EventAction {
        match self {
            MergeEvent::Add(_) => EventAction::Add,
            MergeEvent::Delete(_) => EventAction::Delete,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MergeEvent::Add(e) => &e.title,
            MergeEvent::Delete(e) => &e.title,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        match self {
            MergeEvent::Add(e) => e.start,
            MergeEvent::Delete(e) => e.start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            MergeEvent::Add(e) => e.end,
            MergeEvent::Delete(e) => e.end,
        }
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action(), self.title())
    }
}
