//! Event types that flow through a single run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::title::{self, ManagedTitle};

/// Opaque handle to an entry on the target calendar.
///
/// Issued by the provider; calmerge only forwards it back for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef(pub String);

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity used to match source events against target events.
///
/// End time and source label are deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub title: String,
    pub start: DateTime<Utc>,
}

/// An entry from an upstream feed that survived filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub raw_title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The owning source's label, written after the `/` in composed titles
    pub label: String,
    pub tag: String,
}

impl SourceEvent {
    pub fn composed_title(&self) -> String {
        title::compose(&self.tag, &self.raw_title, &self.label)
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            title: self.composed_title(),
            start: self.start,
        }
    }

    /// The event that would be written to the target calendar.
    pub fn to_new_event(&self) -> NewEvent {
        NewEvent {
            title: self.composed_title(),
            start: self.start,
            end: self.end,
        }
    }
}

/// An entry currently on the target calendar.
///
/// May or may not be managed; see [`TargetEvent::is_managed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reference: EventRef,
}

impl TargetEvent {
    pub fn managed_title(&self) -> Option<ManagedTitle> {
        ManagedTitle::parse(&self.title)
    }

    /// Whether calmerge created this event (its title parses).
    pub fn is_managed(&self) -> bool {
        self.managed_title().is_some()
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            title: self.title.clone(),
            start: self.start,
        }
    }
}

impl fmt::Display for TargetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// An event to be created on the target calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl fmt::Display for NewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
