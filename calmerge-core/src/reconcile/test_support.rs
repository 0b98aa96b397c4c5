//! In-memory target calendar and event builders for engine tests.

use std::cell::RefCell;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::catalog::EventCatalog;
use crate::error::{CalMergeError, CalMergeResult};
use crate::event::{EventRef, NewEvent, SourceEvent, TargetEvent};
use crate::window::SyncWindow;

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn reference_for(title: &str, start: DateTime<Utc>) -> EventRef {
    EventRef(format!("{title}@{}", start.to_rfc3339()))
}

pub fn target(title: &str, y: i32, m: u32, d: u32, h: u32) -> TargetEvent {
    let start = at(y, m, d, h);
    TargetEvent {
        title: title.to_string(),
        start,
        end: start + TimeDelta::hours(1),
        reference: reference_for(title, start),
    }
}

pub fn source(
    raw_title: &str,
    tag: &str,
    label: &str,
    y: i32,
    m: u32,
    d: u32,
    h: u32,
) -> SourceEvent {
    let start = at(y, m, d, h);
    SourceEvent {
        raw_title: raw_title.to_string(),
        start,
        end: start + TimeDelta::hours(1),
        label: label.to_string(),
        tag: tag.to_string(),
    }
}

/// The target event a provider would report after creating `new`.
pub fn created(new: &NewEvent) -> TargetEvent {
    TargetEvent {
        title: new.title.clone(),
        start: new.start,
        end: new.end,
        reference: reference_for(&new.title, new.start),
    }
}

/// Records writes; optionally rejects operations on one title.
#[derive(Default)]
pub struct FakeCatalog {
    pub events: Vec<TargetEvent>,
    fail_title: Option<String>,
    created: RefCell<Vec<NewEvent>>,
    deleted: RefCell<Vec<EventRef>>,
}

impl FakeCatalog {
    pub fn with_events(events: Vec<TargetEvent>) -> Self {
        FakeCatalog {
            events,
            ..Default::default()
        }
    }

    pub fn failing_on(title: &str) -> Self {
        FakeCatalog {
            fail_title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<NewEvent> {
        self.created.borrow().clone()
    }

    pub fn deleted(&self) -> Vec<EventRef> {
        self.deleted.borrow().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.created.borrow().len() + self.deleted.borrow().len()
    }

    fn rejects(&self, title: &str) -> bool {
        self.fail_title.as_deref() == Some(title)
    }
}

impl EventCatalog for FakeCatalog {
    async fn events(&self, window: &SyncWindow) -> CalMergeResult<Vec<TargetEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| window.contains(e.start))
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: &NewEvent) -> CalMergeResult<()> {
        if self.rejects(&event.title) {
            return Err(CalMergeError::Provider("quota exceeded".into()));
        }
        self.created.borrow_mut().push(event.clone());
        Ok(())
    }

    async fn delete_event(&self, reference: &EventRef) -> CalMergeResult<()> {
        if let Some(title) = &self.fail_title {
            if reference.0.starts_with(&format!("{title}@")) {
                return Err(CalMergeError::Provider("event is locked".into()));
            }
        }
        self.deleted.borrow_mut().push(reference.clone());
        Ok(())
    }
}
