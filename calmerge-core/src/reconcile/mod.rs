//! Diff source feed events against the target calendar.

mod apply;
mod event_action;
mod merge_event;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashSet;

pub use apply::{ApplyReport, apply};
pub use event_action::EventAction;
pub use merge_event::MergeEvent;

use crate::event::{EventKey, SourceEvent, TargetEvent};

/// Compute the operations that make the target calendar match the union of
/// the sources.
///
/// - A source event is added when no target event, managed or not, shares
///   its `(composed title, start)` key. A user event whose title happens to
///   collide therefore suppresses the import instead of being duplicated.
/// - A target event is deleted when it is managed and no source event
///   shares its key.
///
/// All adds come before all deletes, each in input order, so a moved event
/// exists in its new slot before the old one disappears. Source events with
/// the same key are added once.
pub fn reconcile(target: &[TargetEvent], sources: &[SourceEvent]) -> Vec<MergeEvent> {
    let existing: HashSet<EventKey> = target.iter().map(TargetEvent::key).collect();
    let wanted: HashSet<EventKey> = sources.iter().map(SourceEvent::key).collect();

    let mut queued = HashSet::new();
    let adds = sources
        .iter()
        .filter(|e| {
            let key = e.key();
            !existing.contains(&key) && queued.insert(key)
        })
        .map(|e| MergeEvent::Add(e.to_new_event()));

    let deletes = target
        .iter()
        .filter(|e| e.is_managed() && !wanted.contains(&e.key()))
        .map(|e| MergeEvent::Delete(e.clone()));

    adds.chain(deletes).collect()
}

/// Count planned operations as `(adds, deletes)`.
pub fn counts(ops: &[MergeEvent]) -> (usize, usize) {
    ops.iter().fold((0, 0), |(adds, deletes), op| match op.action() {
        EventAction::Add => (adds + 1, deletes),
        EventAction::Delete => (adds, deletes + 1),
    })
}
