use tracing::{debug, warn};

use crate::catalog::{EventCatalog, OperationFailure};
use crate::reconcile::MergeEvent;
use crate::removal::delete_managed;

/// Outcome of applying a reconciliation.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub added: usize,
    pub deleted: usize,
    pub failures: Vec<OperationFailure>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn absorb(&mut self, other: ApplyReport) {
        self.added += other.added;
        self.deleted += other.deleted;
        self.failures.extend(other.failures);
    }
}

/// Apply planned operations in order.
///
/// A failed operation is recorded and the rest still run; nothing is rolled
/// back. In a dry run the catalog receives no writes and the counts say what
/// would have happened.
pub async fn apply<C: EventCatalog>(catalog: &C, ops: &[MergeEvent], dry_run: bool) -> ApplyReport {
    let mut report = ApplyReport::default();

    for op in ops {
        let result = match op {
            MergeEvent::Add(event) if dry_run => {
                debug!(title = %event.title, start = %event.start, "dry run: would add");
                Ok(())
            }
            MergeEvent::Add(event) => catalog.create_event(event).await,
            MergeEvent::Delete(event) => delete_managed(catalog, event, dry_run).await,
        };

        match result {
            Ok(()) => match op {
                MergeEvent::Add(_) => report.added += 1,
                MergeEvent::Delete(_) => report.deleted += 1,
            },
            Err(e) => {
                warn!(action = %op.action(), title = op.title(), error = %e, "operation failed");
                report.failures.push(OperationFailure {
                    action: op.action(),
                    title: op.title().to_string(),
                    start: op.start(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
