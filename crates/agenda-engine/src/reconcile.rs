//! Compute the added / changed / removed sets between two event lists.
//!
//! List A is the new, authoritative state (the agenda); list B is the old state
//! held by a destination. Events that are tombstoned or already over are frozen
//! and take no part. Matching is a pairwise scan using [`Identity`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::{ChangeDetector, Differ, Event, Identity};

/// Result of reconciling a new list against an old one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Live events only in the new list, in new-list order.
    pub added: Vec<Event>,
    /// `(new, old)` pairs for occurrences in both lists that need an update.
    pub changed: Vec<(Event, Event)>,
    /// Live events only in the old list, in old-list order.
    pub removed: Vec<Event>,
    /// One line per detected difference, addition or removal.
    pub report: String,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// `(added, changed, removed)` counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.changed.len(), self.removed.len())
    }
}

/// An event takes part in reconciliation when it is not tombstoned and has not ended.
pub fn is_live(event: &Event, now: DateTime<Utc>) -> bool {
    !event.deleted && event.end_utc() > now
}

/// Reconcile `new` (named `new_name` in the report) against `old` (`old_name`).
///
/// Every live event of `new` is looked up among the live events of `old`; the
/// first match is either unchanged or recorded once as a changed pair with its
/// diff in the report. Unmatched events are additions. A live event of `old`
/// with no counterpart anywhere in `new` is a removal.
pub fn reconcile(
    new: &[Event],
    new_name: &str,
    old: &[Event],
    old_name: &str,
    now: DateTime<Utc>,
) -> Reconciliation {
    let mut result = Reconciliation::default();

    let live_old: Vec<&Event> = old.iter().filter(|e| is_live(e, now)).collect();

    for a in new.iter().filter(|e| is_live(e, now)) {
        match live_old.iter().find(|b| a.same_occurrence(b)) {
            Some(b) => {
                if a.changed(b) {
                    result.report.push_str(&a.diff(b));
                    result.changed.push((a.clone(), (*b).clone()));
                }
            }
            None => {
                result
                    .report
                    .push_str(&format!("{}: New in {}\n", a.label(), new_name));
                result.added.push(a.clone());
            }
        }
    }

    for b in live_old {
        if !new.iter().any(|a| a.same_occurrence(b)) {
            result.report.push_str(&format!(
                "{}: Deleting item only in {}\n",
                b.label(),
                old_name
            ));
            result.removed.push(b.clone());
        }
    }

    tracing::debug!(
        new = new_name,
        old = old_name,
        added = result.added.len(),
        changed = result.changed.len(),
        removed = result.removed.len(),
        "reconciled event lists"
    );

    result
}
