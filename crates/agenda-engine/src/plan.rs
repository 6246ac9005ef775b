//! Turn a [`Reconciliation`] into the actions a destination must perform.
//!
//! The engine does no I/O; collaborators execute these actions against the
//! calendar service or the attendance portal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::event::{Credit, Event};
use crate::reconcile::Reconciliation;

const CANCELLED_SUFFIX: &str = " --- cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    /// Attendance records are never deleted, only edited to read as cancelled.
    Cancel,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "+"),
            ActionKind::Update => write!(f, "~"),
            ActionKind::Delete => write!(f, "-"),
            ActionKind::Cancel => write!(f, "x"),
        }
    }
}

/// Which portal form a submission is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// The new-meeting form. It has no fraction fields and cannot record `Other` credit.
    Create,
    Edit,
}

/// The exact field values submitted to the attendance portal for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub summary: String,
    pub group: String,
    pub day_index: i64,
    pub start_slot: String,
    pub end_slot: String,
    /// Local `HH:MM`, grace adjustment included.
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub credit: Credit,
    pub numerator: u32,
    pub denominator: u32,
}

/// Build the portal payload for an attendance event.
///
/// # Errors
/// Returns `EngineError::NotSlotted` when the event carries no attendance data.
pub fn submission(event: &Event, form: Form) -> Result<Submission> {
    let (span, record) = match (event.slot_span(), event.attendance()) {
        (Some(span), Some(record)) => (span, record),
        _ => return Err(EngineError::NotSlotted(event.label())),
    };

    let mut summary = event.summary.clone();
    if event.deleted {
        summary.push_str(CANCELLED_SUFFIX);
    }

    // A fraction is only meaningful for `Other` credit.
    let (credit, numerator, denominator) = match (form, record.credit) {
        (Form::Create, Credit::Other) => (Credit::Normal, 0, 0),
        (Form::Edit, Credit::Other) => (Credit::Other, record.numerator, record.denominator),
        (_, credit) => (credit, 0, 0),
    };

    Ok(Submission {
        summary,
        group: record.group.clone(),
        day_index: event.day_index(),
        start_slot: span.start_slot.clone(),
        end_slot: span.end_slot.clone(),
        start_time: event.start.format("%H:%M").to_string(),
        end_time: event.end.format("%H:%M").to_string(),
        location: event.location.clone(),
        credit,
        numerator,
        denominator,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Destination handle of the record acted on: calendar id or portal edit handle.
    pub target: Option<String>,
    pub event: Event,
    pub submission: Option<Submission>,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.event)
    }
}

/// Calendar actions. A changed occurrence is replaced: the old entry is deleted
/// and the new one created.
pub fn calendar_plan(rec: &Reconciliation) -> Vec<Action> {
    let mut actions = Vec::new();

    for e in &rec.added {
        actions.push(Action {
            kind: ActionKind::Create,
            target: None,
            event: e.clone(),
            submission: None,
        });
    }
    for e in &rec.removed {
        actions.push(Action {
            kind: ActionKind::Delete,
            target: e.remote_id.clone(),
            event: e.clone(),
            submission: None,
        });
    }
    for (new, old) in &rec.changed {
        actions.push(Action {
            kind: ActionKind::Delete,
            target: old.remote_id.clone(),
            event: old.clone(),
            submission: None,
        });
        actions.push(Action {
            kind: ActionKind::Create,
            target: None,
            event: new.clone(),
            submission: None,
        });
    }

    actions
}

/// Attendance portal actions, each with its submission payload.
///
/// Removed occurrences are cancelled in place: the destination record is
/// resubmitted through the edit form with a cancelled summary.
pub fn attendance_plan(rec: &Reconciliation) -> Result<Vec<Action>> {
    let mut actions = Vec::new();

    for e in &rec.added {
        actions.push(Action {
            kind: ActionKind::Create,
            target: None,
            event: e.clone(),
            submission: Some(submission(e, Form::Create)?),
        });
    }
    for e in &rec.removed {
        let mut cancelled = e.clone();
        cancelled.deleted = true;
        actions.push(Action {
            kind: ActionKind::Cancel,
            target: edit_handle(e),
            submission: Some(submission(&cancelled, Form::Edit)?),
            event: cancelled,
        });
    }
    for (new, old) in &rec.changed {
        actions.push(Action {
            kind: ActionKind::Update,
            target: edit_handle(old),
            event: new.clone(),
            submission: Some(submission(new, Form::Edit)?),
        });
    }

    Ok(actions)
}

fn edit_handle(event: &Event) -> Option<String> {
    event.attendance().and_then(|record| record.edit.clone())
}
