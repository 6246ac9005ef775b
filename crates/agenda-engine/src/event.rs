//! Meeting occurrences and their identity, change and diff semantics.
//!
//! Every occurrence is an [`Event`]: the fields shared by all variants plus an
//! [`EventKind`] payload. Comparison is split into three capabilities:
//!
//! - [`Identity`] -- do two records describe the same real-world occurrence?
//! - [`ChangeDetector`] -- given the same occurrence, does the destination need an update?
//! - [`Differ`] -- a human-readable account of what changed.
//!
//! Identity is looser than field equality. Location and end time may drift
//! without breaking identity; reconciliation reports such drift as a change to
//! the occurrence, not as a delete plus an add.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The meeting session all events of a run belong to.
///
/// `start` anchors day-index computation; `utc_offset_hours` converts the
/// meeting's local wall-clock times to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start: NaiveDate,
    pub utc_offset_hours: i32,
}

impl Session {
    pub fn new(start: NaiveDate, utc_offset_hours: i32) -> Self {
        Self {
            start,
            utc_offset_hours,
        }
    }

    /// Midnight at the start of the session's first day.
    pub fn anchor(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Whole days between the session anchor and `t`, rounded towards negative infinity.
    pub fn day_index(&self, t: NaiveDateTime) -> i64 {
        t.date().signed_duration_since(self.start).num_days()
    }

    /// Local date of the given session day.
    pub fn day(&self, index: i64) -> NaiveDate {
        self.start + Duration::days(index)
    }

    pub fn to_utc(&self, t: NaiveDateTime) -> DateTime<Utc> {
        (t - Duration::hours(i64::from(self.utc_offset_hours))).and_utc()
    }
}

/// Attendance-accounting classification of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Credit {
    Normal,
    Extra,
    Zero,
    Other,
}

impl fmt::Display for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Credit::Normal => "Normal",
            Credit::Extra => "Extra",
            Credit::Zero => "Zero",
            Credit::Other => "Other",
        };
        f.write_str(s)
    }
}

impl FromStr for Credit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Normal" => Ok(Credit::Normal),
            "Extra" => Ok(Credit::Extra),
            "Zero" => Ok(Credit::Zero),
            "Other" => Ok(Credit::Other),
            other => Err(EngineError::Config(format!("unknown credit '{}'", other))),
        }
    }
}

/// Names of the slots an occurrence begins and ends in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpan {
    pub start_slot: String,
    pub end_slot: String,
}

impl SlotSpan {
    /// A span whose end slot defaults to the start slot when absent.
    pub fn new(start_slot: impl Into<String>, end_slot: Option<String>) -> Self {
        let start_slot = start_slot.into();
        let end_slot = end_slot.unwrap_or_else(|| start_slot.clone());
        Self {
            start_slot,
            end_slot,
        }
    }

    pub fn single(slot: impl Into<String>) -> Self {
        Self::new(slot, None)
    }
}

/// Routing information attached to a freshly parsed agenda record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaInfo {
    /// Organizational unit named by the agenda, if any.
    pub group: Option<String>,
    /// Whether the occurrence takes part in attendance accounting.
    pub attendance: bool,
}

/// Accounting data held by the attendance destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub group: String,
    pub credit: Credit,
    /// Opaque handle to the destination record, present on records read back from it.
    pub edit: Option<String>,
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A record with no routing or slot data, e.g. one read back from a calendar.
    Plain,
    Agenda(AgendaInfo),
    Slotted(SlotSpan),
    Attendance {
        span: SlotSpan,
        record: AttendanceRecord,
    },
}

/// One occurrence of a meeting. Times are local wall-clock times in the meeting locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub session: Session,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
    /// Free-text room description; empty when absent.
    pub location: String,
    /// Tombstone: logically absent but kept around for diffing.
    pub deleted: bool,
    /// Calendar-side identifier, used only for deletion requests.
    pub remote_id: Option<String>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(
        session: Session,
        start: NaiveDateTime,
        end: NaiveDateTime,
        summary: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            session,
            start,
            end,
            summary: summary.into(),
            location: location.into(),
            deleted: false,
            remote_id: None,
            kind: EventKind::Plain,
        }
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_remote_id(mut self, id: impl Into<String>) -> Self {
        self.remote_id = Some(id.into());
        self
    }

    pub fn ends_before(&self, t: NaiveDateTime) -> bool {
        self.end < t
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.session.to_utc(self.start)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.session.to_utc(self.end)
    }

    pub fn day_index(&self) -> i64 {
        self.session.day_index(self.start)
    }

    pub fn slot_span(&self) -> Option<&SlotSpan> {
        match &self.kind {
            EventKind::Slotted(span) | EventKind::Attendance { span, .. } => Some(span),
            EventKind::Plain | EventKind::Agenda(_) => None,
        }
    }

    pub fn attendance(&self) -> Option<&AttendanceRecord> {
        match &self.kind {
            EventKind::Attendance { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn agenda(&self) -> Option<&AgendaInfo> {
        match &self.kind {
            EventKind::Agenda(info) => Some(info),
            _ => None,
        }
    }

    /// Short string identifying the occurrence, used to tag report lines.
    pub fn label(&self) -> String {
        format!(
            "{} {} '{}'",
            self.start.format("%Y-%m-%d %a"),
            self.start.format("%H:%M:%S"),
            self.summary
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event {}-{} '{}'", self.start, self.end, self.summary)?;
        if !self.location.is_empty() {
            write!(f, " in {}", self.location)?;
        }
        if let Some(span) = self.slot_span() {
            write!(f, " {}-{}", span.start_slot, span.end_slot)?;
        }
        if let Some(record) = self.attendance() {
            write!(
                f,
                " {} {} ({}/{})",
                record.group, record.credit, record.numerator, record.denominator
            )?;
        }
        Ok(())
    }
}

/// Whether two records describe the same real-world occurrence.
pub trait Identity {
    fn same_occurrence(&self, other: &Self) -> bool;
}

/// Whether `self` (the new state) differs from `other` (the old state) in a way
/// that must be pushed to the destination.
pub trait ChangeDetector {
    fn changed(&self, other: &Self) -> bool;
}

/// Human-readable description of the differences found by [`ChangeDetector`].
pub trait Differ {
    fn diff(&self, other: &Self) -> String;
}

/// Location drift only counts when both sides actually name a room.
pub fn location_changed(new: &Event, old: &Event) -> bool {
    !new.location.is_empty() && !old.location.is_empty() && new.location != old.location
}

/// One-directional: the new state marks the occurrence deleted and the old state
/// does not. A tombstone disappearing is not reported.
pub fn deletion_changed(new: &Event, old: &Event) -> bool {
    new.deleted && !old.deleted
}

/// Credit edits made on the destination are authoritative, except that an
/// occurrence which should carry `Other` but is recorded as `Normal` is
/// progressed. Records created as `Normal` reach `Other` this way.
pub fn credit_changed(new: &AttendanceRecord, old: &AttendanceRecord) -> bool {
    new.credit == Credit::Other && old.credit == Credit::Normal
}

impl Identity for Event {
    fn same_occurrence(&self, other: &Self) -> bool {
        match (self.slot_span(), other.slot_span()) {
            (Some(a), Some(b)) => {
                self.day_index() == other.day_index()
                    && a.start_slot == b.start_slot
                    && self.summary == other.summary
            }
            _ => self.start == other.start && self.summary == other.summary,
        }
    }
}

impl ChangeDetector for Event {
    fn changed(&self, other: &Self) -> bool {
        if let (Some(new), Some(old)) = (self.attendance(), other.attendance()) {
            if credit_changed(new, old) {
                return true;
            }
        }

        self.start != other.start
            || self.end != other.end
            || self.summary != other.summary
            || location_changed(self, other)
            || deletion_changed(self, other)
    }
}

impl Differ for Event {
    fn diff(&self, other: &Self) -> String {
        let label = self.label();
        let mut lines = Vec::new();

        if self.start != other.start {
            lines.push(format!(
                "{} start changed: to {} from {}.",
                label, self.start, other.start
            ));
        }
        if self.end != other.end {
            lines.push(format!(
                "{} end changed: to {} from {}.",
                label, self.end, other.end
            ));
        }
        if self.summary != other.summary {
            lines.push(format!(
                "{} summary changed: to {} from {}.",
                label, self.summary, other.summary
            ));
        }
        if location_changed(self, other) {
            lines.push(format!(
                "{} location changed: to {} from {}.",
                label, self.location, other.location
            ));
        }
        if deletion_changed(self, other) {
            lines.push(format!("{} deleted changed: now marked deleted.", label));
        }
        if let (Some(new), Some(old)) = (self.attendance(), other.attendance()) {
            if credit_changed(new, old) {
                lines.push(format!(
                    "{} credit changed: to {} from {}.",
                    label, new.credit, old.credit
                ));
            }
        }

        lines.into_iter().map(|line| line + "\n").collect()
    }
}

