//! # agenda-engine
//!
//! Keeps downstream copies of a meeting agenda in step with the agenda itself.
//!
//! Given the authoritative agenda and the events currently held by a
//! destination (a calendar, or an attendance-accounting portal), the engine
//! works out what must be created, updated and removed. For the attendance
//! destination it also maps each meeting onto the fixed daily slot table,
//! splits meetings that cross slots, applies the grace period and computes
//! credit.
//!
//! ## Modules
//!
//! - [`event`] — the event model with identity, change and diff rules
//! - [`slot`] — validated slot table and time-to-slot lookup
//! - [`merge`] — collapse per-room duplicates into one occurrence
//! - [`reconcile`] — added / changed / removed between two event lists
//! - [`allocator`] — slotting, grace adjustment and credit assignment
//! - [`normalize`] — canonical meeting names from raw agenda descriptions
//! - [`selection`] — which destinations an agenda record is posted to
//! - [`attribution`] — project descriptor lookup for attendance records
//! - [`plan`] — destination actions derived from a reconciliation
//! - [`report`] — the operator-facing run report
//! - [`config`] — TOML configuration
//! - [`error`] — Error types

pub mod allocator;
pub mod attribution;
pub mod config;
pub mod error;
pub mod event;
pub mod merge;
pub mod normalize;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod selection;
pub mod slot;

pub use allocator::{allocate, Allocation};
pub use config::{CreditOverride, EngineConfig};
pub use error::EngineError;
pub use event::{
    AgendaInfo, AttendanceRecord, ChangeDetector, Credit, Differ, Event, EventKind, Identity,
    Session, SlotSpan,
};
pub use merge::merge_rooms;
pub use plan::{attendance_plan, calendar_plan, Action, ActionKind, Submission};
pub use reconcile::{reconcile, Reconciliation};
pub use report::RunReport;
pub use slot::{SlotDef, SlotTable};
