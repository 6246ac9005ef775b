//! Map agenda events onto attendance slots and compute their credit.
//!
//! The pipeline has three passes, run in order over a whole batch:
//!
//! 1. [`slottify`] -- find the start and end slot of each event and split
//!    events that span several slots into one sub-event per slot.
//! 2. [`adjust_for_grace`] -- widen boundaries by the grace period except where
//!    an occupied neighbouring slot abuts. Needs full-batch occupancy, so it can
//!    only run once every event has been slotted.
//! 3. [`set_credit`] -- derive credit and fraction from the slot table, or take
//!    them from a configured override.
//!
//! [`allocate`] runs all three.

use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime};

use crate::attribution::AttributionMiss;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::event::{AttendanceRecord, Credit, Event, EventKind, SlotSpan};
use crate::slot::{Edge, SlotTable};

/// Attendance events ready to submit, plus attribution fallbacks to report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub events: Vec<Event>,
    pub notices: Vec<AttributionMiss>,
}

impl Allocation {
    /// Notices as report lines.
    pub fn report(&self) -> String {
        self.notices.iter().map(|n| format!("{}\n", n)).collect()
    }
}

/// Slot, grace-adjust and credit a batch of agenda events.
///
/// # Errors
/// Returns `EngineError::UnmappableTime` when an event edge falls outside every
/// extended slot range. This only happens with a broken slot table, and the whole
/// run is abandoned rather than dropping the event.
pub fn allocate(events: &[Event], config: &EngineConfig) -> Result<Allocation> {
    let mut slotted = slottify(events, config)?;
    adjust_for_grace(&mut slotted, &config.slots)?;
    set_credit(&slotted, config)
}

/// Convert agenda events into slotted events, splitting multi-slot events.
///
/// Events not flagged for attendance produce nothing, but their times are still
/// looked up so a slot table defect surfaces on any data. Events whose summary
/// has a credit override are never split.
pub fn slottify(events: &[Event], config: &EngineConfig) -> Result<Vec<Event>> {
    let table = &config.slots;
    let mut out = Vec::new();

    for e in events {
        let start_slot = table.lookup(e.start, Edge::Start)?;
        let end_slot = table.lookup(e.end, Edge::End)?;

        if !e.agenda().is_some_and(|info| info.attendance) {
            continue;
        }

        let overridden = config.credit_override(&e.summary).is_some();
        if end_slot.index > start_slot.index && !overridden {
            let day = e.start.date();
            for slot in &table.slots()[start_slot.index..=end_slot.index] {
                let start = if slot.index == start_slot.index {
                    e.start
                } else {
                    slot.official_start_on(day)
                };
                let end = if slot.index == end_slot.index {
                    e.end
                } else {
                    slot.official_end_on(day)
                };
                out.push(slotted(e, start, end, SlotSpan::single(slot.name.clone())));
            }
            tracing::debug!(
                summary = %e.summary,
                from = %start_slot.name,
                to = %end_slot.name,
                "split multi-slot event"
            );
        } else {
            out.push(slotted(
                e,
                e.start,
                e.end,
                SlotSpan::new(start_slot.name.clone(), Some(end_slot.name.clone())),
            ));
        }
    }

    Ok(out)
}

fn slotted(source: &Event, start: NaiveDateTime, end: NaiveDateTime, span: SlotSpan) -> Event {
    Event::new(
        source.session,
        start,
        end,
        source.summary.clone(),
        source.location.clone(),
    )
    .with_kind(EventKind::Slotted(span))
}

fn span_indices(event: &Event, table: &SlotTable) -> Result<(usize, usize)> {
    let span = event
        .slot_span()
        .ok_or_else(|| EngineError::NotSlotted(event.label()))?;
    Ok((
        table.index_of(&span.start_slot)?,
        table.index_of(&span.end_slot)?,
    ))
}

/// Widen event boundaries by the grace period where that cannot cause overlap.
///
/// Occupancy is the set of (day, start slot) pairs across the batch. A start is
/// moved earlier by the grace period unless its slot abuts an occupied previous
/// slot. An end is moved later by the grace period unless its end slot abuts an
/// occupied next slot, in which case it is pulled back one minute.
pub fn adjust_for_grace(events: &mut [Event], table: &SlotTable) -> Result<()> {
    let mut occupied: HashSet<(i64, usize)> = HashSet::new();
    for e in events.iter() {
        let (start_index, _) = span_indices(e, table)?;
        occupied.insert((e.day_index(), start_index));
    }

    let grace = table.grace();
    let slots = table.slots();
    let mut pulled_back = 0usize;

    for e in events.iter_mut() {
        let (start_index, end_index) = span_indices(e, table)?;
        let day = e.day_index();

        let start_adjacent = slots[start_index].start_abuts
            && start_index > 0
            && occupied.contains(&(day, start_index - 1));
        if !start_adjacent {
            e.start -= grace;
        }

        let end_adjacent =
            slots[end_index].end_abuts && occupied.contains(&(day, end_index + 1));
        if end_adjacent {
            e.end -= Duration::minutes(1);
            pulled_back += 1;
        } else {
            e.end += grace;
        }
    }

    tracing::debug!(
        events = events.len(),
        occupied = occupied.len(),
        pulled_back,
        "applied grace period"
    );
    Ok(())
}

/// Produce attendance events carrying credit and fraction.
///
/// Credit starts from the start slot's default. An event covering more than one
/// slot gets 2/2 and is never plain `Normal` (it becomes `Other`); otherwise 1/1.
/// A credit override replaces both.
pub fn set_credit(events: &[Event], config: &EngineConfig) -> Result<Allocation> {
    let table = &config.slots;
    let mut allocation = Allocation::default();

    for e in events {
        let (start_index, end_index) = span_indices(e, table)?;
        let span = e
            .slot_span()
            .cloned()
            .ok_or_else(|| EngineError::NotSlotted(e.label()))?;

        let mut credit = table.slots()[start_index].default_credit;
        let (mut numerator, mut denominator) = (1, 1);
        if end_index > start_index {
            if credit == Credit::Normal {
                credit = Credit::Other;
            }
            numerator = 2;
            denominator = 2;
        }

        if let Some(ov) = config.credit_override(&e.summary) {
            credit = ov.credit;
            numerator = ov.numerator;
            denominator = ov.denominator;
        }

        let attribution = config.attribution.resolve(&e.summary);
        for miss in attribution.misses {
            if !allocation.notices.contains(&miss) {
                allocation.notices.push(miss);
            }
        }

        let record = AttendanceRecord {
            group: attribution.descriptor,
            credit,
            edit: None,
            numerator,
            denominator,
        };
        allocation.events.push(
            Event::new(
                e.session,
                e.start,
                e.end,
                e.summary.clone(),
                e.location.clone(),
            )
            .with_kind(EventKind::Attendance { span, record }),
        );
    }

    Ok(allocation)
}
