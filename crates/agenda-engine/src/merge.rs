//! Collapse per-room duplicate rows into one occurrence.
//!
//! Schedules emit one row per room for a meeting held in several rooms at once.
//! Merging must run before reconciliation: it produces the canonical location
//! string for each occurrence.

use crate::event::{Event, Identity};

/// Merge duplicates of the same occurrence, concatenating their locations.
///
/// For every pair of live events that are the same occurrence, the later one's
/// location is appended (comma separated) to the earlier one and the later one
/// is marked deleted. Only surviving events are returned, in input order.
pub fn merge_rooms(mut events: Vec<Event>) -> Vec<Event> {
    for i in 0..events.len() {
        if events[i].deleted {
            continue;
        }
        for j in 0..events.len() {
            if i == j || events[j].deleted {
                continue;
            }
            if events[i].same_occurrence(&events[j]) {
                let extra = events[j].location.clone();
                events[j].deleted = true;
                events[i].location.push_str(", ");
                events[i].location.push_str(&extra);
            }
        }
    }

    events.retain(|e| !e.deleted);
    events
}

/// Order events by start time, then summary. Stable for equal keys.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.summary.cmp(&b.summary)));
}
