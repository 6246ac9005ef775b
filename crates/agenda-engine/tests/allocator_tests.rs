//! Tests for slotting, grace adjustment and credit assignment.

use agenda_engine::allocator::{adjust_for_grace, allocate, set_credit, slottify};
use agenda_engine::attribution::AttributionTable;
use agenda_engine::config::{CreditOverride, EngineConfig};
use agenda_engine::error::EngineError;
use agenda_engine::event::{AgendaInfo, Credit, Event, EventKind, Session, SlotSpan};
use agenda_engine::slot::{SlotDef, SlotTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

fn hm(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn def(name: &str, start: &str, end: &str, ext_start: &str, ext_end: &str, credit: Credit) -> SlotDef {
    SlotDef {
        name: name.to_string(),
        start: hm(start),
        end: hm(end),
        extended_start: hm(ext_start),
        extended_end: hm(ext_end),
        default_credit: credit,
    }
}

fn standard_defs() -> Vec<SlotDef> {
    vec![
        def("AM1", "08:00", "10:00", "00:00", "10:29", Credit::Normal),
        def("AM2", "10:30", "12:30", "10:30", "13:29", Credit::Normal),
        def("PM1", "13:30", "15:30", "13:30", "15:59", Credit::Normal),
        def("PM2", "16:00", "18:00", "16:00", "18:59", Credit::Normal),
        def("EVE", "19:30", "21:30", "19:00", "23:59", Credit::Extra),
    ]
}

/// AM1 and AM2 are four minutes apart, closer than the grace period.
fn abutting_defs() -> Vec<SlotDef> {
    vec![
        def("AM1", "08:00", "10:00", "00:00", "10:04", Credit::Normal),
        def("AM2", "10:05", "12:00", "10:05", "23:59", Credit::Normal),
    ]
}

fn session() -> Session {
    Session::new(NaiveDate::from_ymd_opt(2017, 5, 7).unwrap(), 9)
}

fn config(defs: Vec<SlotDef>) -> EngineConfig {
    EngineConfig::new(session(), SlotTable::new(defs, 10).unwrap())
}

fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 5, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

/// Helper: an agenda event on 2017-05-`day` that takes part in attendance.
fn agenda(day: u32, start: (u32, u32), end: (u32, u32), summary: &str) -> Event {
    Event::new(
        session(),
        at(day, start.0, start.1),
        at(day, end.0, end.1),
        summary,
        "Rm1",
    )
    .with_kind(EventKind::Agenda(AgendaInfo {
        group: Some("802.11".to_string()),
        attendance: true,
    }))
}

fn slotted(day: u32, start: (u32, u32), end: (u32, u32), summary: &str, span: SlotSpan) -> Event {
    Event::new(
        session(),
        at(day, start.0, start.1),
        at(day, end.0, end.1),
        summary,
        "Rm1",
    )
    .with_kind(EventKind::Slotted(span))
}

fn span_names(e: &Event) -> (String, String) {
    let span = e.slot_span().expect("event should be slotted");
    (span.start_slot.clone(), span.end_slot.clone())
}

// ── Slotting ──

#[test]
fn multi_slot_event_is_split_per_slot() {
    let cfg = config(standard_defs());
    let events = slottify(&[agenda(8, (8, 0), (11, 0), "X")], &cfg).unwrap();

    assert_eq!(events.len(), 2, "08:00-11:00 covers AM1 and AM2");
    assert_eq!((events[0].start, events[0].end), (at(8, 8, 0), at(8, 10, 0)));
    assert_eq!(span_names(&events[0]), ("AM1".to_string(), "AM1".to_string()));
    assert_eq!((events[1].start, events[1].end), (at(8, 10, 30), at(8, 11, 0)));
    assert_eq!(span_names(&events[1]), ("AM2".to_string(), "AM2".to_string()));
}

#[test]
fn split_across_three_slots_snaps_middle_slot_to_official_times() {
    let cfg = config(standard_defs());
    let events = slottify(&[agenda(8, (9, 0), (14, 0), "X")], &cfg).unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!((events[0].start, events[0].end), (at(8, 9, 0), at(8, 10, 0)));
    assert_eq!((events[1].start, events[1].end), (at(8, 10, 30), at(8, 12, 30)));
    assert_eq!((events[2].start, events[2].end), (at(8, 13, 30), at(8, 14, 0)));
}

#[test]
fn split_sub_events_stay_on_the_event_day() {
    let cfg = config(standard_defs());
    let events = slottify(&[agenda(9, (8, 0), (11, 0), "X")], &cfg).unwrap();

    assert_eq!(events[1].start, at(9, 10, 30));
    assert!(events.iter().all(|e| e.day_index() == 2));
}

#[test]
fn event_matching_one_slot_is_not_split() {
    let cfg = config(standard_defs());
    let input = agenda(8, (10, 30), (12, 30), "TGax");
    let events = slottify(&[input.clone()], &cfg).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!((events[0].start, events[0].end), (input.start, input.end));
    assert_eq!(span_names(&events[0]), ("AM2".to_string(), "AM2".to_string()));
}

#[test]
fn events_outside_attendance_produce_nothing() {
    let cfg = config(standard_defs());
    let calendar_only = agenda(8, (8, 0), (10, 0), "TGax").with_kind(EventKind::Agenda(AgendaInfo {
        group: None,
        attendance: false,
    }));
    let plain = Event::new(session(), at(8, 8, 0), at(8, 10, 0), "TGay", "");

    assert!(slottify(&[calendar_only, plain], &cfg).unwrap().is_empty());
}

#[test]
fn overridden_event_is_never_split() {
    let ov = CreditOverride {
        credit: Credit::Other,
        numerator: 1,
        denominator: 2,
    };
    let cfg = config(standard_defs()).with_credit_override("Closing Plenary", ov);
    let allocation = allocate(&[agenda(8, (8, 0), (11, 0), "Closing Plenary")], &cfg).unwrap();

    assert_eq!(allocation.events.len(), 1);
    let e = &allocation.events[0];
    assert_eq!(span_names(e), ("AM1".to_string(), "AM2".to_string()));

    let record = e.attendance().unwrap();
    assert_eq!(record.credit, Credit::Other);
    assert_eq!((record.numerator, record.denominator), (1, 2));
}

// ── Grace ──

#[test]
fn grace_widens_both_ends_when_neighbours_are_far() {
    let cfg = config(standard_defs());
    let allocation = allocate(&[agenda(8, (8, 0), (11, 0), "X")], &cfg).unwrap();
    let events = &allocation.events;

    assert_eq!((events[0].start, events[0].end), (at(8, 7, 50), at(8, 10, 10)));
    assert_eq!((events[1].start, events[1].end), (at(8, 10, 20), at(8, 11, 10)));
}

#[test]
fn grace_is_withheld_between_occupied_abutting_slots() {
    let cfg = config(abutting_defs());
    let allocation = allocate(&[agenda(8, (8, 0), (11, 0), "X")], &cfg).unwrap();
    let events = &allocation.events;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start, at(8, 7, 50));
    assert_eq!(events[0].end, at(8, 9, 59), "pulled back one minute from AM2");
    assert_eq!(events[1].start, at(8, 10, 5), "AM1 is occupied so no grace");
    assert_eq!(events[1].end, at(8, 11, 10));
    assert!(events[0].end < events[1].start);
}

#[test]
fn abutting_slot_gets_grace_when_neighbour_is_empty() {
    let cfg = config(abutting_defs());
    let allocation = allocate(&[agenda(8, (8, 0), (10, 0), "TGax")], &cfg).unwrap();
    assert_eq!(allocation.events[0].end, at(8, 10, 10));
}

#[test]
fn occupancy_is_per_day() {
    let cfg = config(abutting_defs());
    let allocation = allocate(
        &[
            agenda(8, (8, 0), (10, 0), "TGax"),
            agenda(9, (10, 5), (12, 0), "TGay"),
        ],
        &cfg,
    )
    .unwrap();

    assert_eq!(allocation.events[0].end, at(8, 10, 10));
    assert_eq!(allocation.events[1].start, at(9, 9, 55));
}

#[test]
fn separate_meetings_in_abutting_slots_do_not_overlap() {
    let cfg = config(abutting_defs());
    let allocation = allocate(
        &[
            agenda(8, (8, 0), (10, 0), "TGax"),
            agenda(8, (10, 5), (12, 0), "TGay"),
        ],
        &cfg,
    )
    .unwrap();

    let (first, second) = (&allocation.events[0], &allocation.events[1]);
    assert_eq!(first.end, at(8, 9, 59));
    assert_eq!(second.start, at(8, 10, 5));
}

#[test]
fn grace_requires_slotted_events() {
    let table = SlotTable::new(standard_defs(), 10).unwrap();
    let mut events = vec![Event::new(session(), at(8, 8, 0), at(8, 10, 0), "TGax", "")];

    match adjust_for_grace(&mut events, &table) {
        Err(EngineError::NotSlotted(label)) => assert!(label.contains("TGax")),
        other => panic!("expected NotSlotted, got {:?}", other),
    }
}

#[test]
fn unknown_slot_name_is_an_error() {
    let table = SlotTable::new(standard_defs(), 10).unwrap();
    let mut events = vec![slotted(8, (8, 0), (10, 0), "TGax", SlotSpan::single("LUNCH"))];
    assert!(matches!(
        adjust_for_grace(&mut events, &table),
        Err(EngineError::UnknownSlot(_))
    ));
}

// ── Credit ──

#[test]
fn single_slot_gets_default_credit() {
    let cfg = config(standard_defs());
    let allocation = allocate(
        &[
            agenda(8, (8, 0), (10, 0), "TGax"),
            agenda(8, (19, 30), (21, 30), "Tutorial"),
        ],
        &cfg,
    )
    .unwrap();

    let normal = allocation.events[0].attendance().unwrap();
    assert_eq!((normal.credit, normal.numerator, normal.denominator), (Credit::Normal, 1, 1));
    let extra = allocation.events[1].attendance().unwrap();
    assert_eq!((extra.credit, extra.numerator, extra.denominator), (Credit::Extra, 1, 1));
}

#[test]
fn split_sub_events_each_get_single_slot_credit() {
    let cfg = config(standard_defs());
    let allocation = allocate(&[agenda(8, (8, 0), (11, 0), "X")], &cfg).unwrap();

    for e in &allocation.events {
        let record = e.attendance().unwrap();
        assert_eq!((record.credit, record.numerator, record.denominator), (Credit::Normal, 1, 1));
    }
}

#[test]
fn multi_slot_normal_becomes_other_two_halves() {
    let cfg = config(standard_defs());
    let span = SlotSpan::new("AM1", Some("AM2".to_string()));
    let allocation = set_credit(&[slotted(8, (8, 0), (11, 0), "X", span)], &cfg).unwrap();

    let record = allocation.events[0].attendance().unwrap();
    assert_eq!(record.credit, Credit::Other);
    assert_eq!((record.numerator, record.denominator), (2, 2));
}

#[test]
fn multi_slot_non_normal_keeps_credit() {
    let mut defs = standard_defs();
    defs[3].default_credit = Credit::Zero;
    let cfg = config(defs);
    let span = SlotSpan::new("PM2", Some("EVE".to_string()));
    let allocation = set_credit(&[slotted(8, (16, 0), (20, 0), "X", span)], &cfg).unwrap();

    let record = allocation.events[0].attendance().unwrap();
    assert_eq!(record.credit, Credit::Zero);
    assert_eq!((record.numerator, record.denominator), (2, 2));
}

#[test]
fn override_replaces_slot_credit() {
    let ov = CreditOverride {
        credit: Credit::Zero,
        numerator: 0,
        denominator: 0,
    };
    let cfg = config(standard_defs()).with_credit_override("Social", ov);
    let allocation = allocate(&[agenda(8, (19, 30), (21, 30), "Social")], &cfg).unwrap();

    let record = allocation.events[0].attendance().unwrap();
    assert_eq!((record.credit, record.numerator, record.denominator), (Credit::Zero, 0, 0));
}

// ── Attribution ──

fn attribution_table() -> AttributionTable {
    AttributionTable {
        breakout_to_project: [("TGax".to_string(), "802.11ax".to_string())]
            .into_iter()
            .collect(),
        project_to_descriptor: [
            ("802.11ax".to_string(), "IEEE 802.11ax".to_string()),
            ("802.11".to_string(), "IEEE 802.11 WG".to_string()),
        ]
        .into_iter()
        .collect(),
        default_project: "802.11".to_string(),
        default_descriptor: "IEEE 802".to_string(),
    }
}

#[test]
fn attendance_group_is_the_project_descriptor() {
    let mut cfg = config(standard_defs());
    cfg.attribution = attribution_table();
    let allocation = allocate(&[agenda(8, (8, 0), (10, 0), "TGAX")], &cfg).unwrap();

    assert_eq!(allocation.events[0].attendance().unwrap().group, "IEEE 802.11ax");
    assert!(allocation.notices.is_empty());
    assert_eq!(allocation.report(), "");
}

#[test]
fn attribution_misses_are_reported_once() {
    let mut cfg = config(standard_defs());
    cfg.attribution = attribution_table();
    let allocation = allocate(&[agenda(8, (8, 0), (11, 0), "TGzz")], &cfg).unwrap();

    assert_eq!(allocation.events.len(), 2);
    for e in &allocation.events {
        assert_eq!(e.attendance().unwrap().group, "IEEE 802.11 WG");
    }
    assert_eq!(allocation.notices.len(), 1, "both halves miss the same breakout");
    assert!(allocation.report().contains("Unknown breakout 'TGzz'"));
}
