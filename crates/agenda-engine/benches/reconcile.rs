use std::hint::black_box;

use agenda_engine::event::{Event, Session};
use agenda_engine::merge::merge_rooms;
use agenda_engine::reconcile::reconcile;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// A week-long session with `per_day` meetings a day, each in two rooms.
fn session_events(per_day: usize) -> Vec<Event> {
    let session = Session::new(NaiveDate::from_ymd_opt(2017, 5, 7).unwrap(), 9);
    let mut events = Vec::new();
    for day in 0..6 {
        for i in 0..per_day {
            let start = session.anchor() + Duration::days(day) + Duration::minutes(480 + 30 * i as i64);
            for room in ["Rm1", "Rm2"] {
                events.push(Event::new(
                    session,
                    start,
                    start + Duration::hours(2),
                    format!("TG{}", i),
                    room,
                ));
            }
        }
    }
    events
}

fn bench_reconcile(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2017, 5, 1, 0, 0, 0).unwrap();
    let mut group = c.benchmark_group("reconcile");

    for per_day in [5, 20, 40] {
        let new = merge_rooms(session_events(per_day));
        // Every other meeting has moved room, every fifth is gone.
        let old: Vec<Event> = new
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 5 != 0)
            .map(|(i, e)| {
                let mut e = e.clone();
                if i % 2 == 0 {
                    e.location = "Rm9".to_string();
                }
                e
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(new.len()), &per_day, |b, _| {
            b.iter(|| reconcile(black_box(&new), "agenda", black_box(&old), "calendar", now))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let raw = session_events(40);
    c.bench_function("merge_rooms", |b| b.iter(|| merge_rooms(black_box(raw.clone()))));
}

criterion_group!(benches, bench_reconcile, bench_merge);
criterion_main!(benches);
