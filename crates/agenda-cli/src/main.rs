//! `agenda` CLI — reconcile a meeting agenda against calendar and attendance exports.
//!
//! The CLI does no network I/O. It reads JSON exports produced by whatever
//! talks to the agenda source and the destinations, runs the engine and prints
//! the run report. The action plan it can write is what those collaborators
//! then execute.
//!
//! ## Usage
//!
//! ```sh
//! # Validate a configuration and show the slot table
//! agenda check -c session.toml
//!
//! # Compute attendance submissions for an agenda export
//! agenda allocate -c session.toml -i agenda.json -o submissions.json
//!
//! # Reconcile against both destinations without touching them
//! agenda reconcile -c session.toml -i agenda.json \
//!     --calendar calendar.json --attendance attendance.json \
//!     --dry-run --plan plan.json
//! ```
//!
//! Log output goes to stderr and honours `RUST_LOG`.

use agenda_engine::plan::{submission, Action, Form, Submission};
use agenda_engine::{
    allocate, attendance_plan, calendar_plan, merge::sort_events, merge_rooms,
    normalize::normalize_summary, reconcile, AgendaInfo, AttendanceRecord, Credit, EngineConfig,
    Event, EventKind, RunReport, Session, SlotSpan,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const CANCELLED_MARK: &str = "cancelled";

#[derive(Parser)]
#[command(
    name = "agenda",
    version,
    about = "Meeting agenda reconciliation and attendance slot allocation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine decisions (splits, grace, reconciliation counts) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print the slot table
    Check {
        /// TOML configuration file
        #[arg(short, long)]
        config: String,
    },
    /// Allocate agenda meetings to attendance slots and print the submissions
    Allocate {
        /// TOML configuration file
        #[arg(short, long)]
        config: String,
        /// Agenda export (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Reconcile the agenda against destination exports and print the run report
    Reconcile {
        /// TOML configuration file
        #[arg(short, long)]
        config: String,
        /// Agenda export (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Calendar export to reconcile against
        #[arg(long)]
        calendar: Option<String>,
        /// Attendance portal export to reconcile against
        #[arg(long)]
        attendance: Option<String>,
        /// Reference instant (RFC 3339); events ending before it are frozen
        #[arg(long)]
        now: Option<String>,
        /// Mark the report as a dry run
        #[arg(long)]
        dry_run: bool,
        /// Write the destination action plan as JSON to this file
        #[arg(long)]
        plan: Option<String>,
    },
}

/// One meeting row of an agenda export.
#[derive(Debug, Deserialize)]
struct AgendaRow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    summary: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    group: Option<String>,
}

/// One event read back from the calendar.
#[derive(Debug, Deserialize)]
struct CalendarRow {
    id: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    summary: String,
    #[serde(default)]
    location: String,
}

/// One meeting record read back from the attendance portal.
#[derive(Debug, Deserialize)]
struct AttendanceRow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    summary: String,
    #[serde(default)]
    location: String,
    start_slot: String,
    #[serde(default)]
    end_slot: Option<String>,
    group: String,
    credit: Credit,
    #[serde(default)]
    numerator: u32,
    #[serde(default)]
    denominator: u32,
    #[serde(default)]
    edit: Option<String>,
}

#[derive(Serialize)]
struct Plan {
    calendar: Vec<Action>,
    attendance: Vec<Action>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { config } => {
            let cfg = load_config(&config)?;
            print!("{}", describe(&cfg));
        }
        Commands::Allocate {
            config,
            input,
            output,
        } => {
            let cfg = load_config(&config)?;
            let events = agenda_events(&read_input(input.as_deref())?, &cfg)?;
            let allocation = allocate(&events, &cfg).context("Failed to allocate attendance slots")?;

            let submissions = allocation
                .events
                .iter()
                .map(|e| submission(e, Form::Edit))
                .collect::<Result<Vec<Submission>, _>>()
                .context("Failed to build attendance submissions")?;
            let json = serde_json::to_string_pretty(&submissions)?;
            write_output(output.as_deref(), &(json + "\n"))?;
        }
        Commands::Reconcile {
            config,
            input,
            calendar,
            attendance,
            now,
            dry_run,
            plan,
        } => {
            let cfg = load_config(&config)?;
            let events = agenda_events(&read_input(input.as_deref())?, &cfg)?;
            let now = parse_now(now.as_deref())?;

            let mut report = RunReport::new(dry_run);
            let mut actions = Plan {
                calendar: Vec::new(),
                attendance: Vec::new(),
            };

            if let Some(path) = attendance {
                let allocation =
                    allocate(&events, &cfg).context("Failed to allocate attendance slots")?;
                let existing = attendance_events(&read_file(&path)?, cfg.session)
                    .with_context(|| format!("Failed to parse attendance export: {}", path))?;

                let rec = reconcile(&allocation.events, "agenda", &existing, "attendance", now);
                report.add_section("Attendance", &rec.report);
                report.add_notices(&allocation.notices);
                actions.attendance =
                    attendance_plan(&rec).context("Failed to plan attendance updates")?;
            }

            if let Some(path) = calendar {
                let existing = calendar_events(&read_file(&path)?, cfg.session)
                    .with_context(|| format!("Failed to parse calendar export: {}", path))?;

                let rec = reconcile(&events, "agenda", &existing, "calendar", now);
                report.add_section("Calendar", &rec.report);
                actions.calendar = calendar_plan(&rec);
            }

            print!("{}", report.render());

            if let Some(path) = plan {
                let json = serde_json::to_string_pretty(&actions)?;
                write_output(Some(path.as_str()), &(json + "\n"))?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &str) -> Result<EngineConfig> {
    EngineConfig::load(Path::new(path)).with_context(|| format!("Failed to load config: {}", path))
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --now timestamp: {}", s))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Parse an agenda export into wanted, normalized, room-merged events.
fn agenda_events(json: &str, cfg: &EngineConfig) -> Result<Vec<Event>> {
    let rows: Vec<AgendaRow> =
        serde_json::from_str(json).context("Failed to parse agenda export")?;

    let mut events = Vec::new();
    for row in rows {
        let summary = normalize_summary(&row.summary, &cfg.summaries);
        let route = cfg.selection.route(row.group.as_deref(), &summary);
        if !route.is_wanted() {
            tracing::debug!(summary = %summary, group = ?row.group, "not selected");
            continue;
        }
        events.push(
            Event::new(cfg.session, row.start, row.end, summary, row.location).with_kind(
                EventKind::Agenda(AgendaInfo {
                    group: row.group,
                    attendance: route.attendance,
                }),
            ),
        );
    }

    let mut events = merge_rooms(events);
    sort_events(&mut events);
    Ok(events)
}

fn calendar_events(json: &str, session: Session) -> Result<Vec<Event>> {
    let rows: Vec<CalendarRow> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            Event::new(session, row.start, row.end, row.summary, row.location).with_remote_id(row.id)
        })
        .collect())
}

/// Attendance records as read back from the portal. Summaries starting with `*`
/// were entered by hand and are left alone; a `--- cancelled` suffix marks a
/// tombstone.
fn attendance_events(json: &str, session: Session) -> Result<Vec<Event>> {
    let rows: Vec<AttendanceRow> = serde_json::from_str(json)?;

    let mut events = Vec::new();
    for row in rows {
        let (summary, cancelled) = match row.summary.split_once("---") {
            Some((head, tail)) => (head.trim().to_string(), tail.trim() == CANCELLED_MARK),
            None => (row.summary.trim().to_string(), false),
        };
        if summary.starts_with('*') {
            continue;
        }

        let mut event = Event::new(session, row.start, row.end, summary, row.location).with_kind(
            EventKind::Attendance {
                span: SlotSpan::new(row.start_slot, row.end_slot),
                record: AttendanceRecord {
                    group: row.group,
                    credit: row.credit,
                    edit: row.edit,
                    numerator: row.numerator,
                    denominator: row.denominator,
                },
            },
        );
        event.deleted = cancelled;
        events.push(event);
    }
    Ok(events)
}

/// Session summary and slot table, one slot per line.
fn describe(cfg: &EngineConfig) -> String {
    let mut out = format!(
        "Session {} (UTC{:+}), grace {} min\n",
        cfg.session.start,
        cfg.session.utc_offset_hours,
        cfg.slots.grace_minutes()
    );
    for slot in cfg.slots.slots() {
        let mut abuts = Vec::new();
        if slot.start_abuts {
            abuts.push("abuts previous");
        }
        if slot.end_abuts {
            abuts.push("abuts next");
        }
        out.push_str(&format!(
            "{:<6} {}-{}  extended {}-{}  {}",
            slot.name,
            slot.start.format("%H:%M"),
            slot.end.format("%H:%M"),
            slot.extended_start.format("%H:%M"),
            slot.extended_end.format("%H:%M"),
            slot.default_credit
        ));
        if !abuts.is_empty() {
            out.push_str(&format!("  ({})", abuts.join(", ")));
        }
        out.push('\n');
    }
    out
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => read_file(path),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
