//! The daily slot table used for attendance accounting.
//!
//! A slot has official boundaries (`start`..=`end`, excluding grace) and extended
//! boundaries widened so that, across the whole table, the extended ranges tile a
//! 24-hour day at minute granularity with no gaps and no overlaps. All checks run
//! once in [`SlotTable::new`]; a table that fails them is a broken deployment.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::event::Credit;

const LAST_MINUTE_OF_DAY: u32 = 24 * 60 - 1;

/// One row of the slot table as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(with = "hhmm")]
    pub extended_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub extended_end: NaiveTime,
    pub default_credit: Credit,
}

/// A validated slot with its position and derived abutment flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub index: usize,
    pub name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(with = "hhmm")]
    pub extended_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub extended_end: NaiveTime,
    pub default_credit: Credit,
    /// The gap to the previous slot is shorter than the grace period.
    pub start_abuts: bool,
    /// The gap to the next slot is shorter than the grace period.
    pub end_abuts: bool,
}

impl Slot {
    pub fn official_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    pub fn official_end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.end)
    }

    fn extended_contains(&self, minute: u32) -> bool {
        minute_of_day(self.extended_start) <= minute && minute <= minute_of_day(self.extended_end)
    }
}

/// Which edge of an event a time marks. Lookups nudge the time one minute into
/// the event so a boundary shared by two slots resolves to the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotTable {
    slots: Vec<Slot>,
    grace_minutes: u32,
}

impl SlotTable {
    /// Validate slot definitions and derive abutment flags.
    ///
    /// # Errors
    /// Returns `EngineError::SlotTable` when the table is empty, a name repeats,
    /// a slot's boundaries are out of order, neighbours overlap or are out of
    /// order, or the extended ranges do not tile 00:00..=23:59. Neighbours that
    /// do not abut must be at least twice the grace period apart, otherwise
    /// widened events in them would overlap.
    pub fn new(defs: Vec<SlotDef>, grace_minutes: u32) -> Result<Self> {
        if defs.is_empty() {
            return Err(EngineError::SlotTable("no slots defined".to_string()));
        }

        for (i, def) in defs.iter().enumerate() {
            if def.start >= def.end {
                return Err(EngineError::SlotTable(format!(
                    "slot {} starts at {} but ends at {}",
                    def.name, def.start, def.end
                )));
            }
            if def.extended_start >= def.extended_end {
                return Err(EngineError::SlotTable(format!(
                    "slot {} extended range {}-{} is empty",
                    def.name, def.extended_start, def.extended_end
                )));
            }
            if defs[..i].iter().any(|d| d.name == def.name) {
                return Err(EngineError::SlotTable(format!(
                    "slot name {} is used twice",
                    def.name
                )));
            }
        }

        for pair in defs.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.end >= next.start {
                return Err(EngineError::SlotTable(format!(
                    "slot {} ends at {} which is not before {} starts at {}",
                    prev.name, prev.end, next.name, next.start
                )));
            }
            if prev.extended_end >= next.extended_start {
                return Err(EngineError::SlotTable(format!(
                    "extended range of {} overlaps {}",
                    prev.name, next.name
                )));
            }
            if minute_of_day(next.extended_start) != minute_of_day(prev.extended_end) + 1 {
                return Err(EngineError::SlotTable(format!(
                    "gap between extended ranges of {} and {}",
                    prev.name, next.name
                )));
            }
        }

        let first = &defs[0];
        let last = &defs[defs.len() - 1];
        if minute_of_day(first.extended_start) != 0 {
            return Err(EngineError::SlotTable(format!(
                "extended range of {} must start at 00:00",
                first.name
            )));
        }
        if minute_of_day(last.extended_end) != LAST_MINUTE_OF_DAY {
            return Err(EngineError::SlotTable(format!(
                "extended range of {} must end at 23:59",
                last.name
            )));
        }

        let mut slots: Vec<Slot> = defs
            .into_iter()
            .enumerate()
            .map(|(index, def)| Slot {
                index,
                name: def.name,
                start: def.start,
                end: def.end,
                extended_start: def.extended_start,
                extended_end: def.extended_end,
                default_credit: def.default_credit,
                start_abuts: false,
                end_abuts: false,
            })
            .collect();

        let grace = i64::from(grace_minutes);
        for i in 1..slots.len() {
            let distance = i64::from(minute_of_day(slots[i].start))
                - i64::from(minute_of_day(slots[i - 1].end));
            if distance - 1 < grace {
                slots[i - 1].end_abuts = true;
                slots[i].start_abuts = true;
            } else if 2 * grace > distance {
                return Err(EngineError::SlotTable(format!(
                    "grace period of {} minutes is more than half the break between {} and {}",
                    grace_minutes,
                    slots[i - 1].name,
                    slots[i].name
                )));
            }
        }

        Ok(Self {
            slots,
            grace_minutes,
        })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn grace_minutes(&self) -> u32 {
        self.grace_minutes
    }

    pub fn grace(&self) -> Duration {
        Duration::minutes(i64::from(self.grace_minutes))
    }

    pub fn by_name(&self, name: &str) -> Result<&Slot> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::UnknownSlot(name.to_string()))
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.by_name(name).map(|s| s.index)
    }

    /// The slot whose extended range contains the time of day (minute precision).
    pub fn slot_at(&self, t: NaiveTime) -> Result<&Slot> {
        let minute = minute_of_day(t);
        self.slots
            .iter()
            .find(|s| s.extended_contains(minute))
            .ok_or(EngineError::UnmappableTime { time: t })
    }

    /// The slot an event edge falls in.
    ///
    /// Starts are nudged one minute later and ends one minute earlier before the
    /// lookup, so an event ending at 10:30 does not land in a slot that begins at 10:30.
    pub fn lookup(&self, t: NaiveDateTime, edge: Edge) -> Result<&Slot> {
        let nudged = match edge {
            Edge::Start => t + Duration::minutes(1),
            Edge::End => t - Duration::minutes(1),
        };
        self.slot_at(nudged.time())
    }
}

pub(crate) fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// `HH:MM` serialization for slot boundaries.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}
