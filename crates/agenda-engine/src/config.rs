//! Engine configuration.
//!
//! The TOML file deserializes into [`RawConfig`]; [`EngineConfig::from_raw`]
//! validates it (slot table invariants, session offset) into the [`EngineConfig`]
//! passed by reference to the allocator and the CLI.
//!
//! ```toml
//! [session]
//! start = "2017-05-07"
//! time_zone = "Asia/Seoul"      # or: utc_offset_hours = 9
//!
//! [attendance]
//! grace_minutes = 10
//!
//! [[slots]]
//! name = "AM1"
//! start = "08:00"
//! end = "10:00"
//! extended_start = "00:00"
//! extended_end = "23:59"
//! default_credit = "Normal"
//!
//! [credit_overrides]
//! "Closing Plenary" = { credit = "Other", numerator = 2, denominator = 2 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::attribution::AttributionTable;
use crate::error::{EngineError, Result};
use crate::event::{Credit, Session};
use crate::normalize::SummaryRules;
use crate::selection::SelectionRules;
use crate::slot::{SlotDef, SlotTable};

const DEFAULT_GRACE_MINUTES: u32 = 10;

fn default_grace_minutes() -> u32 {
    DEFAULT_GRACE_MINUTES
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub session: SessionConfig,
    #[serde(default)]
    pub attendance: AttendanceConfig,
    pub slots: Vec<SlotDef>,
    #[serde(default)]
    pub credit_overrides: BTreeMap<String, CreditOverride>,
    #[serde(default)]
    pub selection: SelectionRules,
    #[serde(default)]
    pub attribution: AttributionTable,
    #[serde(default)]
    pub summaries: SummaryRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub start: NaiveDate,
    pub utc_offset_hours: Option<i32>,
    /// IANA name, resolved to an offset at the session start date.
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: u32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            grace_minutes: DEFAULT_GRACE_MINUTES,
        }
    }
}

/// Explicit credit for a summary. Bypasses slot-derived credit and multi-slot splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOverride {
    pub credit: Credit,
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub session: Session,
    pub slots: SlotTable,
    pub credit_overrides: BTreeMap<String, CreditOverride>,
    pub selection: SelectionRules,
    pub attribution: AttributionTable,
    pub summaries: SummaryRules,
}

impl EngineConfig {
    /// A configuration with empty lookup tables.
    pub fn new(session: Session, slots: SlotTable) -> Self {
        Self {
            session,
            slots,
            credit_overrides: BTreeMap::new(),
            selection: SelectionRules::default(),
            attribution: AttributionTable::default(),
            summaries: SummaryRules::default(),
        }
    }

    pub fn with_credit_override(mut self, summary: impl Into<String>, ov: CreditOverride) -> Self {
        self.credit_overrides.insert(summary.into(), ov);
        self
    }

    pub fn credit_override(&self, summary: &str) -> Option<&CreditOverride> {
        self.credit_overrides.get(summary)
    }

    /// # Errors
    /// Returns `EngineError::SlotTable` for a malformed slot table and
    /// `EngineError::Config`/`InvalidTimezone` for an unusable session definition.
    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        let session = resolve_session(&raw.session)?;
        let slots = SlotTable::new(raw.slots, raw.attendance.grace_minutes)?;

        Ok(Self {
            session,
            slots,
            credit_overrides: raw.credit_overrides,
            selection: raw.selection,
            attribution: raw.attribution,
            summaries: raw.summaries,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn resolve_session(cfg: &SessionConfig) -> Result<Session> {
    let offset = match (cfg.utc_offset_hours, cfg.time_zone.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(EngineError::Config(
                "session sets both utc_offset_hours and time_zone".to_string(),
            ))
        }
        (None, None) => {
            return Err(EngineError::Config(
                "session needs utc_offset_hours or time_zone".to_string(),
            ))
        }
        (Some(hours), None) => hours,
        (None, Some(name)) => zone_offset_hours(name, cfg.start)?,
    };

    if !(-14..=14).contains(&offset) {
        return Err(EngineError::Config(format!(
            "UTC offset {} hours is out of range",
            offset
        )));
    }

    Ok(Session::new(cfg.start, offset))
}

/// Offset of `name` from UTC at local noon on `date`, in whole hours.
fn zone_offset_hours(name: &str, date: NaiveDate) -> Result<i32> {
    let tz: chrono_tz::Tz = name
        .parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))?;

    let noon = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| EngineError::Config(format!("invalid session date {}", date)))?;
    let seconds = tz
        .from_local_datetime(&noon)
        .single()
        .ok_or_else(|| {
            EngineError::Config(format!("noon on {} is not a single local time in {}", date, name))
        })?
        .offset()
        .fix()
        .local_minus_utc();

    if seconds % 3600 != 0 {
        return Err(EngineError::Config(format!(
            "time zone {} is not a whole number of hours from UTC",
            name
        )));
    }
    Ok(seconds / 3600)
}
