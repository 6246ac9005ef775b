//! Decide which destinations an agenda record is posted to.
//!
//! Lists are kept per destination. The calendar lists implicitly include the
//! attendance lists, so anything accounted for attendance also appears on the
//! calendar unless it is explicitly suppressed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationLists {
    #[serde(default)]
    pub calendar: Vec<String>,
    #[serde(default)]
    pub attendance: Vec<String>,
}

/// Breakouts that are only wanted when run by one of the listed groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakoutGroups {
    #[serde(default)]
    pub calendar: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub attendance: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRules {
    /// Groups whose meetings are wanted.
    #[serde(default)]
    pub groups: DestinationLists,
    /// Individual breakouts wanted regardless of group.
    #[serde(default)]
    pub breakouts: DestinationLists,
    #[serde(default)]
    pub breakout_groups: BreakoutGroups,
    /// Breakouts never posted. The calendar list suppresses both destinations,
    /// the attendance list only the attendance destination.
    #[serde(default)]
    pub do_not_post: DestinationLists,
}

/// Where a record should be posted. `attendance` implies `calendar`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub calendar: bool,
    pub attendance: bool,
}

impl Route {
    pub fn is_wanted(&self) -> bool {
        self.calendar
    }
}

impl SelectionRules {
    pub fn route(&self, group: Option<&str>, summary: &str) -> Route {
        let attendance_match = matches(
            &self.groups.attendance,
            &self.breakouts.attendance,
            &self.breakout_groups.attendance,
            group,
            summary,
        );
        let calendar_match = attendance_match
            || matches(
                &self.groups.calendar,
                &self.breakouts.calendar,
                &self.breakout_groups.calendar,
                group,
                summary,
            );

        let suppressed = contains(&self.do_not_post.calendar, summary);
        let calendar = calendar_match && !suppressed;
        let attendance =
            calendar && attendance_match && !contains(&self.do_not_post.attendance, summary);

        Route {
            calendar,
            attendance,
        }
    }
}

fn matches(
    groups: &[String],
    breakouts: &[String],
    breakout_groups: &BTreeMap<String, Vec<String>>,
    group: Option<&str>,
    summary: &str,
) -> bool {
    if let Some(g) = group {
        if contains(groups, g) {
            return true;
        }
    }
    if contains(breakouts, summary) {
        return true;
    }
    match (breakout_groups.get(summary), group) {
        (Some(allowed), Some(g)) => contains(allowed, g),
        _ => false,
    }
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item == value)
}
