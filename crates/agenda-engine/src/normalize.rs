//! Shorten raw agenda breakout descriptions to canonical meeting names.
//!
//! Schedules decorate names with standard prefixes and free-text tails
//! ("802.11 TGah -- 900 MHz bands"). The canonical form ("TGah") is the
//! identity key used by reconciliation, so it must be stable across runs.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DOTTED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^802\. (.*)$").expect("valid prefix regex"));
static REPEATED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(802\.[^ ]+ )+(.*)$").expect("valid repeated prefix regex"));
static WG_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^WG (.*)$").expect("valid WG regex"));
static DASH_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^-]+)-+ +.*$").expect("valid dash tail regex"));
static STARRED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?) ?\*+$").expect("valid asterisk regex"));
static TASK_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^TG([A-Za-z]+)$").expect("valid task group regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRules {
    /// Raw descriptions that the shortening rules would mangle, mapped verbatim.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    /// Short names mapped onto the breakout names used everywhere else.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Normalize a raw description: shorten it, then apply the alias table.
pub fn normalize_summary(raw: &str, rules: &SummaryRules) -> String {
    let short = short_breakout(raw, &rules.overrides);
    match rules.aliases.get(&short) {
        Some(alias) => alias.clone(),
        None => short,
    }
}

/// Shorten a raw breakout description.
///
/// ```
/// use std::collections::BTreeMap;
/// use agenda_engine::normalize::short_breakout;
///
/// assert_eq!(short_breakout("802.11 TGah -- 900 MHz bands", &BTreeMap::new()), "TGah");
/// assert_eq!(short_breakout("TGAY", &BTreeMap::new()), "TGay");
/// ```
pub fn short_breakout(raw: &str, overrides: &BTreeMap<String, String>) -> String {
    if let Some(fixed) = overrides.get(raw) {
        return fixed.clone();
    }

    let mut b = raw.to_string();
    b = strip(&DOTTED_PREFIX, &b, 1);
    b = strip(&REPEATED_PREFIX, &b, 2);
    b = strip(&WG_PREFIX, &b, 1);
    b = strip(&DASH_TAIL, &b, 1);
    b = strip(&STARRED, &b, 1);

    if let Some(caps) = TASK_GROUP.captures(&b) {
        b = format!("TG{}", caps[1].to_lowercase());
    }

    b.trim().to_string()
}

/// Replace `text` by the trimmed capture group `group` when `re` matches.
fn strip(re: &Regex, text: &str, group: usize) -> String {
    match re.captures(text).and_then(|caps| caps.get(group)) {
        Some(m) => m.as_str().trim().to_string(),
        None => text.to_string(),
    }
}
