//! Map a meeting summary to the project descriptor attendance is attributed to.
//!
//! Lookups never fail. A summary or project missing from the tables falls back
//! to the configured default, and the miss is logged and returned so the run
//! report can ask an operator to extend the tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionTable {
    /// Breakout (matched case-insensitively) to project.
    #[serde(default)]
    pub breakout_to_project: BTreeMap<String, String>,
    #[serde(default)]
    pub project_to_descriptor: BTreeMap<String, String>,
    #[serde(default)]
    pub default_project: String,
    #[serde(default)]
    pub default_descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributionMiss {
    UnknownBreakout { summary: String, fallback: String },
    UnknownProject { project: String, fallback: String },
}

impl fmt::Display for AttributionMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributionMiss::UnknownBreakout { summary, fallback } => write!(
                f,
                "Unknown breakout '{}', defaulting to project '{}'",
                summary, fallback
            ),
            AttributionMiss::UnknownProject { project, fallback } => write!(
                f,
                "Unknown project '{}', defaulting to descriptor '{}'",
                project, fallback
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub project: String,
    pub descriptor: String,
    pub misses: Vec<AttributionMiss>,
}

impl AttributionTable {
    pub fn resolve(&self, summary: &str) -> Attribution {
        let mut misses = Vec::new();
        let needle = summary.to_lowercase();

        let project = match self
            .breakout_to_project
            .iter()
            .find(|(breakout, _)| breakout.to_lowercase() == needle)
        {
            Some((_, project)) => project.clone(),
            None => {
                tracing::warn!(
                    summary,
                    fallback = %self.default_project,
                    "unknown breakout, using default project"
                );
                misses.push(AttributionMiss::UnknownBreakout {
                    summary: summary.to_string(),
                    fallback: self.default_project.clone(),
                });
                self.default_project.clone()
            }
        };

        let descriptor = match self.project_to_descriptor.get(&project) {
            Some(descriptor) => descriptor.clone(),
            None => {
                tracing::warn!(
                    project = %project,
                    fallback = %self.default_descriptor,
                    "unknown project, using default descriptor"
                );
                misses.push(AttributionMiss::UnknownProject {
                    project: project.clone(),
                    fallback: self.default_descriptor.clone(),
                });
                self.default_descriptor.clone()
            }
        };

        Attribution {
            project,
            descriptor,
            misses,
        }
    }
}
