//! The plain-text report an operator receives after a run.

use crate::attribution::AttributionMiss;

pub const DRY_RUN_BANNER: &str = "WARNING: Dry run.  No changes made.";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    title: String,
    body: String,
}

/// Per-destination reconciliation reports and attribution notices for one run.
///
/// Sections with an empty body are dropped, so an empty report means there is
/// nothing to notify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    sections: Vec<Section>,
    dry_run: bool,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            sections: Vec::new(),
            dry_run,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Append a titled section. `body` is newline-terminated report lines.
    pub fn add_section(&mut self, title: impl Into<String>, body: &str) {
        if body.is_empty() {
            return;
        }
        self.sections.push(Section {
            title: title.into(),
            body: body.to_string(),
        });
    }

    pub fn add_notices(&mut self, notices: &[AttributionMiss]) {
        let body: String = notices.iter().map(|n| format!("{}\n", n)).collect();
        self.add_section("Attribution", &body);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        if self.dry_run {
            out.push_str(DRY_RUN_BANNER);
            out.push_str("\n\n");
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{}:\n", section.title));
            out.push_str(&section.body);
        }
        out
    }
}
