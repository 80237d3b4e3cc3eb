// SPDX-License-Identifier: Apache-2.0
//! Pattern-presence checklist.
//!
//! A flat list of string-containment rules run over the component source.
//! There is no geometry here; findings are attached to the verification
//! report as annotations, or persisted on their own by `audit`.

use calgrid_layout::{Annotation, Severity};
use serde::Serialize;

use crate::error::{DoctorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// At least one needle must occur.
    Present,
    /// No needle may occur.
    Absent,
    /// Total occurrences across needles must not exceed the bound.
    AtMost(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct ChecklistRule {
    pub category: &'static str,
    pub severity: Severity,
    pub needles: &'static [&'static str],
    pub expectation: Expectation,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: String,
    pub severity: Severity,
    pub description: String,
    pub file: String,
}

impl From<&Finding> for Annotation {
    fn from(finding: &Finding) -> Self {
        Annotation {
            category: finding.category.clone(),
            severity: finding.severity,
            description: finding.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistOutcome {
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ChecklistOutcome {
    #[must_use]
    pub fn annotations(&self) -> Vec<Annotation> {
        self.issues
            .iter()
            .chain(&self.warnings)
            .map(Annotation::from)
            .collect()
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .chain(&self.warnings)
            .filter(|finding| finding.severity == severity)
            .count()
    }

    pub fn push(&mut self, finding: Finding) {
        if finding.severity == Severity::Warning {
            self.warnings.push(finding);
        } else {
            self.issues.push(finding);
        }
    }
}

macro_rules! rule {
    ($category:expr, $severity:ident, $expectation:expr, [$($needle:expr),+ $(,)?], $description:expr) => {
        ChecklistRule {
            category: $category,
            severity: Severity::$severity,
            needles: &[$($needle),+],
            expectation: $expectation,
            description: $description,
        }
    };
}

const WEEKLY_VIEW_RULES: &[ChecklistRule] = &[
    rule!(
        "POSITIONING",
        Warning,
        Expectation::Present,
        ["position: absolute", "position: \"absolute\""],
        "Appointments may not be using absolute positioning"
    ),
    rule!(
        "TIMEZONE",
        Warning,
        Expectation::Present,
        ["America/New_York", "timeZone", "TIME_ZONE"],
        "No timezone conversion found"
    ),
    rule!(
        "LAYOUT",
        Warning,
        Expectation::Present,
        ["maxHolidaysInAnyDay"],
        "All-day section height may not be dynamic"
    ),
];

const DAILY_VIEW_RULES: &[ChecklistRule] = &[
    rule!("DRAG_DROP", Critical, Expectation::Present, ["handleDragStart"], "handleDragStart function not found"),
    rule!("DRAG_DROP", Critical, Expectation::Present, ["handleDragMove"], "handleDragMove function not found"),
    rule!("DRAG_DROP", Critical, Expectation::Present, ["handleDragEnd"], "handleDragEnd function not found"),
    rule!("DRAG_DROP", Critical, Expectation::Present, ["onMouseMove"], "onMouseMove handler not attached"),
    rule!("DRAG_DROP", Critical, Expectation::Present, ["onMouseUp"], "onMouseUp handler not attached"),
    rule!(
        "DRAG_DROP",
        Warning,
        Expectation::AtMost(5),
        ["setEvents("],
        "Multiple setEvents calls detected - potential state conflicts"
    ),
    rule!(
        "DUPLICATION",
        Warning,
        Expectation::Absent,
        ["[...localEvents, ...dbEvents]"],
        "Event merging detected - verify no duplicates"
    ),
    rule!("NOTES_DISPLAY", High, Expectation::Present, ["notes: apt.notes"], "Notes field may not be loaded from database"),
    rule!(
        "NOTES_DISPLAY",
        High,
        Expectation::Present,
        ["reminders: apt.reminders"],
        "Reminders field may not be loaded from database"
    ),
    rule!(
        "NOTES_DISPLAY",
        Critical,
        Expectation::Present,
        ["hasNotes"],
        "Notes display logic not found in appointment rendering"
    ),
    rule!(
        "NOTES_DISPLAY",
        Critical,
        Expectation::Present,
        ["hasReminders"],
        "Reminders display logic not found in appointment rendering"
    ),
    rule!("NOTES_DISPLAY", Warning, Expectation::Present, ["showMultiColumn"], "Multi-column layout logic not found"),
    rule!(
        "DATA_ACCURACY",
        Critical,
        Expectation::Present,
        ["trpc.appointments.getByDateRange.useQuery"],
        "Database query not found"
    ),
    rule!("DATA_ACCURACY", Warning, Expectation::Present, ["title: apt.title"], "Title field mapping not found"),
    rule!("DATA_ACCURACY", Warning, Expectation::Present, ["currentDateStr"], "Date string variable not found"),
    rule!(
        "STATE_MANAGEMENT",
        Warning,
        Expectation::AtMost(15),
        ["useState"],
        "High number of useState hooks - consider refactoring"
    ),
];

const BUILTIN_RULESETS: [(&str, &[ChecklistRule]); 2] =
    [("weekly-view", WEEKLY_VIEW_RULES), ("daily-view", DAILY_VIEW_RULES)];

pub fn load_ruleset(name: &str) -> Result<&'static [ChecklistRule]> {
    BUILTIN_RULESETS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, rules)| *rules)
        .ok_or_else(|| DoctorError::invalid(format!("no checklist named {name}")))
}

impl ChecklistRule {
    /// `None` when the rule holds, otherwise the finding text.
    #[must_use]
    pub fn evaluate(&self, text: &str) -> Option<String> {
        let occurrences: usize = self
            .needles
            .iter()
            .map(|needle| text.matches(needle).count())
            .sum();
        match self.expectation {
            Expectation::Present if occurrences == 0 => Some(self.description.to_string()),
            Expectation::Absent if occurrences > 0 => Some(self.description.to_string()),
            Expectation::AtMost(limit) if occurrences > limit => {
                Some(format!("{} ({occurrences} found, limit {limit})", self.description))
            }
            _ => None,
        }
    }
}

#[must_use]
pub fn run_checklist(rules: &[ChecklistRule], text: &str, file: &str) -> ChecklistOutcome {
    let mut outcome = ChecklistOutcome::default();
    for rule in rules {
        if let Some(description) = rule.evaluate(text) {
            tracing::debug!(category = rule.category, %description, "checklist rule violated");
            outcome.push(Finding {
                category: rule.category.to_string(),
                severity: rule.severity,
                description,
                file: file.to_string(),
            });
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use calgrid_layout::Severity;

    use super::{Expectation, load_ruleset, run_checklist};

    #[test]
    fn weekly_rules_pass_on_a_complete_component() {
        let rules = load_ruleset("weekly-view").expect("ruleset");
        let text = r#"const TIME_ZONE = "America/New_York"; maxHolidaysInAnyDay; style={{ position: "absolute" }}"#;
        let outcome = run_checklist(rules, text, "WeeklyView.tsx");
        assert!(outcome.issues.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn weekly_rules_warn_when_markers_are_missing() {
        let rules = load_ruleset("weekly-view").expect("ruleset");
        let outcome = run_checklist(rules, "export function WeeklyView() {}", "WeeklyView.tsx");
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.warnings.len(), 3);
        assert_eq!(outcome.warnings[1].description, "No timezone conversion found");
        assert_eq!(outcome.annotations().len(), 3);
    }

    #[test]
    fn daily_rules_split_issues_from_warnings() {
        let rules = load_ruleset("daily-view").expect("ruleset");
        let text = "handleDragStart handleDragMove handleDragEnd onMouseMove onMouseUp \
                    setEvents( setEvents( setEvents( setEvents( setEvents( setEvents(";
        let outcome = run_checklist(rules, text, "DailyView.tsx");
        assert_eq!(outcome.count(Severity::Critical), 3);
        assert_eq!(outcome.count(Severity::High), 2);
        assert!(
            outcome
                .warnings
                .iter()
                .any(|finding| finding.description.contains("(6 found, limit 5)"))
        );
        assert!(outcome.issues.iter().all(|finding| finding.file == "DailyView.tsx"));
    }

    #[test]
    fn absent_expectation_flags_presence() {
        let rules = load_ruleset("daily-view").expect("ruleset");
        let merge = rules
            .iter()
            .find(|rule| rule.expectation == Expectation::Absent)
            .expect("merge rule");
        assert!(merge.evaluate("[...localEvents, ...dbEvents]").is_some());
        assert!(merge.evaluate("events").is_none());
    }

    #[test]
    fn unknown_ruleset_is_rejected() {
        assert!(load_ruleset("monthly-view").is_err());
    }
}
