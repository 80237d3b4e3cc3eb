// SPDX-License-Identifier: Apache-2.0
//! Console, HTML and JSON presentation of a verification run.

use std::path::Path;

use calgrid_layout::{AlignmentStatus, Severity, VerificationReport};
use serde::Serialize;

use crate::checklist::{ChecklistOutcome, Finding};
use crate::error::Result;
use crate::util::{CliOutput, SourceSnapshot, write_string};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FindingSummary {
    pub total_issues: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub warnings: usize,
}

impl FindingSummary {
    #[must_use]
    pub fn from_outcome(outcome: &ChecklistOutcome) -> Self {
        Self {
            total_issues: outcome.issues.len(),
            critical: outcome.count(Severity::Critical),
            high: outcome.count(Severity::High),
            medium: outcome.count(Severity::Medium),
            warnings: outcome.warnings.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub path: String,
    pub sha256: String,
}

impl From<&SourceSnapshot> for SourceRef {
    fn from(snapshot: &SourceSnapshot) -> Self {
        Self {
            path: snapshot.path.clone(),
            sha256: snapshot.sha256.clone(),
        }
    }
}

/// The document written by `--output-json`.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedReport {
    pub generated_at: String,
    pub profile: String,
    pub source: SourceRef,
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub summary: FindingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
}

impl PersistedReport {
    #[must_use]
    pub fn new(
        profile: &str,
        snapshot: &SourceSnapshot,
        findings: ChecklistOutcome,
        verification: Option<VerificationReport>,
    ) -> Self {
        let summary = FindingSummary::from_outcome(&findings);
        Self {
            generated_at: crate::util::now_utc_iso(),
            profile: profile.to_string(),
            source: SourceRef::from(snapshot),
            issues: findings.issues,
            warnings: findings.warnings,
            summary,
            verification,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_string(path, &content)
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        write_string(path, &render_html(self))
    }
}

fn format_px(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |px| format!("{px:.2}"))
}

pub fn print_verification(ui: &CliOutput, report: &VerificationReport) {
    ui.rule(Some("Alignment"));
    for result in &report.results {
        let line = format!(
            "{} {}-{} top={} grid={} diff={}",
            result.label,
            result.start,
            result.end,
            format_px(result.computed_top_y),
            format_px(result.expected_grid_y),
            format_px(result.diff_px),
        );
        match result.status {
            AlignmentStatus::Aligned => ui.success(&line),
            AlignmentStatus::Misaligned => ui.error(&line),
            AlignmentStatus::Unevaluated => ui.warning(&format!(
                "{line} ({})",
                result.error.as_deref().unwrap_or("not evaluated")
            )),
        }
    }

    ui.rule(Some("Header"));
    let header = format!(
        "computed offset {:.2}px, rendered height {:.2}px, diff {:.2}px",
        report.header.computed_offset, report.header.rendered_height, report.header.diff_px
    );
    if report.header.aligned {
        ui.success(&header);
    } else {
        ui.warning(&header);
    }

    ui.info(&format!(
        "{} appointment(s): {} aligned, {} misaligned, {} unevaluated, max |diff| {:.2}px",
        report.total_appointments,
        report.aligned_count,
        report.misaligned_count,
        report.unevaluated_count,
        report.max_abs_diff_px
    ));

    if let (Some(adjustment), Some(expression)) =
        (report.recommended_adjustment(), report.recommended_expression())
    {
        ui.warning(&format!("recommended adjustment: {adjustment}"));
        ui.info(&format!("headerOffset = {expression}"));
    }

    for limitation in &report.limitations {
        ui.info(limitation);
    }
}

pub fn print_findings(ui: &CliOutput, findings: &ChecklistOutcome) {
    ui.rule(Some("Checklist"));
    if findings.issues.is_empty() && findings.warnings.is_empty() {
        ui.success("no checklist findings");
        return;
    }
    for finding in &findings.issues {
        ui.error(&format!(
            "[{:?}] {}: {}",
            finding.severity, finding.category, finding.description
        ));
    }
    for finding in &findings.warnings {
        ui.warning(&format!("{}: {}", finding.category, finding.description));
    }
}

fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

fn push_row(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<div class=\"row\"><span class=\"label\">{}</span>{}</div>\n",
        html_escape(label),
        html_escape(value)
    ));
}

#[must_use]
pub fn render_html(report: &PersistedReport) -> String {
    let mut html = String::new();
    let title = format!("Calendar grid alignment: {}", report.source.path);

    html.push_str(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    html.push_str(&format!("  <title>{}</title>\n", html_escape(&title)));
    html.push_str(
        "  <style>\n    body { font-family: ui-sans-serif, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 24px; background: #0f1115; color: #e7ebf3; }\n    h1, h2 { margin: 0 0 12px; }\n    .meta { margin-bottom: 20px; color: #a8b0c5; }\n    .card { border: 1px solid #2a3142; border-radius: 10px; padding: 14px; margin-bottom: 16px; background: #171b24; }\n    .ok { border-left: 5px solid #2cb67d; }\n    .fail { border-left: 5px solid #ef4565; }\n    .row { margin: 4px 0; font-size: 13px; color: #c8d0e3; }\n    .label { color: #8a95b5; display: inline-block; min-width: 160px; }\n    table { border-collapse: collapse; width: 100%; font-size: 13px; }\n    th, td { text-align: left; padding: 4px 8px; border-bottom: 1px solid #2a3142; }\n    td.misaligned, td.unevaluated { color: #ef4565; }\n  </style>\n</head>\n<body>\n",
    );

    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&title)));
    html.push_str(&format!(
        "<div class=\"meta\">generated_at={} | profile={} | sha256={} | issues={} | warnings={}</div>\n",
        html_escape(&report.generated_at),
        html_escape(&report.profile),
        html_escape(&report.source.sha256),
        report.summary.total_issues,
        report.summary.warnings
    ));

    if let Some(verification) = &report.verification {
        let class_name = if verification.passed() { "ok" } else { "fail" };
        html.push_str(&format!("<section class=\"card {class_name}\">\n<h2>Header</h2>\n"));
        push_row(
            &mut html,
            "computed_offset",
            &format!("{:.2}", verification.header.computed_offset),
        );
        push_row(
            &mut html,
            "rendered_height",
            &format!("{:.2}", verification.header.rendered_height),
        );
        push_row(&mut html, "diff_px", &format!("{:.2}", verification.header.diff_px));
        if let Some(expression) = verification.recommended_expression() {
            push_row(&mut html, "recommended", &format!("headerOffset = {expression}"));
        }
        for limitation in &verification.limitations {
            push_row(&mut html, "limitation", limitation);
        }
        html.push_str("</section>\n");

        html.push_str("<section class=\"card\">\n<h2>Appointments</h2>\n<table>\n");
        html.push_str(
            "<tr><th>label</th><th>start</th><th>end</th><th>top</th><th>height</th><th>grid</th><th>diff</th><th>status</th></tr>\n",
        );
        for result in &verification.results {
            let status = match result.status {
                AlignmentStatus::Aligned => "aligned",
                AlignmentStatus::Misaligned => "misaligned",
                AlignmentStatus::Unevaluated => "unevaluated",
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{status}\">{status}</td></tr>\n",
                html_escape(&result.label),
                result.start,
                result.end,
                format_px(result.computed_top_y),
                format_px(result.computed_height),
                format_px(result.expected_grid_y),
                format_px(result.diff_px),
            ));
        }
        html.push_str("</table>\n</section>\n");
    }

    if !report.issues.is_empty() || !report.warnings.is_empty() {
        html.push_str("<section class=\"card\">\n<h2>Checklist</h2>\n");
        for finding in report.issues.iter().chain(&report.warnings) {
            push_row(
                &mut html,
                &format!("{:?} {}", finding.severity, finding.category),
                &finding.description,
            );
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
