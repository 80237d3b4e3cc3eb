// SPDX-License-Identifier: Apache-2.0
//! Aggregation of alignment results into a pass/fail summary.
//!
//! The report is a plain value. Printing it or writing it to disk is left to
//! whoever consumes it.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::align::{AlignmentChecker, AlignmentOutcome, AlignmentResult, AlignmentStatus, HeaderCheck};
use crate::error::Result;
use crate::extract::{ExtractedLayout, ExtractionDefaults, Extractor, HEADER_SECTIONS};
use crate::params::{Adjustment, AppointmentSpec, ParameterSet};

/// Severity of an externally supplied annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Warning,
}

/// A finding from a collaborator (e.g. a pattern checklist) attached to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub category: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub total_appointments: usize,
    pub aligned_count: usize,
    pub misaligned_count: usize,
    pub unevaluated_count: usize,
    pub max_abs_diff_px: f64,
    pub all_aligned: bool,
    pub header: HeaderCheck,
    pub recommended_adjustment_px: Option<f64>,
    pub params: ParameterSet,
    pub results: Vec<AlignmentResult>,
    /// Section identifiers in the order the source's header expression uses.
    #[serde(default = "default_header_sections")]
    pub header_sections: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

fn default_header_sections() -> Vec<String> {
    HEADER_SECTIONS.map(str::to_string).to_vec()
}

impl VerificationReport {
    #[must_use]
    pub fn from_outcome(params: &ParameterSet, outcome: AlignmentOutcome) -> Self {
        let count = |status: AlignmentStatus| {
            outcome
                .results
                .iter()
                .filter(|result| result.status == status)
                .count()
        };
        let aligned_count = count(AlignmentStatus::Aligned);
        let misaligned_count = count(AlignmentStatus::Misaligned);
        let unevaluated_count = count(AlignmentStatus::Unevaluated);
        let max_abs_diff_px = outcome
            .results
            .iter()
            .filter_map(AlignmentResult::abs_diff_px)
            .fold(0.0, f64::max);

        info!(
            total = outcome.results.len(),
            aligned_count,
            misaligned_count,
            unevaluated_count,
            max_abs_diff_px,
            header_diff_px = outcome.header.diff_px,
            "verification finished"
        );

        Self {
            total_appointments: outcome.results.len(),
            aligned_count,
            misaligned_count,
            unevaluated_count,
            max_abs_diff_px,
            all_aligned: outcome.all_aligned,
            header: outcome.header,
            recommended_adjustment_px: outcome.recommended_adjustment_px,
            params: params.clone(),
            results: outcome.results,
            header_sections: default_header_sections(),
            annotations: Vec::new(),
            limitations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Spell recommendations with the section order the source already uses.
    #[must_use]
    pub fn with_header_sections(mut self, sections: &[String]) -> Self {
        if !sections.is_empty() {
            self.header_sections = sections.to_vec();
        }
        self
    }

    /// Note every section that was verified only at its minimum height.
    #[must_use]
    pub fn with_dynamic_sections(mut self, sections: &[String]) -> Self {
        self.limitations.extend(sections.iter().map(|section| {
            format!(
                "{section} grows with its content; only its minimum height was verified"
            )
        }));
        self
    }

    #[must_use]
    pub fn recommended_adjustment(&self) -> Option<Adjustment> {
        self.recommended_adjustment_px.map(Adjustment::subtracting)
    }

    /// Nothing misaligned, nothing unevaluable, and the header matches.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.misaligned_count == 0 && self.unevaluated_count == 0 && self.header.aligned
    }

    /// The header-offset expression with the recommended adjustment applied.
    #[must_use]
    pub fn recommended_expression(&self) -> Option<String> {
        self.recommended_adjustment().map(|adjustment| {
            let sum = self.header_sections.join(" + ");
            if adjustment.px == 0.0 {
                sum
            } else {
                format!("{sum} {} {}", adjustment.sign.symbol(), adjustment.px)
            }
        })
    }
}

/// Check `appointments` against `params` and summarize.
#[must_use]
pub fn verify(params: &ParameterSet, appointments: &[AppointmentSpec]) -> VerificationReport {
    verify_with(&AlignmentChecker::default(), params, appointments)
}

#[must_use]
pub fn verify_with(
    checker: &AlignmentChecker,
    params: &ParameterSet,
    appointments: &[AppointmentSpec],
) -> VerificationReport {
    VerificationReport::from_outcome(params, checker.check(params, appointments))
}

/// Extract, then verify. Extraction failures abort before any geometry runs.
pub fn verify_source(
    text: &str,
    defaults: &ExtractionDefaults,
    checker: &AlignmentChecker,
    appointments: &[AppointmentSpec],
) -> Result<(ExtractedLayout, VerificationReport)> {
    let layout = Extractor::new(*defaults).extract(text)?;
    let report = verify_with(checker, &layout.params, appointments)
        .with_header_sections(&layout.header_sections)
        .with_dynamic_sections(&layout.dynamic_sections);
    Ok((layout, report))
}
