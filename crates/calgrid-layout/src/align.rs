// SPDX-License-Identifier: Apache-2.0
//! Appointment-versus-gridline comparison and correction derivation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LayoutError, Result};
use crate::geometry::{appointment_block, grid_lines, header_offset, y_for_time};
use crate::params::{Adjustment, AppointmentSpec, ParameterSet, TimePoint};

/// Tolerance for floating-point rounding. Anything larger is a real offset.
pub const ALIGNMENT_EPSILON_PX: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Aligned,
    Misaligned,
    /// The appointment could not be placed at all.
    Unevaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub label: String,
    pub start: TimePoint,
    pub end: TimePoint,
    pub duration_minutes: i64,
    pub computed_top_y: Option<f64>,
    pub computed_height: Option<f64>,
    pub expected_grid_y: Option<f64>,
    pub diff_px: Option<f64>,
    pub aligned: bool,
    pub status: AlignmentStatus,
    pub error: Option<String>,
}

impl AlignmentResult {
    fn unevaluated(spec: &AppointmentSpec, error: &LayoutError) -> Self {
        Self {
            label: spec.label.clone(),
            start: spec.start,
            end: spec.end,
            duration_minutes: spec.duration_minutes(),
            computed_top_y: None,
            computed_height: None,
            expected_grid_y: None,
            diff_px: None,
            aligned: false,
            status: AlignmentStatus::Unevaluated,
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub fn abs_diff_px(&self) -> Option<f64> {
        self.diff_px.map(f64::abs)
    }
}

/// Computed header offset against the height the sections actually render at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaderCheck {
    pub computed_offset: f64,
    pub rendered_height: f64,
    pub diff_px: f64,
    pub aligned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentOutcome {
    pub results: Vec<AlignmentResult>,
    pub header: HeaderCheck,
    pub all_aligned: bool,
    /// Subtracted amount that makes the header offset equal the rendered height.
    pub recommended_adjustment_px: Option<f64>,
}

impl AlignmentOutcome {
    /// Summarize per-appointment results and the header check.
    ///
    /// A correction is recommended when any appointment is misaligned or the
    /// header drifts. Unevaluated appointments alone never trigger one.
    #[must_use]
    pub fn new(results: Vec<AlignmentResult>, header: HeaderCheck, params: &ParameterSet) -> Self {
        let all_aligned = results.iter().all(|result| result.aligned);
        let any_misaligned = results
            .iter()
            .any(|result| result.status == AlignmentStatus::Misaligned);
        let recommended_adjustment_px =
            (any_misaligned || !header.aligned).then(|| recommend_adjustment(params));

        Self {
            results,
            header,
            all_aligned,
            recommended_adjustment_px,
        }
    }

    /// The recommendation as a sign/magnitude pair.
    #[must_use]
    pub fn recommended_adjustment(&self) -> Option<Adjustment> {
        self.recommended_adjustment_px.map(Adjustment::subtracting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentChecker {
    epsilon: f64,
}

impl Default for AlignmentChecker {
    fn default() -> Self {
        Self {
            epsilon: ALIGNMENT_EPSILON_PX,
        }
    }
}

impl AlignmentChecker {
    /// A checker with a custom tolerance. The tolerance must be finite and positive.
    pub fn with_epsilon(epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(LayoutError::invalid(format!(
                "alignment epsilon must be a positive number of pixels (got {epsilon})"
            )));
        }
        Ok(Self { epsilon })
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Check every appointment against its gridline in a single pass.
    ///
    /// Range and interval problems degrade the affected result to
    /// [`AlignmentStatus::Unevaluated`]; the rest of the batch still runs.
    #[must_use]
    pub fn check(&self, params: &ParameterSet, appointments: &[AppointmentSpec]) -> AlignmentOutcome {
        let lines: BTreeMap<TimePoint, f64> =
            grid_lines(params).map(|line| (line.time, line.y)).collect();

        let results: Vec<AlignmentResult> = appointments
            .iter()
            .map(|spec| match self.check_one(params, spec, &lines) {
                Ok(result) => result,
                Err(error) => {
                    warn!(label = %spec.label, %error, "appointment could not be evaluated");
                    AlignmentResult::unevaluated(spec, &error)
                }
            })
            .collect();

        AlignmentOutcome::new(results, self.header_check(params), params)
    }

    fn check_one(
        &self,
        params: &ParameterSet,
        spec: &AppointmentSpec,
        lines: &BTreeMap<TimePoint, f64>,
    ) -> Result<AlignmentResult> {
        let block = appointment_block(spec, params)?;
        // Off-grid starts have no line of their own; compare against the formula.
        let on_gridline = spec.start.is_half_hour();
        let expected = match on_gridline.then(|| lines.get(&spec.start)).flatten() {
            Some(y) => *y,
            None => y_for_time(spec.start, params)?,
        };
        let diff = block.top - expected;
        let aligned = diff.abs() < self.epsilon;

        debug!(
            label = %spec.label,
            start = %spec.start,
            top = block.top,
            bottom = block.bottom(),
            on_gridline,
            expected,
            diff,
            aligned,
            "checked appointment"
        );

        Ok(AlignmentResult {
            label: spec.label.clone(),
            start: spec.start,
            end: spec.end,
            duration_minutes: spec.duration_minutes(),
            computed_top_y: Some(block.top),
            computed_height: Some(block.height),
            expected_grid_y: Some(expected),
            diff_px: Some(diff),
            aligned,
            status: if aligned {
                AlignmentStatus::Aligned
            } else {
                AlignmentStatus::Misaligned
            },
            error: None,
        })
    }

    #[must_use]
    pub fn header_check(&self, params: &ParameterSet) -> HeaderCheck {
        let computed_offset = header_offset(params);
        let rendered_height = params.rendered_header_height();
        let diff_px = computed_offset - rendered_height;
        HeaderCheck {
            computed_offset,
            rendered_height,
            diff_px,
            aligned: diff_px.abs() < self.epsilon,
        }
    }
}

/// Amount to subtract from the header sum so the offset lands on the rendered
/// header height. The border widths are the term the adjustment stands in for.
#[must_use]
pub fn recommend_adjustment(params: &ParameterSet) -> f64 {
    params.header_base() - params.rendered_header_height()
}
