// SPDX-License-Identifier: Apache-2.0
//! Time-to-pixel geometry for the calendar grid.
//!
//! Gridlines and appointment edges are both placed with [`y_for_time`]; there
//! is no second formula. Any disagreement between the two can therefore only
//! come from the parameters, never from the arithmetic.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::params::{AppointmentSpec, ParameterSet, TimePoint};

/// A horizontal reference line at a half-hour time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub time: TimePoint,
    pub y: f64,
}

/// Vertical extent of a placed appointment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppointmentBlock {
    pub top: f64,
    pub height: f64,
}

impl AppointmentBlock {
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Vertical origin of the time grid: the stacked header sum plus adjustment.
#[must_use]
pub fn header_offset(params: &ParameterSet) -> f64 {
    params.header_base() + params.adjustment.offset()
}

/// Minutes between the grid start and `time`.
///
/// `grid_end_hour:00` is accepted so appointments can end on the last line.
pub fn minutes_from_grid_start(time: TimePoint, params: &ParameterSet) -> Result<u32> {
    let hour = time.hour();
    let past_end = hour > params.grid_end_hour
        || (hour == params.grid_end_hour && time.minute() > 0);
    if hour < params.grid_start_hour || past_end {
        return Err(LayoutError::OutOfRange { time });
    }
    Ok(u32::from(hour - params.grid_start_hour) * 60 + u32::from(time.minute()))
}

pub fn y_for_time(time: TimePoint, params: &ParameterSet) -> Result<f64> {
    let minutes = minutes_from_grid_start(time, params)?;
    Ok(header_offset(params) + f64::from(minutes) * params.pixels_per_minute())
}

/// Every half-hour gridline in `[grid_start_hour, grid_end_hour)`, top down.
///
/// The iterator is lazy and cheap to clone; a clone restarts from wherever
/// the original was.
#[must_use]
pub fn grid_lines(params: &ParameterSet) -> GridLines<'_> {
    GridLines {
        params,
        next: 0,
        steps: params.half_hour_steps(),
    }
}

pub fn appointment_block(spec: &AppointmentSpec, params: &ParameterSet) -> Result<AppointmentBlock> {
    let top = y_for_time(spec.start, params)?;
    let bottom = y_for_time(spec.end, params)?;
    let height = bottom - top;
    if height <= 0.0 {
        return Err(LayoutError::InvalidInterval {
            label: spec.label.clone(),
            start: spec.start,
            end: spec.end,
        });
    }
    Ok(AppointmentBlock { top, height })
}

#[derive(Debug, Clone)]
pub struct GridLines<'a> {
    params: &'a ParameterSet,
    next: usize,
    steps: usize,
}

impl GridLines<'_> {
    fn time_at(&self, step: usize) -> Option<TimePoint> {
        let hour = usize::from(self.params.grid_start_hour) + step / 2;
        let minute = if step % 2 == 0 { 0 } else { 30 };
        TimePoint::new(u8::try_from(hour).ok()?, minute).ok()
    }
}

impl Iterator for GridLines<'_> {
    type Item = GridLine;

    fn next(&mut self) -> Option<GridLine> {
        if self.next >= self.steps {
            return None;
        }
        let time = self.time_at(self.next);
        self.next += 1;
        let time = time?;
        let y = y_for_time(time, self.params).ok()?;
        Some(GridLine { time, y })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridLines<'_> {}

impl FusedIterator for GridLines<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Adjustment, BorderWidths};

    fn weekly() -> ParameterSet {
        ParameterSet {
            day_names_height_px: 60.0,
            all_day_base_height_px: 40.0,
            all_day_min_height_px: 40.0,
            notes_height_px: 80.0,
            border_widths: BorderWidths::default(),
            adjustment: Adjustment::minus(67.0),
            hour_row_height_px: 100.0,
            grid_start_hour: 6,
            grid_end_hour: 22,
        }
    }

    fn at(hour: u8, minute: u8) -> TimePoint {
        TimePoint::new(hour, minute).expect("valid time")
    }

    #[test]
    fn header_offset_applies_sign() {
        let params = weekly();
        assert_eq!(header_offset(&params), 113.0);
        assert_eq!(header_offset(&params.with_adjustment(Adjustment::plus(4.0))), 184.0);
        assert_eq!(header_offset(&params.with_adjustment(Adjustment::NONE)), 180.0);
    }

    #[test]
    fn y_for_time_matches_hand_computed_positions() {
        let params = weekly();
        assert!((y_for_time(at(7, 0), &params).expect("in range") - 213.0).abs() < 1e-9);
        assert!((y_for_time(at(7, 30), &params).expect("in range") - 263.0).abs() < 1e-9);
        assert!((y_for_time(at(6, 0), &params).expect("in range") - 113.0).abs() < 1e-9);
    }

    #[test]
    fn minutes_from_grid_start_bounds() {
        let params = weekly();
        assert_eq!(minutes_from_grid_start(at(6, 0), &params), Ok(0));
        assert_eq!(minutes_from_grid_start(at(21, 59), &params), Ok(959));
        assert_eq!(minutes_from_grid_start(at(22, 0), &params), Ok(960));
        assert_eq!(
            minutes_from_grid_start(at(22, 1), &params),
            Err(LayoutError::OutOfRange { time: at(22, 1) })
        );
        assert!(minutes_from_grid_start(at(5, 59), &params).is_err());
        assert!(minutes_from_grid_start(at(23, 0), &params).is_err());
    }

    #[test]
    fn grid_lines_cover_half_hours_and_restart_on_clone() {
        let params = weekly();
        let lines = grid_lines(&params);
        assert_eq!(lines.len(), 32);

        let restart = lines.clone();
        let collected: Vec<_> = lines.collect();
        assert_eq!(collected.len(), 32);
        assert_eq!(collected[0].time, at(6, 0));
        assert_eq!(collected[1].time, at(6, 30));
        assert_eq!(collected[31].time, at(21, 30));
        assert_eq!(restart.count(), 32);
    }

    #[test]
    fn appointment_block_spans_start_to_end() {
        let params = weekly();
        let spec = AppointmentSpec::new("Richie Hayes", at(7, 0), at(8, 0)).expect("valid");
        let block = appointment_block(&spec, &params).expect("placed");
        assert!((block.top - 213.0).abs() < 1e-9);
        assert!((block.height - 100.0).abs() < 1e-9);
        assert!((block.bottom() - 313.0).abs() < 1e-9);
    }

    #[test]
    fn full_day_grid_places_appointment_ending_at_midnight() {
        let mut params = weekly();
        params.grid_start_hour = 0;
        params.grid_end_hour = 24;
        assert!(params.validate().is_ok());
        assert_eq!(grid_lines(&params).last().map(|line| line.time), Some(at(23, 30)));

        let spec = AppointmentSpec::new("Night shift", at(23, 0), at(24, 0)).expect("valid");
        let block = appointment_block(&spec, &params).expect("placed");
        assert!((block.top - (113.0 + 2300.0)).abs() < 1e-9);
        assert!((block.bottom() - (113.0 + 2400.0)).abs() < 1e-9);
        assert!(AppointmentSpec::new("Late", at(24, 0), at(24, 0)).is_err());
    }

    #[test]
    fn appointment_block_rejects_inverted_fixture() {
        let params = weekly();
        let spec = AppointmentSpec {
            label: "Backwards".to_string(),
            start: at(9, 0),
            end: at(8, 0),
        };
        assert!(matches!(
            appointment_block(&spec, &params),
            Err(LayoutError::InvalidInterval { .. })
        ));
    }
}
