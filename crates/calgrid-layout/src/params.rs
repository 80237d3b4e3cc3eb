// SPDX-License-Identifier: Apache-2.0
//! Layout parameters and the time values they are queried with.
//!
//! Everything here is a plain value: a [`ParameterSet`] is built once from a
//! source snapshot and never mutated afterwards. Derived positions live in
//! [`crate::geometry`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

// ── Time ────────────────────────────────────────────────────────────────

/// A time of day at minute resolution.
///
/// `24:00` is accepted as the closing instant of a grid that runs to
/// midnight; no later time exists. Ordering is lexicographic on `(hour, minute)`. Serializes as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimePoint {
    hour: u8,
    minute: u8,
}

impl TimePoint {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if minute > 59 || hour > 24 || (hour == 24 && minute > 0) {
            return Err(LayoutError::invalid(format!(
                "time {hour:02}:{minute:02} is not a valid time of day"
            )));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u8 {
        self.minute
    }

    #[must_use]
    pub fn minutes_since_midnight(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    /// Signed distance in minutes from `self` to `later`.
    #[must_use]
    pub fn minutes_until(self, later: TimePoint) -> i64 {
        i64::from(later.minutes_since_midnight()) - i64::from(self.minutes_since_midnight())
    }

    /// Whether this time sits on a half-hour gridline.
    #[must_use]
    pub fn is_half_hour(self) -> bool {
        self.minute == 0 || self.minute == 30
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimePoint {
    type Err = LayoutError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || LayoutError::invalid(format!("invalid time literal: {raw:?}"));
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
        let hour = hour.trim().parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimePoint {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimePoint> for String {
    fn from(value: TimePoint) -> Self {
        value.to_string()
    }
}

// ── Header adjustment ───────────────────────────────────────────────────

/// Direction of the correction term applied to the naive header sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentSign {
    Plus,
    Minus,
}

impl AdjustmentSign {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Plus => '+',
            Self::Minus => '-',
        }
    }
}

/// A correction term: magnitude plus the operator it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub px: f64,
    pub sign: AdjustmentSign,
}

impl Adjustment {
    pub const NONE: Self = Self {
        px: 0.0,
        sign: AdjustmentSign::Plus,
    };

    #[must_use]
    pub fn plus(px: f64) -> Self {
        Self {
            px,
            sign: AdjustmentSign::Plus,
        }
    }

    #[must_use]
    pub fn minus(px: f64) -> Self {
        Self {
            px,
            sign: AdjustmentSign::Minus,
        }
    }

    /// Build from the amount that is *subtracted* from the header sum.
    ///
    /// A negative amount flips to `Plus` so the magnitude stays non-negative.
    #[must_use]
    pub fn subtracting(amount: f64) -> Self {
        if amount < 0.0 {
            Self::plus(-amount)
        } else {
            Self::minus(amount)
        }
    }

    /// The signed amount added to the header sum.
    #[must_use]
    pub fn offset(self) -> f64 {
        match self.sign {
            AdjustmentSign::Plus => self.px,
            AdjustmentSign::Minus => -self.px,
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}px", self.sign.symbol(), self.px)
    }
}

// ── Parameter set ───────────────────────────────────────────────────────

/// Widths of the rules drawn below each header section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BorderWidths {
    pub day_names: f64,
    pub all_day: f64,
    pub notes: f64,
}

impl BorderWidths {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.day_names + self.all_day + self.notes
    }
}

/// The layout constants of one calendar grid variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub day_names_height_px: f64,
    pub all_day_base_height_px: f64,
    pub all_day_min_height_px: f64,
    pub notes_height_px: f64,
    pub border_widths: BorderWidths,
    pub adjustment: Adjustment,
    pub hour_row_height_px: f64,
    pub grid_start_hour: u8,
    pub grid_end_hour: u8,
}

impl ParameterSet {
    #[must_use]
    pub fn pixels_per_minute(&self) -> f64 {
        self.hour_row_height_px / 60.0
    }

    /// Sum of the stacked section heights, before any adjustment.
    #[must_use]
    pub fn header_base(&self) -> f64 {
        self.day_names_height_px + self.all_day_base_height_px + self.notes_height_px
    }

    /// Header height as the browser lays it out: sections plus their rules.
    #[must_use]
    pub fn rendered_header_height(&self) -> f64 {
        self.header_base() + self.border_widths.total()
    }

    /// Number of half-hour gridlines inside `[grid_start_hour, grid_end_hour)`.
    #[must_use]
    pub fn half_hour_steps(&self) -> usize {
        usize::from(self.grid_end_hour.saturating_sub(self.grid_start_hour)) * 2
    }

    #[must_use]
    pub fn with_adjustment(&self, adjustment: Adjustment) -> Self {
        Self {
            adjustment,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("dayNamesHeight", self.day_names_height_px),
            ("allDayBaseHeight", self.all_day_base_height_px),
            ("allDayMinHeight", self.all_day_min_height_px),
            ("notesHeight", self.notes_height_px),
            ("dayNamesBorder", self.border_widths.day_names),
            ("allDayBorder", self.border_widths.all_day),
            ("notesBorder", self.border_widths.notes),
            ("adjustment", self.adjustment.px),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::invalid(format!(
                    "{name} must be a finite, non-negative length (got {value})"
                )));
            }
        }

        if !self.hour_row_height_px.is_finite() || self.hour_row_height_px <= 0.0 {
            return Err(LayoutError::invalid(format!(
                "hourRowHeight must be positive (got {})",
                self.hour_row_height_px
            )));
        }

        if self.grid_start_hour >= self.grid_end_hour {
            return Err(LayoutError::invalid(format!(
                "grid start hour {} must precede end hour {}",
                self.grid_start_hour, self.grid_end_hour
            )));
        }
        if self.grid_end_hour > 24 {
            return Err(LayoutError::invalid(format!(
                "grid end hour {} is past midnight",
                self.grid_end_hour
            )));
        }

        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// An appointment to place on the grid.
///
/// Deserialization does not enforce `start < end`; the alignment checker
/// reports such fixtures as unevaluable instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSpec {
    pub label: String,
    pub start: TimePoint,
    pub end: TimePoint,
}

impl AppointmentSpec {
    pub fn new(label: impl Into<String>, start: TimePoint, end: TimePoint) -> Result<Self> {
        let label = label.into();
        if start >= end {
            return Err(LayoutError::InvalidInterval { label, start, end });
        }
        Ok(Self { label, start, end })
    }

    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        self.start.minutes_until(self.end)
    }
}
