// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

//! Layout geometry and alignment verification for time-based calendar grids.
//!
//! Source text goes through [`extract`] to become a [`ParameterSet`]; the
//! [`geometry`] functions map times to pixel rows; [`align`] compares
//! appointment edges with gridlines; [`report`] summarizes the batch.

pub mod align;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod params;
pub mod report;

pub use align::{
    ALIGNMENT_EPSILON_PX, AlignmentChecker, AlignmentOutcome, AlignmentResult, AlignmentStatus,
    HeaderCheck, recommend_adjustment,
};
pub use error::{LayoutError, Result};
pub use extract::{
    ExtractedLayout, ExtractionDefaults, Extractor, Field, FieldSource, extract_parameters,
};
pub use geometry::{
    AppointmentBlock, GridLine, GridLines, appointment_block, grid_lines, header_offset,
    minutes_from_grid_start, y_for_time,
};
pub use params::{Adjustment, AdjustmentSign, AppointmentSpec, BorderWidths, ParameterSet, TimePoint};
pub use report::{Annotation, Severity, VerificationReport, verify, verify_source, verify_with};
