// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use crate::params::TimePoint;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A required layout parameter was not found in the source text.
    #[error("could not locate layout parameter `{field}`")]
    Extraction { field: String },

    #[error("time {time} is outside the visible grid")]
    OutOfRange { time: TimePoint },

    #[error("appointment `{label}` ({start}-{end}) has a non-positive height")]
    InvalidInterval {
        label: String,
        start: TimePoint,
        end: TimePoint,
    },

    #[error("invalid layout parameters: {message}")]
    InvalidParameters { message: String },
}

impl LayoutError {
    #[must_use]
    pub fn extraction(field: impl Into<String>) -> Self {
        Self::Extraction {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }
}
