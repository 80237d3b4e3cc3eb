// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use calgrid_layout::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DoctorError>;

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl DoctorError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::Layout(LayoutError::Extraction { .. }) => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
