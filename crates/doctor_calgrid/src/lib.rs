// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

pub mod audit;
pub mod checklist;
pub mod cli;
pub mod error;
pub mod fixtures;
pub mod gridlines;
pub mod profile;
pub mod render;
pub mod util;
pub mod verify;

pub use cli::run_from_env;
pub use error::{DoctorError, Result};
