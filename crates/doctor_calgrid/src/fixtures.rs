// SPDX-License-Identifier: Apache-2.0
//! Appointment fixtures: built-in sets per profile, or a caller-supplied JSON file.

use std::path::Path;

use calgrid_layout::AppointmentSpec;

use crate::error::{DoctorError, Result};
use crate::util::ensure_exists;

const WEEKLY_VIEW: &str = include_str!("../fixtures/weekly-view.json");
const DAILY_VIEW: &str = include_str!("../fixtures/daily-view.json");

const BUILTIN_FIXTURES: [(&str, &str); 2] = [("weekly-view", WEEKLY_VIEW), ("daily-view", DAILY_VIEW)];

pub fn load_builtin_fixtures(name: &str) -> Result<Vec<AppointmentSpec>> {
    let (_, content) = BUILTIN_FIXTURES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| DoctorError::invalid(format!("no built-in fixtures named {name}")))?;
    parse_fixtures(content)
}

pub fn load_fixtures_file(path: &Path) -> Result<Vec<AppointmentSpec>> {
    ensure_exists(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_fixtures(&content)
}

/// Parse a JSON array of `{label, start, end}`. Inverted intervals are kept
/// so the checker can report them per appointment.
pub fn parse_fixtures(content: &str) -> Result<Vec<AppointmentSpec>> {
    let fixtures: Vec<AppointmentSpec> = serde_json::from_str(content)?;
    if fixtures.is_empty() {
        return Err(DoctorError::invalid("fixture list is empty"));
    }
    Ok(fixtures)
}
