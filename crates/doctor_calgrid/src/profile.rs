// SPDX-License-Identifier: Apache-2.0
use std::collections::BTreeMap;

use calgrid_layout::{ALIGNMENT_EPSILON_PX, BorderWidths, ExtractionDefaults};

use crate::error::{DoctorError, Result};

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: String,
    pub values: BTreeMap<String, String>,
}

impl Profile {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_u8(&self, key: &str) -> Option<u8> {
        self.get(key).and_then(|raw| raw.trim().parse::<u8>().ok())
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|raw| raw.trim().parse::<f64>().ok())
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.get("description").unwrap_or_default()
    }

    /// Fallbacks for fields the source text does not declare.
    #[must_use]
    pub fn extraction_defaults(&self) -> ExtractionDefaults {
        let base = ExtractionDefaults::default();
        ExtractionDefaults {
            hour_row_height_px: self
                .get_f64("hour_row_height_px")
                .unwrap_or(base.hour_row_height_px),
            grid_start_hour: self.get_u8("grid_start_hour").unwrap_or(base.grid_start_hour),
            grid_end_hour: self.get_u8("grid_end_hour").unwrap_or(base.grid_end_hour),
            border_widths: BorderWidths {
                day_names: self
                    .get_f64("day_names_border_px")
                    .unwrap_or(base.border_widths.day_names),
                all_day: self
                    .get_f64("all_day_border_px")
                    .unwrap_or(base.border_widths.all_day),
                notes: self
                    .get_f64("notes_border_px")
                    .unwrap_or(base.border_widths.notes),
            },
        }
    }

    #[must_use]
    pub fn epsilon_px(&self) -> f64 {
        self.get_f64("epsilon_px").unwrap_or(ALIGNMENT_EPSILON_PX)
    }

    #[must_use]
    pub fn checklist_name(&self) -> &str {
        self.get("checklist").unwrap_or(&self.name)
    }

    #[must_use]
    pub fn fixtures_name(&self) -> &str {
        self.get("fixtures").unwrap_or(&self.name)
    }
}

const WEEKLY_VIEW: &str = include_str!("../profiles/weekly-view.env");
const DAILY_VIEW: &str = include_str!("../profiles/daily-view.env");

const BUILTIN_PROFILES: [(&str, &str); 2] = [("weekly-view", WEEKLY_VIEW), ("daily-view", DAILY_VIEW)];

pub const DEFAULT_PROFILE: &str = "weekly-view";

#[must_use]
pub fn list_profile_names() -> Vec<String> {
    BUILTIN_PROFILES
        .iter()
        .map(|(name, _)| (*name).to_string())
        .collect()
}

pub fn load_profile(name: &str) -> Result<Profile> {
    let (_, content) = BUILTIN_PROFILES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| DoctorError::ProfileNotFound {
            name: name.to_string(),
        })?;

    Ok(Profile {
        name: name.to_string(),
        values: parse_profile_content(content),
    })
}

#[must_use]
pub fn parse_profile_content(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_string();
        let mut value = value_raw.trim().to_string();

        if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
            value = value[1..value.len() - 1].to_string();
        }

        values.insert(key, value);
    }

    values
}
