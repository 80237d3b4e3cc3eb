// SPDX-License-Identifier: Apache-2.0
use std::fs;
use std::path::Path;

use chrono::Utc;
use fastapi_output::RichOutput;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlmodel_console::OutputMode as SqlModelOutputMode;

use crate::error::{DoctorError, Result};

#[must_use]
pub fn now_utc_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputIntegration {
    pub fastapi_mode: String,
    pub fastapi_agent: bool,
    pub fastapi_ci: bool,
    pub fastapi_tty: bool,
    pub sqlmodel_mode: String,
    pub sqlmodel_agent: bool,
}

impl OutputIntegration {
    #[must_use]
    pub fn detect() -> Self {
        let fastapi_detection = fastapi_output::detect_environment();
        let fastapi_mode = fastapi_output::OutputMode::auto();
        let sqlmodel_mode = SqlModelOutputMode::detect();
        Self {
            fastapi_mode: fastapi_mode.as_str().to_string(),
            fastapi_agent: fastapi_detection.is_agent,
            fastapi_ci: fastapi_detection.is_ci,
            fastapi_tty: fastapi_detection.is_tty,
            sqlmodel_mode: sqlmodel_mode.as_str().to_string(),
            sqlmodel_agent: SqlModelOutputMode::is_agent_environment(),
        }
    }

    /// Plain console output regardless of the environment.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            fastapi_mode: "plain".to_string(),
            fastapi_agent: false,
            fastapi_ci: false,
            fastapi_tty: false,
            sqlmodel_mode: "plain".to_string(),
            sqlmodel_agent: false,
        }
    }

    #[must_use]
    pub fn should_emit_json(&self) -> bool {
        self.sqlmodel_mode == "json"
    }
}

#[derive(Debug, Clone)]
pub struct CliOutput {
    inner: RichOutput,
    enabled: bool,
}

impl CliOutput {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: RichOutput::auto(),
            enabled,
        }
    }

    pub fn rule(&self, title: Option<&str>) {
        if self.enabled {
            self.inner.rule(title);
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled {
            self.inner.info(message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.enabled {
            self.inner.success(message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.enabled {
            self.inner.warning(message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.enabled {
            self.inner.error(message);
        }
    }
}

#[must_use]
pub fn output_for(integration: &OutputIntegration) -> CliOutput {
    CliOutput::new(!integration.should_emit_json())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(DoctorError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

pub fn write_string(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Snapshot of a component source. The file is closed before this returns.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub path: String,
    pub text: String,
    pub sha256: String,
}

pub fn read_source(path: &Path) -> Result<SourceSnapshot> {
    ensure_exists(path)?;
    let text = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read component source");
    Ok(SourceSnapshot {
        path: path.display().to_string(),
        sha256: sha256_hex(text.as_bytes()),
        text,
    })
}

#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::error::DoctorError;

    use super::{OutputIntegration, read_source, sha256_hex, write_string};

    #[test]
    fn sha256_of_empty_input_is_well_known() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn read_source_reports_missing_path() {
        let missing = PathBuf::from("/tmp/doctor_calgrid/does-not-exist.tsx");
        match read_source(&missing).expect_err("missing file") {
            DoctorError::MissingPath { path } => assert_eq!(path, missing),
            other => panic!("expected MissingPath, got {other}"),
        }
    }

    #[test]
    fn write_then_read_source_round_trips_text_and_digest() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested/WeeklyView.tsx");
        write_string(&path, "const notesHeight = 80;\n").expect("write");

        let snapshot = read_source(&path).expect("read");
        assert_eq!(snapshot.text, "const notesHeight = 80;\n");
        assert_eq!(snapshot.sha256.len(), 64);
    }

    #[test]
    fn plain_integration_never_emits_json() {
        assert!(!OutputIntegration::plain().should_emit_json());
    }
}
