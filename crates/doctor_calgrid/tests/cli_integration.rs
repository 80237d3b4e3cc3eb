// SPDX-License-Identifier: Apache-2.0
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn doctor_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_doctor_calgrid"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_doctor_command(args: &[&str], extra_env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(doctor_bin());
    command.args(args);
    command.env("RUST_LOG", "off");
    for (key, value) in extra_env {
        command.env(key, value);
    }

    command.output().expect("run doctor_calgrid binary")
}

fn run_json(args: &[&str]) -> Output {
    run_doctor_command(args, &[("SQLMODEL_JSON", "1")])
}

fn parse_last_line(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let line = text.lines().rev().find(|line| !line.trim().is_empty()).unwrap_or("");
    let parsed = serde_json::from_str::<Value>(line.trim());
    assert!(parsed.is_ok(), "failed parsing JSON line ({line})");
    parsed.expect("parse json line")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read json file")).expect("parse json file")
}

// ═══════════════════════════════════════════════════════════════════════
// verify
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn verify_weekly_view_reports_header_drift() {
    let temp = tempdir().expect("tempdir");
    let report_json = temp.path().join("report.json");
    let report_html = temp.path().join("report.html");
    let source = fixture("WeeklyView.tsx");

    let output = run_json(&[
        "verify",
        "--source",
        source.to_str().expect("utf8 path"),
        "--checklist",
        "--output-json",
        report_json.to_str().expect("utf8 path"),
        "--output-html",
        report_html.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let payload = parse_last_line(&output.stdout);
    assert_eq!(payload["command"], "verify");
    assert_eq!(payload["status"], "drift");
    assert_eq!(payload["aligned_count"], 5);
    assert_eq!(payload["misaligned_count"], 0);
    assert_eq!(payload["recommended_adjustment_px"], -4.0);
    assert_eq!(payload["integration"]["sqlmodel_mode"], "json");

    let persisted = read_json(&report_json);
    assert_eq!(persisted["profile"], "weekly-view");
    assert_eq!(persisted["summary"]["total_issues"], 1);
    assert_eq!(persisted["issues"][0]["category"], "HEADER");
    assert_eq!(persisted["warnings"].as_array().map(Vec::len), Some(0));
    assert_eq!(persisted["verification"]["header"]["diff_px"], -71.0);
    assert_eq!(persisted["verification"]["params"]["adjustment"]["sign"], "MINUS");
    assert_eq!(persisted["verification"]["results"][1]["start"], "07:30");
    assert_eq!(persisted["source"]["sha256"].as_str().map(str::len), Some(64));

    let html = fs::read_to_string(&report_html).expect("read html");
    assert!(html.contains("Ruben Spilberg"));
    assert!(html.contains("notesHeight + 4"));
}

#[test]
fn verify_passes_after_applying_the_recommendation() {
    let temp = tempdir().expect("tempdir");
    let fixed = temp.path().join("WeeklyView.tsx");
    let text = fs::read_to_string(fixture("WeeklyView.tsx")).expect("read fixture");
    fs::write(&fixed, text.replace("notesHeight - 67", "notesHeight + 4")).expect("write fixed");

    let output = run_json(&[
        "verify",
        "--source",
        fixed.to_str().expect("utf8 path"),
        "--fail-on-misaligned",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let payload = parse_last_line(&output.stdout);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["header_diff_px"], 0.0);
    assert!(payload["recommended_adjustment_px"].is_null());
}

#[test]
fn verify_exits_two_when_an_appointment_cannot_be_placed() {
    let temp = tempdir().expect("tempdir");
    let fixtures = temp.path().join("fixtures.json");
    fs::write(
        &fixtures,
        r#"[
            {"label": "Standup", "start": "09:00", "end": "09:30"},
            {"label": "Night shift", "start": "23:00", "end": "23:30"}
        ]"#,
    )
    .expect("write fixtures");
    let report_json = temp.path().join("report.json");
    let source = fixture("WeeklyView.tsx");

    let output = run_json(&[
        "verify",
        "--source",
        source.to_str().expect("utf8 path"),
        "--fixtures",
        fixtures.to_str().expect("utf8 path"),
        "--output-json",
        report_json.to_str().expect("utf8 path"),
        "--fail-on-misaligned",
    ]);
    assert_eq!(output.status.code(), Some(2));

    let error = parse_last_line(&output.stderr);
    assert_eq!(error["status"], "error");
    assert_eq!(error["exit_code"], 2);

    let persisted = read_json(&report_json);
    assert_eq!(persisted["verification"]["aligned_count"], 1);
    assert_eq!(persisted["verification"]["unevaluated_count"], 1);
    assert_eq!(persisted["verification"]["results"][1]["status"], "unevaluated");
}

#[test]
fn verify_exits_three_when_a_required_field_is_missing() {
    let temp = tempdir().expect("tempdir");
    let broken = temp.path().join("WeeklyView.tsx");
    let text = fs::read_to_string(fixture("WeeklyView.tsx")).expect("read fixture");
    let without_offset = text.replace(
        "const headerOffset = dayNamesHeight + allDayHeight + notesHeight - 67;",
        "",
    );
    fs::write(&broken, without_offset).expect("write broken");

    let output = run_doctor_command(
        &["verify", "--source", broken.to_str().expect("utf8 path")],
        &[],
    );
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("headerOffset"));
}

#[test]
fn verify_reports_missing_source() {
    let temp = tempdir().expect("tempdir");
    let missing = temp.path().join("missing.tsx");
    let output = run_json(&["verify", "--source", missing.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(1));
    let error = parse_last_line(&output.stderr);
    assert!(
        error["error"]
            .as_str()
            .is_some_and(|message| message.contains("missing.tsx"))
    );
}

// ═══════════════════════════════════════════════════════════════════════
// gridlines / audit / list-profiles
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn gridlines_lists_hour_lines() {
    let source = fixture("WeeklyView.tsx");
    let output = run_json(&[
        "gridlines",
        "--source",
        source.to_str().expect("utf8 path"),
        "--hours-only",
    ]);
    assert!(output.status.success());

    let payload = parse_last_line(&output.stdout);
    let lines = payload["lines"].as_array().expect("lines array");
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0]["time"], "06:00");
    assert_eq!(lines[0]["y"], 113.0);
    assert_eq!(lines[1]["y"], 213.0);
}

#[test]
fn audit_daily_view_persists_findings() {
    let temp = tempdir().expect("tempdir");
    let audit_json = temp.path().join("audit.json");
    let source = fixture("DailyView.tsx");

    let output = run_json(&[
        "audit",
        "--source",
        source.to_str().expect("utf8 path"),
        "--profile",
        "daily-view",
        "--output-json",
        audit_json.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let payload = parse_last_line(&output.stdout);
    assert_eq!(payload["command"], "audit");
    assert_eq!(payload["status"], "ok");

    let persisted = read_json(&audit_json);
    assert_eq!(persisted["summary"]["total_issues"], 0);
    assert_eq!(persisted["summary"]["warnings"], 0);
    assert!(persisted.get("verification").is_none());
}

#[test]
fn list_profiles_prints_builtin_names() {
    let output = run_json(&["list-profiles"]);
    assert!(output.status.success());
    let payload = parse_last_line(&output.stdout);
    let profiles = payload["profiles"].as_array().expect("profiles array");
    assert!(profiles.iter().any(|name| name == "weekly-view"));
    assert!(profiles.iter().any(|name| name == "daily-view"));
}
