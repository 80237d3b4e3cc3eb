// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use calgrid_layout::{
    AlignmentChecker, AlignmentStatus, AppointmentSpec, ExtractedLayout, ExtractionDefaults,
    Extractor, ParameterSet, Severity, VerificationReport, verify_with,
};
use clap::Args;

use crate::checklist::{ChecklistOutcome, Finding, load_ruleset, run_checklist};
use crate::error::{DoctorError, Result};
use crate::fixtures::{load_builtin_fixtures, load_fixtures_file};
use crate::profile::{DEFAULT_PROFILE, Profile, load_profile};
use crate::render::{PersistedReport, print_findings, print_verification};
use crate::util::{OutputIntegration, SourceSnapshot, output_for, read_source};

/// Profile selection and the layout values a caller may force.
#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
    #[arg(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    #[arg(long = "grid-start-hour")]
    pub grid_start_hour: Option<u8>,

    #[arg(long = "grid-end-hour")]
    pub grid_end_hour: Option<u8>,

    #[arg(long = "hour-row-height")]
    pub hour_row_height: Option<f64>,
}

impl LayoutArgs {
    #[must_use]
    pub fn for_profile(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            grid_start_hour: None,
            grid_end_hour: None,
            hour_row_height: None,
        }
    }

    #[must_use]
    pub fn defaults(&self, profile: &Profile) -> ExtractionDefaults {
        let mut defaults = profile.extraction_defaults();
        if let Some(hour) = self.grid_start_hour {
            defaults.grid_start_hour = hour;
        }
        if let Some(hour) = self.grid_end_hour {
            defaults.grid_end_hour = hour;
        }
        if let Some(height) = self.hour_row_height {
            defaults.hour_row_height_px = height;
        }
        defaults
    }

    /// Flags win over values found in the source as well as over the profile.
    pub fn apply(&self, params: &mut ParameterSet) {
        if let Some(hour) = self.grid_start_hour {
            params.grid_start_hour = hour;
        }
        if let Some(hour) = self.grid_end_hour {
            params.grid_end_hour = hour;
        }
        if let Some(height) = self.hour_row_height {
            params.hour_row_height_px = height;
        }
    }

    pub fn extract(&self, profile: &Profile, text: &str) -> Result<ExtractedLayout> {
        let mut layout = Extractor::new(self.defaults(profile)).extract(text)?;
        self.apply(&mut layout.params);
        layout.params.validate()?;
        Ok(layout)
    }
}

#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// JSON array of `{label, start, end}`; defaults to the profile's set.
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    #[arg(long = "output-json")]
    pub output_json: Option<PathBuf>,

    #[arg(long = "output-html")]
    pub output_html: Option<PathBuf>,

    /// Also run the profile's pattern checklist.
    #[arg(long)]
    pub checklist: bool,

    /// Exit with code 2 when any appointment is misaligned or unevaluated.
    #[arg(long = "fail-on-misaligned")]
    pub fail_on_misaligned: bool,

    #[arg(long)]
    pub epsilon: Option<f64>,
}

impl VerifyArgs {
    #[must_use]
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            layout: LayoutArgs::for_profile(DEFAULT_PROFILE),
            fixtures: None,
            output_json: None,
            output_html: None,
            checklist: false,
            fail_on_misaligned: false,
            epsilon: None,
        }
    }
}

fn load_appointments(args: &VerifyArgs, profile: &Profile) -> Result<Vec<AppointmentSpec>> {
    match &args.fixtures {
        Some(path) => load_fixtures_file(path),
        None => load_builtin_fixtures(profile.fixtures_name()),
    }
}

fn checker_for(args: &VerifyArgs, profile: &Profile) -> Result<AlignmentChecker> {
    let epsilon = args.epsilon.unwrap_or_else(|| profile.epsilon_px());
    Ok(AlignmentChecker::with_epsilon(epsilon)?)
}

/// The `--fail-on-misaligned` verdict: exit 2 when any appointment is off its
/// gridline or could not be placed.
#[must_use]
pub fn misalignment_failure(report: &VerificationReport) -> Option<DoctorError> {
    let failing = report.misaligned_count + report.unevaluated_count;
    (failing > 0).then(|| {
        DoctorError::exit(
            2,
            format!(
                "{failing} appointment(s) misaligned or unevaluated ({} misaligned, {} unevaluated)",
                report.misaligned_count, report.unevaluated_count
            ),
        )
    })
}

/// Alignment problems expressed as findings so they share the persisted
/// `issues` list with the checklist.
#[must_use]
pub fn alignment_findings(report: &VerificationReport, file: &str) -> ChecklistOutcome {
    let mut outcome = ChecklistOutcome::default();
    for result in &report.results {
        let (severity, description) = match result.status {
            AlignmentStatus::Aligned => continue,
            AlignmentStatus::Misaligned => (
                Severity::Critical,
                format!(
                    "{} ({}-{}) is {:.2}px off its gridline",
                    result.label,
                    result.start,
                    result.end,
                    result.diff_px.unwrap_or_default()
                ),
            ),
            AlignmentStatus::Unevaluated => (
                Severity::High,
                format!(
                    "{} ({}-{}) could not be evaluated: {}",
                    result.label,
                    result.start,
                    result.end,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            ),
        };
        outcome.push(Finding {
            category: "ALIGNMENT".to_string(),
            severity,
            description,
            file: file.to_string(),
        });
    }

    if !report.header.aligned {
        let mut description = format!(
            "headerOffset is {:.2}px but the rendered header is {:.2}px",
            report.header.computed_offset, report.header.rendered_height
        );
        if let Some(expression) = report.recommended_expression() {
            description.push_str(&format!("; use headerOffset = {expression}"));
        }
        outcome.push(Finding {
            category: "HEADER".to_string(),
            severity: Severity::High,
            description,
            file: file.to_string(),
        });
    }
    outcome
}

/// Everything `verify` computes, before presentation.
#[derive(Debug, Clone)]
pub struct VerifyRun {
    pub snapshot: SourceSnapshot,
    pub layout: ExtractedLayout,
    pub report: VerificationReport,
    pub findings: ChecklistOutcome,
}

pub fn evaluate(args: &VerifyArgs, profile: &Profile) -> Result<VerifyRun> {
    let snapshot = read_source(&args.source)?;
    let checker = checker_for(args, profile)?;
    let appointments = load_appointments(args, profile)?;

    let layout = args.layout.extract(profile, &snapshot.text)?;
    let mut report = verify_with(&checker, &layout.params, &appointments)
        .with_header_sections(&layout.header_sections)
        .with_dynamic_sections(&layout.dynamic_sections);

    let mut findings = alignment_findings(&report, &snapshot.path);
    if args.checklist {
        let rules = load_ruleset(profile.checklist_name())?;
        let checklist = run_checklist(rules, &snapshot.text, &snapshot.path);
        report = report.with_annotations(checklist.annotations());
        for finding in checklist.issues.into_iter().chain(checklist.warnings) {
            findings.push(finding);
        }
    }

    Ok(VerifyRun {
        snapshot,
        layout,
        report,
        findings,
    })
}

pub fn run_verify(args: VerifyArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    run_verify_with_integration(args, &integration)
}

pub fn run_verify_with_integration(args: VerifyArgs, integration: &OutputIntegration) -> Result<()> {
    let ui = output_for(integration);
    let profile = load_profile(&args.layout.profile)?;

    let run = evaluate(&args, &profile)?;
    let VerifyRun {
        snapshot,
        layout,
        report,
        findings,
    } = run;

    for (field, source) in &layout.sources {
        tracing::debug!(field = field.name(), ?source, "parameter provenance");
    }

    ui.rule(Some(&format!("verify {}", snapshot.path)));
    print_verification(&ui, &report);
    if args.checklist {
        print_findings(&ui, &findings);
    }

    let failure = args
        .fail_on_misaligned
        .then(|| misalignment_failure(&report))
        .flatten();
    let passed = report.passed();
    let recommended_adjustment_px = report.recommended_adjustment_px;
    let header_diff_px = report.header.diff_px;
    let counts = (
        report.total_appointments,
        report.aligned_count,
        report.misaligned_count,
        report.unevaluated_count,
    );

    let persisted = PersistedReport::new(&profile.name, &snapshot, findings, Some(report));
    if let Some(path) = &args.output_json {
        persisted.write_json(path)?;
        ui.success(&format!("report JSON: {}", path.display()));
    }
    if let Some(path) = &args.output_html {
        persisted.write_html(path)?;
        ui.success(&format!("report HTML: {}", path.display()));
    }

    if integration.should_emit_json() {
        println!(
            "{}",
            serde_json::json!({
                "command": "verify",
                "status": if passed { "ok" } else { "drift" },
                "profile": profile.name,
                "source": snapshot.path,
                "sha256": snapshot.sha256,
                "total_appointments": counts.0,
                "aligned_count": counts.1,
                "misaligned_count": counts.2,
                "unevaluated_count": counts.3,
                "header_diff_px": header_diff_px,
                "recommended_adjustment_px": recommended_adjustment_px,
                "report_json": args.output_json.as_ref().map(|path| path.display().to_string()),
                "report_html": args.output_html.as_ref().map(|path| path.display().to_string()),
                "integration": integration,
            })
        );
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
