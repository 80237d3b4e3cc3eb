// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::Args;

use crate::checklist::{load_ruleset, run_checklist};
use crate::error::Result;
use crate::profile::{DEFAULT_PROFILE, load_profile};
use crate::render::{PersistedReport, print_findings};
use crate::util::{OutputIntegration, output_for, read_source};

#[derive(Debug, Clone, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[arg(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    #[arg(long = "output-json")]
    pub output_json: Option<PathBuf>,
}

pub fn run_audit(args: AuditArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    run_audit_with_integration(args, &integration)
}

pub fn run_audit_with_integration(args: AuditArgs, integration: &OutputIntegration) -> Result<()> {
    let ui = output_for(integration);
    let profile = load_profile(&args.profile)?;
    let rules = load_ruleset(profile.checklist_name())?;
    let snapshot = read_source(&args.source)?;

    let findings = run_checklist(rules, &snapshot.text, &snapshot.path);
    ui.rule(Some(&format!("audit {}", snapshot.path)));
    print_findings(&ui, &findings);

    let report = PersistedReport::new(&profile.name, &snapshot, findings, None);
    if let Some(path) = &args.output_json {
        report.write_json(path)?;
        ui.success(&format!("audit JSON: {}", path.display()));
    }

    if integration.should_emit_json() {
        println!(
            "{}",
            serde_json::json!({
                "command": "audit",
                "status": if report.issues.is_empty() { "ok" } else { "issues" },
                "profile": profile.name,
                "source": snapshot.path,
                "summary": report.summary,
                "report_json": args.output_json.as_ref().map(|path| path.display().to_string()),
                "integration": integration,
            })
        );
    }

    Ok(())
}
