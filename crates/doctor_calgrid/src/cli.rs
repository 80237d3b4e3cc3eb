// SPDX-License-Identifier: Apache-2.0
use clap::{Parser, Subcommand};

use crate::audit::{AuditArgs, run_audit};
use crate::error::Result;
use crate::gridlines::{GridlinesArgs, run_gridlines};
use crate::profile::{list_profile_names, load_profile};
use crate::util::{OutputIntegration, output_for};
use crate::verify::{VerifyArgs, run_verify};

#[derive(Debug, Parser)]
#[command(
    name = "doctor_calgrid",
    about = "Layout geometry and alignment checks for calendar grid components",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract layout parameters and check appointment alignment.
    Verify(VerifyArgs),

    /// Print gridline Y positions for a component.
    Gridlines(GridlinesArgs),

    /// Run the pattern checklist only.
    Audit(AuditArgs),

    /// Print built-in profile names.
    #[command(name = "list-profiles")]
    ListProfiles,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Verify(args) => run_verify(args),
        Commands::Gridlines(args) => run_gridlines(args),
        Commands::Audit(args) => run_audit(args),
        Commands::ListProfiles => print_profiles(&OutputIntegration::detect()),
    }
}

fn print_profiles(integration: &OutputIntegration) -> Result<()> {
    let names = list_profile_names();
    if integration.should_emit_json() {
        println!(
            "{}",
            serde_json::json!({
                "command": "list-profiles",
                "status": "ok",
                "profiles": names,
                "integration": integration,
            })
        );
        return Ok(());
    }

    let ui = output_for(integration);
    ui.rule(Some("profiles"));
    for name in names {
        let profile = load_profile(&name)?;
        println!("{name}\t{}", profile.description());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::audit::AuditArgs;
    use crate::error::DoctorError;
    use crate::verify::VerifyArgs;

    use super::{Cli, Commands, run};

    #[test]
    fn list_profiles_command_dispatches_successfully() {
        let result = run(Cli {
            command: Commands::ListProfiles,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn verify_command_dispatches_missing_path_error() {
        let missing = PathBuf::from("/tmp/doctor_calgrid/does-not-exist.tsx");
        match run(Cli {
            command: Commands::Verify(VerifyArgs::new(missing.clone())),
        })
        .expect_err("missing source should fail")
        {
            DoctorError::MissingPath { path } => assert_eq!(path, missing),
            other => panic!("expected MissingPath, got {other}"),
        }
    }

    #[test]
    fn audit_command_dispatches_profile_not_found_error() {
        let result = run(Cli {
            command: Commands::Audit(AuditArgs {
                source: PathBuf::from("/tmp/doctor_calgrid/does-not-exist.tsx"),
                profile: "not-a-real-profile".to_string(),
                output_json: None,
            }),
        });
        match result.expect_err("missing profile should fail") {
            DoctorError::ProfileNotFound { name } => assert_eq!(name, "not-a-real-profile"),
            other => panic!("expected ProfileNotFound, got {other}"),
        }
    }

    #[test]
    fn verify_flags_parse_into_args() {
        let cli = Cli::try_parse_from([
            "doctor_calgrid",
            "verify",
            "--source",
            "WeeklyView.tsx",
            "--profile",
            "daily-view",
            "--grid-start-hour",
            "7",
            "--epsilon",
            "0.5",
            "--checklist",
            "--fail-on-misaligned",
        ])
        .expect("parse");
        let Commands::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.source, PathBuf::from("WeeklyView.tsx"));
        assert_eq!(args.layout.profile, "daily-view");
        assert_eq!(args.layout.grid_start_hour, Some(7));
        assert_eq!(args.layout.grid_end_hour, None);
        assert_eq!(args.epsilon, Some(0.5));
        assert!(args.checklist);
        assert!(args.fail_on_misaligned);
    }

    #[test]
    fn gridlines_defaults_to_weekly_profile() {
        let cli = Cli::try_parse_from([
            "doctor_calgrid",
            "gridlines",
            "--source",
            "WeeklyView.tsx",
            "--hours-only",
        ])
        .expect("parse");
        let Commands::Gridlines(args) = cli.command else {
            panic!("expected gridlines");
        };
        assert_eq!(args.layout.profile, "weekly-view");
        assert!(args.hours_only);
    }
}
