// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use calgrid_layout::{GridLine, grid_lines};
use clap::Args;

use crate::error::Result;
use crate::profile::{DEFAULT_PROFILE, load_profile};
use crate::util::{OutputIntegration, output_for, read_source};
use crate::verify::LayoutArgs;

#[derive(Debug, Clone, Args)]
pub struct GridlinesArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Skip the half-hour lines.
    #[arg(long = "hours-only")]
    pub hours_only: bool,
}

impl GridlinesArgs {
    #[must_use]
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            layout: LayoutArgs::for_profile(DEFAULT_PROFILE),
            hours_only: false,
        }
    }
}

pub fn collect_gridlines(args: &GridlinesArgs) -> Result<Vec<GridLine>> {
    let profile = load_profile(&args.layout.profile)?;
    let snapshot = read_source(&args.source)?;
    let layout = args.layout.extract(&profile, &snapshot.text)?;

    Ok(grid_lines(&layout.params)
        .filter(|line| !args.hours_only || line.time.minute() == 0)
        .collect())
}

pub fn run_gridlines(args: GridlinesArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    run_gridlines_with_integration(args, &integration)
}

pub fn run_gridlines_with_integration(
    args: GridlinesArgs,
    integration: &OutputIntegration,
) -> Result<()> {
    let ui = output_for(integration);
    let lines = collect_gridlines(&args)?;

    if integration.should_emit_json() {
        println!(
            "{}",
            serde_json::json!({
                "command": "gridlines",
                "status": "ok",
                "source": args.source.display().to_string(),
                "profile": args.layout.profile,
                "lines": lines,
                "integration": integration,
            })
        );
        return Ok(());
    }

    ui.rule(Some(&format!("gridlines {}", args.source.display())));
    for line in &lines {
        println!("{}\t{:.2}", line.time, line.y);
    }
    ui.info(&format!("{} line(s)", lines.len()));
    Ok(())
}
