//! spears - run Gherkin suites with parallel-safe scenarios fanned out
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite under ./features
//! spears
//!
//! # Run selected suites, filtered by tags
//! spears demos/features --tags @fast,@smoke --tags ~@wip
//!
//! # Ignore parallel annotations
//! spears --serial
//!
//! # Run features untouched, like plain cucumber
//! spears --cucumber
//!
//! # Show how scenarios would be routed
//! spears --dry-run
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::info;

use spears::cli::Args;
use spears::config::{EnvConfig, RunConfig};
use spears::output::ReportFormatter;
use spears::utils::init_logger;
use spears::{demo, Orchestrator, StepEngine, TestEngine};

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match RunConfig::resolve(&args, &EnvConfig::load()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    init_logger(config.log_level);

    ExitCode::from(exit_status(run(&args, &config).await))
}

/// Map a run outcome to the process exit status, reporting fatal errors once
fn exit_status(outcome: Result<bool>) -> u8 {
    match outcome {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_FAILED,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_ERROR
        }
    }
}

/// Returns whether the run succeeded
async fn run(args: &Args, config: &RunConfig) -> Result<bool> {
    let library = demo::library().context("Failed to register step definitions")?;
    let engine = StepEngine::new(library);

    let filter = config.tag_filter()?;
    let tree = engine
        .parse(&config.paths)
        .context("Failed to load feature files")?
        .filter(&filter);
    info!(
        "Loaded {} scenario(s) from {} feature(s)",
        tree.scenario_count(),
        tree.groupings.len()
    );

    let mut formatter = ReportFormatter::new(config.format);
    if !config.color || !std::io::stdout().is_terminal() {
        formatter = formatter.no_color();
    }

    let orchestrator = Orchestrator::new(&engine, config.partition_mode());

    if args.dry_run {
        println!("{}", formatter.format_plan(&orchestrator.plan(tree)));
        return Ok(true);
    }

    let report = if args.cucumber {
        orchestrator.run_direct(tree).await?
    } else {
        orchestrator.run(tree).await?
    };

    println!("{}", formatter.format_report(&report));
    Ok(report.success())
}
