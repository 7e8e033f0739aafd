//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

/// Run Gherkin suites with parallel-safe scenarios fanned out concurrently
#[derive(Parser, Debug, Default)]
#[command(name = "spears")]
#[command(version)]
#[command(about = "Split Gherkin suites into parallel and serial phases and run them")]
#[command(long_about = None)]
#[command(after_long_help = crate::config::env::env_help())]
pub struct Args {
    /// Feature files or directories (default: features)
    pub paths: Vec<PathBuf>,

    /// Only run scenarios matching the expression; repeat to AND expressions
    #[arg(short, long = "tags", value_name = "EXPR")]
    pub tags: Vec<String>,

    /// Run every scenario serially, ignoring parallel annotations
    #[arg(long)]
    pub serial: bool,

    /// Run features as-is without partitioning
    #[arg(long, conflicts_with = "serial")]
    pub cucumber: bool,

    /// Output format (pretty, summary, json, json-pretty, csv)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Print the partition plan and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let args = Args::try_parse_from([
            "spears",
            "features/cart",
            "features/search.feature",
            "--tags",
            "@fast,@smoke",
            "-t",
            "~@wip",
            "--format",
            "json",
            "--no-color",
            "-vv",
        ])
        .unwrap();

        assert_eq!(
            args.paths,
            vec![
                PathBuf::from("features/cart"),
                PathBuf::from("features/search.feature")
            ]
        );
        assert_eq!(args.tags, vec!["@fast,@smoke", "~@wip"]);
        assert_eq!(args.format.as_deref(), Some("json"));
        assert!(args.no_color);
        assert_eq!(args.verbose, 2);
        assert!(!args.serial);
    }

    #[test]
    fn test_cucumber_conflicts_with_serial() {
        assert!(Args::try_parse_from(["spears", "--serial", "--cucumber"]).is_err());
        assert!(Args::try_parse_from(["spears", "--cucumber"]).unwrap().cucumber);
    }
}
