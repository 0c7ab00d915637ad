//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use printdest_core::SelectionPolicy;

/// Command-line interface for the print destination engine.
#[derive(Parser)]
#[command(name = "printdest")]
#[command(about = "Simulate print destination resolution and selection")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted selection scenario against a simulated transport
    Simulate {
        /// Path to the scenario JSON file
        scenario: PathBuf,

        /// Selection policy, overriding the scenario settings (direct, gated)
        #[arg(long, env = "PRINTDEST_POLICY")]
        policy: Option<SelectionPolicy>,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_simulate_args() {
        let cli = Cli::parse_from([
            "printdest",
            "--verbose",
            "simulate",
            "scenario.json",
            "--policy",
            "gated",
        ]);
        assert!(cli.verbose);
        let Commands::Simulate {
            scenario,
            policy,
            json,
        } = cli.command;
        assert_eq!(scenario, PathBuf::from("scenario.json"));
        assert_eq!(policy, Some(SelectionPolicy::Gated));
        assert!(!json);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = Cli::try_parse_from(["printdest", "simulate", "s.json", "--policy", "kiosk"]);
        assert!(result.is_err());
    }
}
