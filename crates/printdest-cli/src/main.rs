//! CLI entry point - the composition root.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use printdest_cli::{Cli, Commands, Scenario, simulate};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Simulate {
            scenario,
            policy,
            json,
        } => {
            let loaded = Scenario::load(&scenario)?;
            let report = simulate::run(loaded, policy)
                .await
                .with_context(|| format!("Simulation of '{}' failed", scenario.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }
    }

    Ok(())
}
