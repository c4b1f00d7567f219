//! CLI module for redis-brain
//!
//! Provides commands:
//! - `run`: keep an in-memory brain persisted to Redis until interrupted
//! - `dump`: print the stored brain
//! - `target`: show which Redis target the environment resolves to

use clap::{Parser, Subcommand};
use redis_brain_core::{format_error_for_cli, Error};

pub mod dump;
pub mod run;
pub mod target;

/// Redis brain CLI
#[derive(Parser, Debug)]
#[command(name = "redis-brain")]
#[command(about = "Persist a chat bot's in-memory brain into Redis")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an in-memory brain persisted to Redis until Ctrl+C
    Run {
        /// Seconds between auto-saves (overrides settings)
        #[arg(long, value_name = "SECS")]
        save_interval: Option<u64>,
    },
    /// Print the stored brain as JSON
    Dump,
    /// Show the resolved Redis target
    Target,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run { save_interval }) => run::run(save_interval).await,
        Some(Commands::Dump) => dump::run().await,
        Some(Commands::Target) => target::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Print a core error for humans and hand it on to `main`
pub(crate) fn report(error: Error) -> anyhow::Error {
    eprintln!("{}", format_error_for_cli(&error));
    anyhow::Error::new(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_interval() {
        let cli = Cli::try_parse_from(["redis-brain", "run", "--save-interval", "30"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run {
                save_interval: Some(30)
            })
        ));
    }

    #[test]
    fn test_parse_without_subcommand() {
        let cli = Cli::try_parse_from(["redis-brain"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["redis-brain", "run", "--save-interval", "soon"]).is_err());
    }
}
