//! pairsync CLI
//!
//! Runs the sync daemon and offers one-shot commands around it.

mod cli;
mod commands;
mod error;
mod logging;
mod watch;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {e}", "warning".yellow());
    }

    let Some(command) = cli.command else {
        println!("{} keeps pairs of files in sync", "pairsync".green().bold());
        println!();
        println!("Run {} for available commands.", "pairsync --help".cyan());
        return Ok(ExitCode::SUCCESS);
    };

    execute_command(command, cli.home, cli.config)
}

fn execute_command(
    command: Commands,
    home: Option<std::path::PathBuf>,
    config: Option<std::path::PathBuf>,
) -> Result<ExitCode> {
    match command {
        Commands::Merge {
            base,
            source,
            target,
            output,
        } => {
            let clean = commands::run_merge(&base, &source, &target, output.as_deref())?;
            return Ok(if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Commands::Run => commands::run_daemon(commands::layout(home, config)?)?,
        Commands::Sync { json } => commands::run_sync(&commands::layout(home, config)?, json)?,
        Commands::Status { json } => {
            commands::run_status(&commands::layout(home, config)?, json)?
        }
        Commands::Conflicts { json, details } => {
            commands::run_conflicts(&commands::layout(home, config)?, json, details)?
        }
        Commands::Resolve { pair, take } => {
            commands::run_resolve(&commands::layout(home, config)?, &pair, take.into())?
        }
    }
    Ok(ExitCode::SUCCESS)
}
