//! The `sync` command: one-shot reconciliation of every pair

use colored::Colorize;
use pairsync_core::{PairReport, SyncOutcome};
use pairsync_fs::SyncLayout;
use serde::Serialize;

use super::coordinator;
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
struct SyncLine<'a> {
    pair: &'a str,
    outcome: Option<&'static str>,
    detail: String,
}

impl<'a> From<&'a PairReport> for SyncLine<'a> {
    fn from(report: &'a PairReport) -> Self {
        match &report.result {
            Ok(outcome) => Self {
                pair: &report.pair.name,
                outcome: Some(outcome.kind()),
                detail: outcome.to_string(),
            },
            Err(e) => Self {
                pair: &report.pair.name,
                outcome: None,
                detail: e.to_string(),
            },
        }
    }
}

/// Reconcile every configured pair once. Fails when any pair failed.
pub fn run_sync(layout: &SyncLayout, json: bool) -> Result<()> {
    let coordinator = coordinator(layout);
    let reports = coordinator.initial_sync();

    if json {
        let lines: Vec<SyncLine<'_>> = reports.iter().map(SyncLine::from).collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else if reports.is_empty() {
        println!(
            "{} No pairs configured in {}",
            "=>".blue().bold(),
            layout.config_file().as_str().cyan()
        );
    } else {
        println!("{} Syncing {} pair(s)", "=>".blue().bold(), reports.len());
        for report in &reports {
            print_report(report);
        }
    }

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        return Err(CliError::user(format!("{failed} pair(s) failed to sync")));
    }
    Ok(())
}

fn print_report(report: &PairReport) {
    let name = report.pair.name.cyan();
    match &report.result {
        Ok(outcome @ SyncOutcome::Conflicted { .. }) => {
            println!("   {} {}: {}", "!".red(), name, outcome.to_string().red());
        }
        Ok(outcome) if outcome.wrote_files() => {
            println!("   {} {}: {}", "+".green(), name, outcome);
        }
        Ok(outcome) => println!("   {} {}: {}", "=".dimmed(), name, outcome.to_string().dimmed()),
        Err(e) => println!("   {} {}: {}", "x".red().bold(), name, e),
    }
}
