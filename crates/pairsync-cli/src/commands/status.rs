//! The `status` command

use colored::Colorize;
use pairsync_core::PairState;
use pairsync_fs::SyncLayout;
use serde::Serialize;

use super::coordinator;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct StatusLine<'a> {
    name: &'a str,
    source: &'a str,
    target: &'a str,
    state: &'static str,
    has_base: bool,
}

/// Show the state of every configured pair without changing anything.
pub fn run_status(layout: &SyncLayout, json: bool) -> Result<()> {
    let coordinator = coordinator(layout);
    let pairs = coordinator.pairs().pairs();

    let mut statuses = Vec::with_capacity(pairs.len());
    for pair in pairs {
        statuses.push((pair, coordinator.status(pair)?));
    }

    if json {
        let lines: Vec<StatusLine<'_>> = statuses
            .iter()
            .map(|(pair, status)| StatusLine {
                name: &pair.name,
                source: pair.source.as_str(),
                target: pair.target.as_str(),
                state: status.state.as_str(),
                has_base: status.has_base,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    println!("{}", "Pair Status".bold());
    println!();
    println!("{}:   {}", "Config".dimmed(), layout.config_file());
    println!("{}:     {}", "Home".dimmed(), layout.home());
    println!();

    if statuses.is_empty() {
        println!("  {}", "No pairs configured".dimmed());
        return Ok(());
    }

    for (pair, status) in &statuses {
        let state = match status.state {
            PairState::InSync => status.state.to_string().green(),
            PairState::Conflicted => status.state.to_string().red().bold(),
            _ => status.state.to_string().yellow(),
        };
        let base = if status.has_base { "" } else { " (no base)" };
        println!("  {} {}{}", pair.name.cyan(), state, base.dimmed());
        println!("      {} {}", "source".dimmed(), pair.source);
        println!("      {} {}", "target".dimmed(), pair.target);
    }

    Ok(())
}
