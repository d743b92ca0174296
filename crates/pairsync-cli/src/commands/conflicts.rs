//! The `conflicts` and `resolve` commands

use colored::Colorize;
use pairsync_core::{ConflictRecord, Coordinator, Error, PairKey};
use pairsync_fs::SyncLayout;
use pairsync_merge::{Conflict, Side, format_conflict};
use serde::Serialize;

use super::coordinator;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ConflictLine<'a> {
    pair: &'a str,
    key: &'a str,
    #[serde(flatten)]
    record: &'a ConflictRecord,
}

/// List every unresolved conflict in the ledger.
pub fn run_conflicts(layout: &SyncLayout, json: bool, details: bool) -> Result<()> {
    let coordinator = coordinator(layout);
    let records = coordinator.ledger().get_all()?;

    if json {
        let lines: Vec<ConflictLine<'_>> = records
            .iter()
            .map(|(key, record)| ConflictLine {
                pair: pair_name(&coordinator, key),
                key: key.as_str(),
                record,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{} No unresolved conflicts.", "OK".green().bold());
        return Ok(());
    }

    println!(
        "{} {} pair(s) in conflict:",
        "CONFLICT".red().bold(),
        records.len()
    );
    for (key, record) in &records {
        println!();
        println!(
            "   {} {}: {} conflict(s) since {}",
            "!".red(),
            pair_name(&coordinator, key).cyan(),
            record.conflict_count,
            record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("      {} {}", "changed".dimmed(), record.source);
        println!("      {} {}", "partner".dimmed(), record.target);

        if details {
            for entry in &record.conflicts {
                println!();
                for line in format_conflict(&Conflict::from(entry)).lines() {
                    println!("      {line}");
                }
            }
        }
    }
    println!();
    println!(
        "Edit the markers away in either file, or run {}.",
        "pairsync resolve <pair> --take source|target".cyan()
    );

    Ok(())
}

/// Resolve the conflict of the pair named or pathed by `query`.
pub fn run_resolve(layout: &SyncLayout, query: &str, side: Side) -> Result<()> {
    let coordinator = coordinator(layout);
    let pair = coordinator
        .pairs()
        .find(query)
        .ok_or_else(|| Error::PairNotFound(query.to_string()))?;

    let outcome = coordinator.resolve_with(pair, side)?;
    println!(
        "{} {}: {}",
        "OK".green().bold(),
        pair.name.cyan(),
        outcome
    );
    Ok(())
}

/// Configured name of the pair behind `key`, or the key itself.
fn pair_name<'a>(coordinator: &'a Coordinator, key: &'a PairKey) -> &'a str {
    coordinator
        .pairs()
        .pairs()
        .iter()
        .find(|pair| pair.key() == *key)
        .map_or(key.as_str(), |pair| pair.name.as_str())
}
