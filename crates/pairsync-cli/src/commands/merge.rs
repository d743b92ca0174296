//! The `merge` command: run the merge engine on three files

use std::fs;
use std::path::Path;

use colored::Colorize;
use pairsync_merge::three_way_merge;

use crate::error::{CliError, Result};

/// Merge `source` and `target` against `base`.
///
/// Returns whether the merge was clean.
pub fn run_merge(base: &Path, source: &Path, target: &Path, output: Option<&Path>) -> Result<bool> {
    let base = read(base)?;
    let source = read(source)?;
    let target = read(target)?;

    let result = three_way_merge(&base, &source, &target);

    match output {
        Some(path) => fs::write(path, result.content.as_bytes())?,
        None => print!("{}", result.content),
    }

    if !result.success {
        let lines: Vec<String> = result
            .conflicts
            .iter()
            .map(|c| c.line_number.to_string())
            .collect();
        eprintln!(
            "{} {} conflict(s) at line(s) {}",
            "CONFLICT".red().bold(),
            result.conflicts.len(),
            lines.join(", ")
        );
    }
    Ok(result.success)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Cannot read {}: {e}", path.display())))
}
