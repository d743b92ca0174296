//! Human-readable rendering of conflicts

use std::fmt::Write;

use crate::types::Conflict;

/// Render a conflict for terminal output.
///
/// ```text
/// Line 3:
///   Base:
///     old
///   Source:
///     mine
///   Target:
///     theirs
/// ```
pub fn format_conflict(conflict: &Conflict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Line {}:", conflict.line_number);
    push_section(&mut out, "Base", &conflict.base_lines);
    push_section(&mut out, "Source", &conflict.source_lines);
    push_section(&mut out, "Target", &conflict.target_lines);
    out.truncate(out.trim_end_matches('\n').len());
    out
}

fn push_section(out: &mut String, label: &str, lines: &[String]) {
    let _ = writeln!(out, "  {label}:");
    for line in lines {
        let _ = writeln!(out, "    {}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_keep_their_labels() {
        let conflict = Conflict {
            line_number: 1,
            base_lines: vec![],
            source_lines: vec!["x\n".into()],
            target_lines: vec![],
        };
        assert_eq!(
            format_conflict(&conflict),
            "Line 1:\n  Base:\n  Source:\n    x\n  Target:"
        );
    }
}
