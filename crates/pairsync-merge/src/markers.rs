//! Conflict marker blocks
//!
//! A block always has the shape
//!
//! ```text
//! <<<<<<< SOURCE
//! ...
//! =======
//! ...
//! >>>>>>> TARGET
//! ```
//!
//! with every marker on its own line.

use crate::types::Side;

pub const SOURCE_MARKER: &str = "<<<<<<< SOURCE";
pub const SEPARATOR: &str = "=======";
pub const TARGET_MARKER: &str = ">>>>>>> TARGET";

/// Append one conflict block. `source` and `target` lines keep their
/// terminators.
pub(crate) fn push_conflict_block(out: &mut String, source: &[&str], target: &[&str]) {
    out.push_str(SOURCE_MARKER);
    out.push('\n');
    out.extend(source.iter().copied());
    out.push_str(SEPARATOR);
    out.push('\n');
    out.extend(target.iter().copied());
    out.push_str(TARGET_MARKER);
    out.push('\n');
}

/// Whether `content` still contains an opening or closing marker anywhere.
pub fn has_conflict_markers(content: &str) -> bool {
    content.contains(SOURCE_MARKER) || content.contains(TARGET_MARKER)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InSource,
    InTarget,
}

/// Resolve every block in `content` by keeping one side's half.
///
/// Marker lines are recognized by prefix. Text outside blocks is kept as is.
/// A separator line outside a block is ordinary text.
pub fn resolve_with(content: &str, side: Side) -> String {
    let mut out = String::with_capacity(content.len());
    let mut state = State::Outside;

    for line in content.split_inclusive('\n') {
        if line.starts_with(SOURCE_MARKER) {
            state = State::InSource;
        } else if line.starts_with(SEPARATOR) && state != State::Outside {
            state = State::InTarget;
        } else if line.starts_with(TARGET_MARKER) {
            state = State::Outside;
        } else {
            let keep = match state {
                State::Outside => true,
                State::InSource => side == Side::Source,
                State::InTarget => side == Side::Target,
            };
            if keep {
                out.push_str(line);
            }
        }
    }
    out
}

/// Count the complete blocks in `content`, or `None` when the markers are
/// unbalanced or out of order.
pub fn count_conflict_blocks(content: &str) -> Option<usize> {
    let mut state = State::Outside;
    let mut count = 0;

    for line in content.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match (state, line) {
            (State::Outside, SOURCE_MARKER) => state = State::InSource,
            (State::InSource, SEPARATOR) => state = State::InTarget,
            (State::InTarget, TARGET_MARKER) => {
                state = State::Outside;
                count += 1;
            }
            (_, SOURCE_MARKER | TARGET_MARKER) => return None,
            _ => {}
        }
    }

    (state == State::Outside).then_some(count)
}

/// Whether every marker in `content` belongs to a complete, ordered block.
pub fn conflict_blocks_well_formed(content: &str) -> bool {
    count_conflict_blocks(content).is_some()
}
