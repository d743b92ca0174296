//! Line splitting and per-side edit scripts

use std::borrow::Cow;
use std::ops::Range;

use similar::{Algorithm, DiffTag, capture_diff_slices};

/// Split `text` into lines that keep their `\n` terminator.
///
/// A final line without terminator gets one synthesized so that the last
/// lines of the three inputs compare equal when only the newline differs.
pub(crate) fn split_lines(text: &str) -> Vec<Cow<'_, str>> {
    let mut lines: Vec<Cow<'_, str>> = text.split_inclusive('\n').map(Cow::Borrowed).collect();
    if let Some(last) = lines.last_mut()
        && !last.ends_with('\n')
    {
        let mut owned = last.to_string();
        owned.push('\n');
        *last = Cow::Owned(owned);
    }
    lines
}

/// A maximal run of non-equal operations between the base and one side.
///
/// `base` is the replaced base range (empty for a pure insertion), `new` the
/// range of replacement lines in the side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hunk {
    pub base: Range<usize>,
    pub new: Range<usize>,
}

/// Edit script from `base` to `side`, as sorted, disjoint hunks.
///
/// Adjacent insert/delete operations are coalesced so that a side's change
/// is always handled as one unit.
pub(crate) fn edit_script<T>(base: &[T], side: &[T]) -> Vec<Hunk>
where
    T: std::hash::Hash + Eq + Ord,
{
    let mut hunks = Vec::new();
    let mut pending: Option<Hunk> = None;

    for op in capture_diff_slices(Algorithm::Myers, base, side) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal && !old.is_empty() {
            if let Some(hunk) = pending.take() {
                hunks.push(hunk);
            }
            continue;
        }
        match pending.as_mut() {
            Some(hunk) => {
                hunk.base.end = old.end;
                hunk.new.end = new.end;
            }
            None => pending = Some(Hunk { base: old, new }),
        }
    }

    if let Some(hunk) = pending {
        hunks.push(hunk);
    }
    hunks
}
