//! diff3-style merge walk
//!
//! Both sides are diffed against the base independently. The base is then
//! walked left to right: untouched base lines are copied through, a change
//! made by only one side is applied, and changes of both sides that overlap
//! form a region. A region whose two renderings agree is emitted once;
//! otherwise it becomes a conflict block.

use std::borrow::Cow;
use std::ops::Range;

use crate::hunks::{Hunk, edit_script, split_lines};
use crate::markers::push_conflict_block;
use crate::types::{Conflict, MergeResult};

/// Merge `source` and `target` against their common ancestor `base`.
///
/// The fast paths compare whole contents and borrow the winning input
/// without allocating:
///
/// 1. `source == target`: content is `source`
/// 2. `source == base`: content is `target`
/// 3. `target == base`: content is `source`
///
/// Anything else, including inputs differing only in whitespace or line
/// endings, goes through the full line merge.
pub fn three_way_merge<'a>(base: &str, source: &'a str, target: &'a str) -> MergeResult<'a> {
    if source == target {
        return MergeResult::clean(source);
    }
    if source == base {
        return MergeResult::clean(target);
    }
    if target == base {
        return MergeResult::clean(source);
    }

    let base_lines = split_lines(base);
    let source_lines = split_lines(source);
    let target_lines = split_lines(target);

    let (content, conflicts) = merge_lines(&base_lines, &source_lines, &target_lines);
    MergeResult::with_conflicts(content, conflicts)
}

fn merge_lines(
    base: &[Cow<'_, str>],
    source: &[Cow<'_, str>],
    target: &[Cow<'_, str>],
) -> (String, Vec<Conflict>) {
    let source_hunks = edit_script(base, source);
    let target_hunks = edit_script(base, target);

    let mut out = String::new();
    let mut conflicts = Vec::new();
    let (mut si, mut ti) = (0, 0);
    let mut pos = 0;

    loop {
        let start = match (source_hunks.get(si), target_hunks.get(ti)) {
            (None, None) => break,
            (Some(s), None) => s.base.start,
            (None, Some(t)) => t.base.start,
            (Some(s), Some(t)) => s.base.start.min(t.base.start),
        };

        push_lines(&mut out, &base[pos..start]);

        let (s_first, t_first) = (si, ti);
        let mut end = start;
        loop {
            let grew_source = absorb(&source_hunks, &mut si, start, &mut end);
            let grew_target = absorb(&target_hunks, &mut ti, start, &mut end);
            if !grew_source && !grew_target {
                break;
            }
        }

        let region = start..end;
        let source_part = &source_hunks[s_first..si];
        let target_part = &target_hunks[t_first..ti];

        if target_part.is_empty() {
            out.extend(render(base, source, source_part, region.clone()));
        } else if source_part.is_empty() {
            out.extend(render(base, target, target_part, region.clone()));
        } else {
            let ours = render(base, source, source_part, region.clone());
            let theirs = render(base, target, target_part, region.clone());

            if ours == theirs {
                out.extend(ours);
            } else {
                push_conflict_block(&mut out, &ours, &theirs);
                conflicts.push(Conflict {
                    line_number: start + 1,
                    base_lines: to_owned_lines(base[region.clone()].iter().map(line_str)),
                    source_lines: to_owned_lines(ours),
                    target_lines: to_owned_lines(theirs),
                });
            }
        }

        pos = end;
    }

    push_lines(&mut out, &base[pos..]);
    (out, conflicts)
}

/// Pull every hunk of one side that belongs to the region `[start, end)`.
///
/// A hunk belongs to the region when it starts at the region start or
/// begins strictly before its current end; `end` grows to cover it. A pure
/// insertion exactly at `end` is adjacent, not overlapping.
fn absorb(hunks: &[Hunk], next: &mut usize, start: usize, end: &mut usize) -> bool {
    let mut grew = false;
    while let Some(hunk) = hunks.get(*next) {
        if hunk.base.start != start && hunk.base.start >= *end {
            break;
        }
        *end = (*end).max(hunk.base.end);
        *next += 1;
        grew = true;
    }
    grew
}

/// A side's version of the base `region`, given its hunks inside it.
fn render<'l>(
    base: &'l [Cow<'_, str>],
    side: &'l [Cow<'_, str>],
    hunks: &[Hunk],
    region: Range<usize>,
) -> Vec<&'l str> {
    let mut lines = Vec::new();
    let mut pos = region.start;
    for hunk in hunks {
        lines.extend(base[pos..hunk.base.start].iter().map(line_str));
        lines.extend(side[hunk.new.clone()].iter().map(line_str));
        pos = hunk.base.end;
    }
    lines.extend(base[pos..region.end].iter().map(line_str));
    lines
}

fn line_str<'l>(line: &'l Cow<'_, str>) -> &'l str {
    line
}

fn push_lines(out: &mut String, lines: &[Cow<'_, str>]) {
    for line in lines {
        out.push_str(line);
    }
}

fn to_owned_lines<'l>(lines: impl IntoIterator<Item = &'l str>) -> Vec<String> {
    lines.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_paths_borrow_inputs() {
        let result = three_way_merge("a\n", "b\n", "b\n");
        assert!(matches!(result.content, Cow::Borrowed("b\n")));

        let result = three_way_merge("a\n", "a\n", "c\n");
        assert!(matches!(result.content, Cow::Borrowed("c\n")));

        let result = three_way_merge("a\n", "s\n", "a\n");
        assert!(matches!(result.content, Cow::Borrowed("s\n")));
    }

    #[test]
    fn both_delete_same_line() {
        let result = three_way_merge("a\nb\nc\n", "a\nc\n", "a\nc\nd\n");
        assert!(result.success);
        assert_eq!(result.content, "a\nc\nd\n");
    }

    #[test]
    fn insertion_inside_other_change_conflicts() {
        // Source rewrites lines 2-4, target inserts between 3 and 4.
        let base = "1\n2\n3\n4\n5\n";
        let source = "1\nX\n5\n";
        let target = "1\n2\n3\nnew\n4\n5\n";

        let result = three_way_merge(base, source, target);
        assert!(!result.success);
        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.line_number, 2);
        assert_eq!(conflict.base_lines, vec!["2\n", "3\n", "4\n"]);
        assert_eq!(conflict.source_lines, vec!["X\n"]);
        assert_eq!(conflict.target_lines, vec!["2\n", "3\n", "new\n", "4\n"]);
    }

    #[test]
    fn insertion_adjacent_to_other_change_merges() {
        let base = "1\n2\n3\n";
        let source = "1\nTWO\n3\n";
        let target = "1\n2\n3\n4\n";

        let result = three_way_merge(base, source, target);
        assert!(result.success);
        assert_eq!(result.content, "1\nTWO\n3\n4\n");
    }

    #[test]
    fn partially_overlapping_changes_form_one_region() {
        let base = "a\nb\nc\nd\n";
        let source = "A\nB\nc\nd\n";
        let target = "a\nBB\nCC\nd\n";

        let result = three_way_merge(base, source, target);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].line_number, 1);
        assert_eq!(result.conflicts[0].base_lines, vec!["a\n", "b\n", "c\n"]);
        assert_eq!(
            result.content,
            "<<<<<<< SOURCE\nA\nB\nc\n=======\na\nBB\nCC\n>>>>>>> TARGET\nd\n"
        );
    }
}
