//! Merge result types

use std::borrow::Cow;

/// One side of a pair as seen by the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The side whose change triggered the merge
    Source,
    /// The partner side
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "target" => Ok(Self::Target),
            other => Err(format!("unknown side '{other}', expected 'source' or 'target'")),
        }
    }
}

/// A single unresolved region of a merge.
///
/// Lines keep their terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// 1-based line number of the region start in the base
    pub line_number: usize,
    /// Base lines covered by the region
    pub base_lines: Vec<String>,
    /// The source's version of the region
    pub source_lines: Vec<String>,
    /// The target's version of the region
    pub target_lines: Vec<String>,
}

/// Outcome of [`three_way_merge`](crate::three_way_merge).
///
/// `content` is always present. When `success` is false it embeds conflict
/// markers, one block per entry of `conflicts`. On the fast paths the content
/// borrows one of the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult<'a> {
    pub success: bool,
    pub content: Cow<'a, str>,
    pub conflicts: Vec<Conflict>,
}

impl<'a> MergeResult<'a> {
    /// A merge without conflicts.
    pub fn clean(content: impl Into<Cow<'a, str>>) -> Self {
        Self {
            success: true,
            content: content.into(),
            conflicts: Vec::new(),
        }
    }

    /// A merge that embeds conflict markers.
    ///
    /// `success` is true iff `conflicts` is empty.
    pub fn with_conflicts(content: impl Into<Cow<'a, str>>, conflicts: Vec<Conflict>) -> Self {
        Self {
            success: conflicts.is_empty(),
            content: content.into(),
            conflicts,
        }
    }

    /// Detach the result from the inputs it borrows.
    pub fn into_owned(self) -> MergeResult<'static> {
        MergeResult {
            success: self.success,
            content: Cow::Owned(self.content.into_owned()),
            conflicts: self.conflicts,
        }
    }
}
