//! Line-based three-way merge for pairsync
//!
//! Given the last agreed content of a pair (the base) and the current content
//! of both sides, [`three_way_merge`] either produces a clean merge or a merge
//! with embedded conflict markers:
//!
//! ```text
//! <<<<<<< SOURCE
//! source lines
//! =======
//! target lines
//! >>>>>>> TARGET
//! ```
//!
//! The engine is a pure function: no I/O, no knowledge of paths or locks.
//! It works at line granularity only. Two edits to different parts of the
//! same line always conflict.
//!
//! # Example
//!
//! ```
//! use pairsync_merge::three_way_merge;
//!
//! let result = three_way_merge("L1\nL2\nL3\n", "L1x\nL2\nL3\n", "L1\nL2\nL3y\n");
//! assert!(result.success);
//! assert_eq!(result.content, "L1x\nL2\nL3y\n");
//! ```

pub mod display;
pub mod engine;
mod hunks;
pub mod markers;
pub mod types;

pub use display::format_conflict;
pub use engine::three_way_merge;
pub use markers::{
    SEPARATOR, SOURCE_MARKER, TARGET_MARKER, conflict_blocks_well_formed, count_conflict_blocks,
    has_conflict_markers, resolve_with,
};
pub use types::{Conflict, MergeResult, Side};
