//! Shared test utilities for the pairsync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`]: [`PairFixture`], a temporary data home with two sibling
//!   directories to pair files across
//! - [`notifier`]: [`RecordingNotifier`], a conflict notifier that remembers
//!   what it was told

pub mod fixture;
pub mod notifier;

pub use fixture::{Harness, PairFixture};
pub use notifier::RecordingNotifier;
