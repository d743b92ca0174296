//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pairsync_merge::Side;

/// pairsync - keep pairs of files in sync across two locations
#[derive(Parser, Debug)]
#[command(name = "pairsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data home holding bases, conflicts and locks
    #[arg(long, global = true, env = "PAIRSYNC_HOME")]
    pub home: Option<PathBuf>,

    /// Pair configuration file (defaults to <home>/sync-config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch every pair and sync on change
    ///
    /// Runs until interrupted. Changes to the configuration file reload the
    /// pairs without a restart.
    Run,

    /// Reconcile every pair once
    Sync {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the state of every pair
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List unresolved conflicts
    Conflicts {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Print every conflicting region
        #[arg(long)]
        details: bool,
    },

    /// Resolve a conflict by keeping one side of every marker block
    ///
    /// Examples:
    ///   pairsync resolve zshrc --take source
    ///   pairsync resolve ~/dotfiles/.zshrc --take target
    Resolve {
        /// Pair name, or either path of the pair
        pair: String,

        /// Side to keep
        #[arg(long, value_enum)]
        take: TakeSide,
    },

    /// Three-way merge three files and print the result
    ///
    /// Exits with status 1 when the merge has conflicts.
    Merge {
        /// Common ancestor
        base: PathBuf,

        /// First edited version
        source: PathBuf,

        /// Second edited version
        target: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Side of a conflict block, as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeSide {
    Source,
    Target,
}

impl From<TakeSide> for Side {
    fn from(side: TakeSide) -> Self {
        match side {
            TakeSide::Source => Side::Source,
            TakeSide::Target => Side::Target,
        }
    }
}
