//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::agenda::AgendaArgs;
use crate::commands::batch::BatchArgs;
use crate::commands::check::CheckArgs;

/// Calendar conflict checker.
///
/// Tells you which of your existing commitments a new event would overlap,
/// across timezones, all-day entries and weekly routines.
#[derive(Debug, Parser)]
#[command(name = "ambit", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the events JSON file (overrides config).
    #[arg(long, global = true)]
    pub events: Option<PathBuf>,

    /// IANA timezone the drafts are authored in (overrides config).
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check one event draft for overlapping events.
    Check(CheckArgs),

    /// Check a JSON list of drafts read from stdin.
    Batch(BatchArgs),

    /// List event occurrences over a date range.
    Agenda(AgendaArgs),
}
