//! Check command: report events a single draft would overlap.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use ambit_core::{CalendarEvent, Candidate, ConflictDetector};

use super::util::describe;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Date of the draft (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Start time (HH:MM).
    #[arg(long)]
    pub start: String,

    /// End time (HH:MM), must be after the start.
    #[arg(long)]
    pub end: String,

    /// Ignore the event with this ID, e.g. the one being edited.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Output the conflicting events as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Runs the check and returns the number of conflicts found.
pub fn run<W: Write>(
    writer: &mut W,
    args: &CheckArgs,
    detector: &ConflictDetector,
    events: &[CalendarEvent],
) -> Result<usize> {
    let candidate =
        Candidate::parse(&args.date, &args.start, &args.end).context("invalid event draft")?;
    let conflicts = detector.find_conflicts(&candidate, events, args.exclude.as_deref())?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&conflicts)?)?;
    } else {
        write!(writer, "{}", format_conflicts(&conflicts))?;
    }

    Ok(conflicts.len())
}

/// Badge text shown next to the draft.
pub fn badge(count: usize) -> String {
    match count {
        0 => "No overlapping events".to_string(),
        1 => "1 overlapping event".to_string(),
        n => format!("{n} overlapping events"),
    }
}

/// Badge line followed by one line per conflicting event.
pub fn format_conflicts(conflicts: &[&CalendarEvent]) -> String {
    let mut output = badge(conflicts.len());
    output.push('\n');
    for event in conflicts {
        let _ = writeln!(output, "- {} ({})", event.label(), describe(event));
    }
    output
}
