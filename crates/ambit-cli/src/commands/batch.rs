//! Batch command: check many drafts read from a JSON array.

use std::fmt::Write as _;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use ambit_core::{CalendarEvent, Candidate, ConflictDetector, CoreError};

use super::check::badge;
use super::util::describe;

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Ignore the event with this ID in every check.
    #[arg(long)]
    pub exclude: Option<String>,

    /// Output one result object per draft as JSON.
    #[arg(long)]
    pub json: bool,
}

/// A draft as read from input. Fields stay raw so each can be validated on its own.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DraftReport<'a> {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicts: Option<Vec<&'a CalendarEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Reads drafts, checks them and writes one report per draft.
///
/// Returns the number of drafts that were rejected.
pub fn run<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    args: &BatchArgs,
    detector: &ConflictDetector,
    events: &[CalendarEvent],
) -> Result<usize> {
    let drafts: Vec<Draft> =
        serde_json::from_reader(reader).context("expected a JSON array of drafts")?;
    let reports = check_drafts(&drafts, args.exclude.as_deref(), detector, events);
    let rejected = reports.iter().filter(|report| report.error.is_some()).count();

    tracing::info!(drafts = drafts.len(), rejected, "batch check finished");

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&reports)?)?;
    } else {
        write!(writer, "{}", format_reports(&reports))?;
    }

    Ok(rejected)
}

fn check_drafts<'a>(
    drafts: &[Draft],
    exclude_id: Option<&str>,
    detector: &ConflictDetector,
    events: &'a [CalendarEvent],
) -> Vec<DraftReport<'a>> {
    let parsed: Vec<Result<Candidate, CoreError>> = drafts
        .iter()
        .map(|draft| {
            Candidate::parse(&draft.date, &draft.start_time, &draft.end_time).map_err(Into::into)
        })
        .collect();
    let valid: Vec<Candidate> = parsed
        .iter()
        .filter_map(|parsed| parsed.as_ref().ok().copied())
        .collect();
    let mut results = detector
        .find_conflicts_batch(&valid, events, exclude_id)
        .into_iter();

    drafts
        .iter()
        .zip(parsed)
        .enumerate()
        .map(|(index, (draft, parsed))| {
            let label = draft
                .label
                .clone()
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| format!("draft {}", index + 1));
            let outcome = match parsed {
                Ok(_) => results.next().unwrap_or_else(|| Ok(Vec::new())),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(conflicts) => DraftReport {
                    label,
                    conflicts: Some(conflicts),
                    error: None,
                },
                Err(e) => DraftReport {
                    label,
                    conflicts: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect()
}

fn format_reports(reports: &[DraftReport<'_>]) -> String {
    let mut output = String::new();
    for report in reports {
        match (&report.conflicts, &report.error) {
            (_, Some(error)) => {
                let _ = writeln!(output, "{}: invalid draft: {error}", report.label);
            }
            (Some(conflicts), None) => {
                let _ = writeln!(output, "{}: {}", report.label, badge(conflicts.len()));
                for event in conflicts {
                    let _ = writeln!(output, "  - {} ({})", event.label(), describe(event));
                }
            }
            (None, None) => {}
        }
    }
    output
}
