//! Agenda command: list event occurrences over a date range.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Serialize;

use ambit_core::{CalendarEvent, ConflictDetector, Occurrence, occurrences_between, to_wall_clock};

use super::util::parse_date;

#[derive(Debug, Args)]
pub struct AgendaArgs {
    /// First day to list (YYYY-MM-DD).
    #[arg(long)]
    pub from: String,

    /// Last day to list, inclusive (defaults to --from).
    #[arg(long)]
    pub to: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One line of the agenda.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgendaEntry<'a> {
    id: &'a str,
    label: &'a str,
    occurrence: Occurrence,
    #[serde(skip)]
    day: NaiveDate,
    #[serde(skip)]
    local: Option<(NaiveDateTime, NaiveDateTime)>,
}

pub fn run<W: Write>(
    writer: &mut W,
    args: &AgendaArgs,
    detector: &ConflictDetector,
    events: &[CalendarEvent],
) -> Result<()> {
    let from = parse_date(&args.from)?;
    let to = match &args.to {
        Some(to) => parse_date(to)?,
        None => from,
    };
    if to < from {
        bail!("--to ({to}) must not be before --from ({from})");
    }

    let entries = collect_entries(detector, events, from, to);
    tracing::debug!(%from, %to, entries = entries.len(), "built agenda");

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write!(writer, "{}", format_agenda(&entries))?;
    }
    Ok(())
}

fn collect_entries<'a>(
    detector: &ConflictDetector,
    events: &'a [CalendarEvent],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<AgendaEntry<'a>> {
    let source = detector.offsets();
    let timezone = detector.viewer_timezone();

    let mut entries: Vec<AgendaEntry<'a>> = events
        .iter()
        .flat_map(|event| {
            occurrences_between(source, event, from, to, timezone)
                .into_iter()
                .filter_map(move |occurrence| {
                    let (day, local) = match occurrence {
                        Occurrence::AllDay { date } => (date, None),
                        Occurrence::Timed(interval) => {
                            let start = to_wall_clock(source, interval.start, timezone)?;
                            let end = to_wall_clock(source, interval.end, timezone)?;
                            (start.date(), Some((start, end)))
                        }
                    };
                    Some(AgendaEntry {
                        id: &event.id,
                        label: event.label(),
                        occurrence,
                        day,
                        local,
                    })
                })
        })
        .collect();

    // All-day entries lead their day.
    entries.sort_by_key(|entry| (entry.day, entry.local.map(|(start, _)| start)));
    entries
}

fn format_agenda(entries: &[AgendaEntry<'_>]) -> String {
    if entries.is_empty() {
        return "No events\n".to_string();
    }

    let mut output = String::new();
    let mut current_day = None;
    for entry in entries {
        if current_day != Some(entry.day) {
            let _ = writeln!(output, "{}", entry.day.format("%a %Y-%m-%d"));
            current_day = Some(entry.day);
        }
        let when = match entry.local {
            Some((start, end)) => {
                let days = (end.date() - start.date()).num_days();
                let mut when = format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"));
                if days > 0 {
                    let _ = write!(when, "+{days}");
                }
                when
            }
            None => "all day".to_string(),
        };
        let _ = writeln!(output, "  {when:<14}{}", entry.label);
    }
    output
}
