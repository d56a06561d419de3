//! Shared utilities for CLI commands.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ambit_core::{CalendarEvent, EventKind};

/// Loads the events collection from a JSON array file.
///
/// A missing file is treated as an empty calendar.
pub fn load_events(path: &Path) -> Result<Vec<CalendarEvent>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "events file not found, using empty calendar");
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_events(file).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads a JSON array of events.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<CalendarEvent>> {
    let events: Vec<CalendarEvent> =
        serde_json::from_reader(reader).context("expected a JSON array of events")?;
    tracing::debug!(count = events.len(), "loaded events");
    Ok(events)
}

/// Parses a `YYYY-MM-DD` command-line date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD (e.g., 2026-01-12)"))
}

/// Short description of an event's shape for listings.
pub fn describe(event: &CalendarEvent) -> String {
    match &event.kind {
        EventKind::Timed(_) => "timed".to_string(),
        EventKind::AllDay(_) => "all day".to_string(),
        EventKind::Recurring { rule, .. } if event.is_all_day() => {
            format!("all day, repeats {}", rule.trim())
        }
        EventKind::Recurring { rule, .. } => format!("repeats {}", rule.trim()),
    }
}
