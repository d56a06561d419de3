//! Conflict detection for event drafts.
//!
//! # Algorithm
//!
//! The candidate is authored in the viewer's timezone and placed on the
//! absolute timeline once. Each existing event is then tested by shape:
//!
//! - **Recurring**: resolve its occurrence on the candidate's date; no occurrence
//!   means no conflict, an all-day occurrence always conflicts.
//! - **All-day**: conflicts when its `[start, end)` date range contains the candidate's date.
//! - **Timed**: half-open overlap of the two intervals.
//!
//! Events that cannot be evaluated (missing instants, unknown timezones,
//! blank rules) are skipped, never reported as errors.

use rayon::prelude::*;

use crate::event::{CalendarEvent, EventKind};
use crate::occurrence::{Occurrence, resolve_event_occurrence, timed_interval};
use crate::types::{Candidate, CoreError, DateRange, TimeInterval};
use crate::wall_clock::{OffsetSource, TzdbOffsets, wall_clock_to_instant};

/// Finds existing events that overlap a candidate.
///
/// Holds no state between calls; a single detector can be shared across threads.
#[derive(Debug, Clone)]
pub struct ConflictDetector<S = TzdbOffsets> {
    source: S,
    viewer_timezone: String,
}

impl ConflictDetector<TzdbOffsets> {
    /// Detector backed by the IANA timezone database.
    pub fn with_timezone(viewer_timezone: impl Into<String>) -> Self {
        Self::new(TzdbOffsets, viewer_timezone)
    }
}

impl<S: OffsetSource> ConflictDetector<S> {
    pub fn new(source: S, viewer_timezone: impl Into<String>) -> Self {
        Self {
            source,
            viewer_timezone: viewer_timezone.into(),
        }
    }

    pub fn viewer_timezone(&self) -> &str {
        &self.viewer_timezone
    }

    pub const fn offsets(&self) -> &S {
        &self.source
    }

    /// Places the candidate on the absolute timeline in the viewer's timezone.
    pub fn candidate_interval(&self, candidate: &Candidate) -> Result<TimeInterval, CoreError> {
        let resolve = |time| {
            wall_clock_to_instant(&self.source, candidate.date, time, &self.viewer_timezone)
        };
        match (resolve(candidate.start_time), resolve(candidate.end_time)) {
            (Some(start), Some(end)) => Ok(TimeInterval::new(start, end)),
            _ => Err(CoreError::UnresolvableCandidate {
                timezone: self.viewer_timezone.clone(),
            }),
        }
    }

    /// Returns the events in `existing` that overlap `candidate`, in input order.
    ///
    /// The event whose id equals `exclude_id` (typically the one being edited) is ignored.
    pub fn find_conflicts<'a>(
        &self,
        candidate: &Candidate,
        existing: &'a [CalendarEvent],
        exclude_id: Option<&str>,
    ) -> Result<Vec<&'a CalendarEvent>, CoreError> {
        let window = self.candidate_interval(candidate)?;
        tracing::debug!(
            date = %candidate.date,
            start = %window.start,
            end = %window.end,
            existing = existing.len(),
            "checking candidate for conflicts"
        );

        let conflicts: Vec<&CalendarEvent> = existing
            .iter()
            .filter(|event| exclude_id != Some(event.id.as_str()))
            .filter(|event| self.conflicts_with(candidate, &window, event))
            .collect();

        tracing::debug!(conflicts = conflicts.len(), "conflict check finished");
        Ok(conflicts)
    }

    /// Checks many candidates against the same collection in parallel.
    ///
    /// Results line up with `candidates`.
    pub fn find_conflicts_batch<'a>(
        &self,
        candidates: &[Candidate],
        existing: &'a [CalendarEvent],
        exclude_id: Option<&str>,
    ) -> Vec<Result<Vec<&'a CalendarEvent>, CoreError>> {
        candidates
            .par_iter()
            .map(|candidate| self.find_conflicts(candidate, existing, exclude_id))
            .collect()
    }

    /// Whether a single event overlaps the candidate's `window`.
    pub fn conflicts_with(
        &self,
        candidate: &Candidate,
        window: &TimeInterval,
        event: &CalendarEvent,
    ) -> bool {
        match &event.kind {
            EventKind::Recurring { .. } => {
                match resolve_event_occurrence(
                    &self.source,
                    event,
                    candidate.date,
                    &self.viewer_timezone,
                ) {
                    Some(Occurrence::Timed(occurrence)) => window.overlaps(&occurrence),
                    Some(Occurrence::AllDay { .. }) => true,
                    None => false,
                }
            }
            EventKind::AllDay(span) => {
                let Some(start) = span.start else {
                    tracing::debug!(
                        event_id = %event.id,
                        "skipping all-day event without start date"
                    );
                    return false;
                };
                DateRange::at_least_one_day(start, span.end).contains(candidate.date)
            }
            EventKind::Timed(span) => {
                match timed_interval(&self.source, span, &self.viewer_timezone) {
                    Some(interval) => window.overlaps(&interval),
                    None => {
                        tracing::debug!(
                            event_id = %event.id,
                            "skipping timed event without resolvable start and end"
                        );
                        false
                    }
                }
            }
        }
    }
}
