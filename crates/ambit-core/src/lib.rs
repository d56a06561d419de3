//! Calendar conflict detection for ambit.
//!
//! This crate contains the pure scheduling logic behind the event editor:
//! - Wall clock: converting timezone-qualified local time to absolute instants
//! - Recurrence: parsing `FREQ=...;BYDAY=...` rules
//! - Occurrences: resolving a recurring event on a given calendar day
//! - Conflicts: finding existing events that overlap a draft

mod conflict;
pub mod event;
pub mod occurrence;
pub mod recurrence;
mod types;
pub mod wall_clock;

pub use conflict::ConflictDetector;
pub use event::{
    CalendarEvent, DateSpan, EventDateTime, EventKind, EventRecord, RecurringTemplate, TimedSpan,
    ZonedDateTime,
};
pub use occurrence::{Occurrence, occurrences_between, resolve_occurrence};
pub use recurrence::{Frequency, RecurrencePattern, WeekdaySet};
pub use types::{Candidate, CoreError, DateRange, TimeInterval, ValidationError};
pub use wall_clock::{
    FixedOffsetTable, OffsetSource, TzdbOffsets, instant_to_local_time, timezone_offset_at,
    to_wall_clock, wall_clock_to_instant,
};
