//! Conversion between timezone-qualified wall-clock time and absolute instants.
//!
//! Timezone rules are looked up through the [`OffsetSource`] trait so callers
//! can swap the IANA database for a fixed table in tests.
//!
//! # Resolving wall-clock time
//!
//! The offset in effect depends on the instant being computed, so
//! [`wall_clock_to_instant`] refines its answer twice:
//!
//! 1. Read the wall clock as if it were UTC, look up the offset there, correct.
//! 2. Look up the offset at the corrected instant and correct the initial guess again.
//!
//! Offsets are piecewise constant and move by at most a few hours, so the second
//! step lands on the right side of any daylight-saving transition.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono::{Datelike, Offset, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::types::parse_time_of_day;

/// Looks up the UTC offset of a named timezone at an instant.
pub trait OffsetSource: Send + Sync {
    /// Returns the offset in effect, or `None` if the timezone is unknown.
    fn offset_at(&self, timezone: &str, instant: DateTime<Utc>) -> Option<FixedOffset>;
}

/// Offsets from the IANA timezone database bundled with `chrono-tz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TzdbOffsets;

impl OffsetSource for TzdbOffsets {
    fn offset_at(&self, timezone: &str, instant: DateTime<Utc>) -> Option<FixedOffset> {
        let tz: Tz = timezone.trim().parse().ok()?;
        let utc = instant.naive_utc();
        let offset = tz.offset_from_utc_datetime(&utc).fix();
        let local = utc.checked_add_signed(offset_duration(offset))?;
        let wall = WallClockFields::from_naive(local).normalized()?;
        let seconds = wall.and_utc().timestamp() - instant.timestamp();
        FixedOffset::east_opt(i32::try_from(seconds).ok()?)
    }
}

/// Deterministic offset table keyed by timezone name.
///
/// Each zone holds `(effective_from, offset)` transitions sorted by instant.
#[derive(Debug, Clone, Default)]
pub struct FixedOffsetTable {
    zones: HashMap<String, Vec<(DateTime<Utc>, FixedOffset)>>,
}

impl FixedOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zone with a constant offset from the beginning of time.
    #[must_use]
    pub fn with_zone(self, timezone: &str, offset: FixedOffset) -> Self {
        self.with_transition(timezone, DateTime::<Utc>::MIN_UTC, offset)
    }

    /// Adds an offset that takes effect at `at`.
    #[must_use]
    pub fn with_transition(
        mut self,
        timezone: &str,
        at: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let transitions = self.zones.entry(timezone.to_string()).or_default();
        transitions.push((at, offset));
        transitions.sort_by_key(|(at, _)| *at);
        self
    }
}

impl OffsetSource for FixedOffsetTable {
    fn offset_at(&self, timezone: &str, instant: DateTime<Utc>) -> Option<FixedOffset> {
        self.zones
            .get(timezone)?
            .iter()
            .take_while(|(at, _)| *at <= instant)
            .last()
            .map(|(_, offset)| *offset)
    }
}

/// Broken-down wall-clock reading as produced by a date-time formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClockFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallClockFields {
    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
        }
    }

    /// Builds the naive date-time, rolling an hour of 24 over to midnight of the next day.
    pub fn normalized(self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let (date, hour) = if self.hour == 24 {
            (date.succ_opt()?, 0)
        } else {
            (date, self.hour)
        };
        date.and_hms_opt(hour, self.minute, self.second)
    }
}

/// A parsed `dateTime` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Carried its own offset, so it names a single instant.
    Absolute(DateTime<Utc>),
    /// Wall-clock reading that still needs a timezone.
    Local(NaiveDateTime),
}

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses RFC 3339 timestamps and naive local `YYYY-MM-DDTHH:MM[:SS]` values.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Timestamp::Absolute(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(Timestamp::Absolute(dt.with_timezone(&Utc)));
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(Timestamp::Local)
}

fn offset_duration(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}

/// Returns the UTC offset in effect for `timezone` at `instant`.
pub fn timezone_offset_at<S: OffsetSource + ?Sized>(
    source: &S,
    timezone: &str,
    instant: DateTime<Utc>,
) -> Option<FixedOffset> {
    source.offset_at(timezone, instant)
}

/// Resolves a wall-clock reading in `timezone` to an absolute instant.
///
/// Local times skipped by a spring-forward transition resolve using the offset
/// in effect after it; repeated local times resolve to their first occurrence.
pub fn wall_clock_to_instant<S: OffsetSource + ?Sized>(
    source: &S,
    date: NaiveDate,
    time: NaiveTime,
    timezone: &str,
) -> Option<DateTime<Utc>> {
    let guess = date.and_time(time).and_utc();
    let first = source.offset_at(timezone, guess)?;
    let corrected = guess.checked_sub_signed(offset_duration(first))?;
    let second = source.offset_at(timezone, corrected)?;
    guess.checked_sub_signed(offset_duration(second))
}

/// Resolves a stored `dateTime` string to an absolute instant.
///
/// Naive values are read as wall-clock time in `timezone`.
pub fn resolve_date_time<S: OffsetSource + ?Sized>(
    source: &S,
    value: &str,
    timezone: &str,
) -> Option<DateTime<Utc>> {
    match parse_timestamp(value)? {
        Timestamp::Absolute(instant) => Some(instant),
        Timestamp::Local(local) => {
            wall_clock_to_instant(source, local.date(), local.time(), timezone)
        }
    }
}

/// Reads an absolute instant off a wall clock in `timezone`.
pub fn to_wall_clock<S: OffsetSource + ?Sized>(
    source: &S,
    instant: DateTime<Utc>,
    timezone: &str,
) -> Option<NaiveDateTime> {
    let offset = source.offset_at(timezone, instant)?;
    instant
        .checked_add_signed(offset_duration(offset))
        .map(|local| local.naive_utc())
}

/// Time of day of `value` as read on a wall clock in `timezone`.
///
/// Accepts RFC 3339 timestamps, naive local date-times and bare `HH:MM` values.
pub fn local_time_of<S: OffsetSource + ?Sized>(
    source: &S,
    value: &str,
    timezone: &str,
) -> Option<NaiveTime> {
    match parse_timestamp(value) {
        Some(Timestamp::Absolute(instant)) => {
            to_wall_clock(source, instant, timezone).map(|local| local.time())
        }
        Some(Timestamp::Local(local)) => Some(local.time()),
        None => parse_time_of_day(value.trim()),
    }
}

/// Formats `value` as `HH:MM` wall-clock time in `timezone`; `None` when unparseable.
pub fn instant_to_local_time<S: OffsetSource + ?Sized>(
    source: &S,
    value: &str,
    timezone: &str,
) -> Option<String> {
    local_time_of(source, value, timezone).map(|time| time.format("%H:%M").to_string())
}
