//! Core value types with validation.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for candidate input.
///
/// These are user-correctable and are surfaced before any conflict check runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The date was not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date: {value} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    /// A time-of-day was not a valid `HH:MM` value.
    #[error("invalid {field}: {value} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },

    /// The end time does not come after the start time.
    #[error("end time {end} must be after start time {start}")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },
}

/// Errors raised by the conflict engine.
///
/// Malformed *existing* events never produce an error; they are skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The candidate draft was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The candidate's wall-clock time could not be placed on the timeline.
    #[error("cannot resolve candidate in timezone {timezone}")]
    UnresolvableCandidate { timezone: String },
}

/// Half-open interval `[start, end)` of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True when the two intervals share any instant. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Half-open range `[start, end)` of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range that always spans at least one day.
    ///
    /// A missing end, or one not strictly after `start`, becomes `start + 1 day`.
    pub fn at_least_one_day(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let end = match end {
            Some(end) if end > start => end,
            _ => start.succ_opt().unwrap_or(start),
        };
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// A validated event draft, authored in the viewer's local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Candidate {
    /// Creates a candidate, rejecting drafts whose end is not after their start.
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, ValidationError> {
        if end_time <= start_time {
            return Err(ValidationError::EndNotAfterStart {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            date,
            start_time,
            end_time,
        })
    }

    /// Parses the raw form fields (`YYYY-MM-DD`, `HH:MM`, `HH:MM`).
    pub fn parse(date: &str, start_time: &str, end_time: &str) -> Result<Self, ValidationError> {
        let date = parse_date(date)?;
        let start = parse_time_field(start_time, "start time")?;
        let end = parse_time_field(end_time, "end time")?;
        Self::new(date, start, end)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field: "date" });
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        value: value.to_string(),
    })
}

fn parse_time_field(value: &str, field: &'static str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    parse_time_of_day(value).ok_or_else(|| ValidationError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 12, h, m, 0).unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = TimeInterval::new(utc(9, 0), utc(10, 0));
        let b = TimeInterval::new(utc(10, 0), utc(11, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn contained_interval_overlaps() {
        let outer = TimeInterval::new(utc(9, 0), utc(12, 0));
        let inner = TimeInterval::new(utc(10, 0), utc(10, 30));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn single_day_range_defaults_end() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let range = DateRange::at_least_one_day(day, Some(day));
        assert!(range.contains(day));
        assert!(!range.contains(day.succ_opt().unwrap()));

        let range = DateRange::at_least_one_day(day, None);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
    }

    #[test]
    fn multi_day_range_keeps_end_exclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        let range = DateRange::at_least_one_day(start, Some(end));
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 3, 12).unwrap()));
        assert!(!range.contains(end));
    }

    #[test]
    fn candidate_parse_accepts_form_fields() {
        let candidate = Candidate::parse("2026-01-12", "09:30", " 10:30 ").unwrap();
        assert_eq!(candidate.date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(candidate.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(candidate.end_time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn candidate_rejects_end_before_start() {
        let err = Candidate::parse("2026-01-12", "10:30", "10:30").unwrap_err();
        assert_eq!(
            err.to_string(),
            "end time 10:30:00 must be after start time 10:30:00"
        );
    }

    #[test]
    fn candidate_rejects_unparseable_fields() {
        assert_eq!(
            Candidate::parse("12/01/2026", "09:00", "10:00").unwrap_err(),
            ValidationError::InvalidDate {
                value: "12/01/2026".to_string()
            }
        );
        assert_eq!(
            Candidate::parse("2026-01-12", "9am", "10:00").unwrap_err(),
            ValidationError::InvalidTime {
                field: "start time",
                value: "9am".to_string()
            }
        );
        assert_eq!(
            Candidate::parse("2026-01-12", "09:00", "").unwrap_err(),
            ValidationError::Empty { field: "end time" }
        );
    }
}
