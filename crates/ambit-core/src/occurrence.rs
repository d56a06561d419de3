//! Concrete occurrences of events on calendar days.
//!
//! A recurring event's occurrence on a day keeps the template's local start
//! time in the template's own timezone, so an occurrence after a
//! daylight-saving change starts at the same wall-clock time rather than
//! drifting by the offset change.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{
    CalendarEvent, DateSpan, EventKind, RecurringTemplate, TimedSpan, ZonedDateTime,
};
use crate::recurrence::RecurrencePattern;
use crate::types::{DateRange, TimeInterval};
use crate::wall_clock::{OffsetSource, local_time_of, resolve_date_time, wall_clock_to_instant};

/// Shortest duration an occurrence can have, in minutes.
pub const MIN_OCCURRENCE_MINUTES: i64 = 15;

/// One concrete instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Occurrence {
    /// A timed occurrence on the absolute timeline.
    Timed(TimeInterval),
    /// A whole calendar day.
    AllDay { date: NaiveDate },
}

fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn zone_of<'a>(value: &'a ZonedDateTime, fallback: &'a str) -> &'a str {
    value
        .time_zone
        .as_deref()
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(fallback)
}

fn resolve_zoned<S: OffsetSource + ?Sized>(
    source: &S,
    value: Option<&ZonedDateTime>,
    fallback_tz: &str,
) -> Option<DateTime<Utc>> {
    let value = value?;
    resolve_date_time(source, &value.date_time, zone_of(value, fallback_tz))
}

/// Absolute interval of a timed span. Both ends must resolve.
pub fn timed_interval<S: OffsetSource + ?Sized>(
    source: &S,
    span: &TimedSpan,
    fallback_tz: &str,
) -> Option<TimeInterval> {
    let start = resolve_zoned(source, span.start.as_ref(), fallback_tz)?;
    let end = resolve_zoned(source, span.end.as_ref(), fallback_tz)?;
    Some(TimeInterval::new(start, end))
}

/// `end − start` of the template, never shorter than [`MIN_OCCURRENCE_MINUTES`].
pub fn template_duration<S: OffsetSource + ?Sized>(
    source: &S,
    span: &TimedSpan,
    fallback_tz: &str,
) -> Duration {
    let minimum = Duration::minutes(MIN_OCCURRENCE_MINUTES);
    timed_interval(source, span, fallback_tz)
        .map_or(minimum, |interval| interval.duration().max(minimum))
}

/// Resolves the occurrence of a recurring template on `target`.
///
/// Returns `None` when the pattern has no occurrence that day or the template's
/// timezone is unknown.
pub fn resolve_occurrence<S: OffsetSource + ?Sized>(
    source: &S,
    pattern: &RecurrencePattern,
    template: &RecurringTemplate,
    target: NaiveDate,
    fallback_tz: &str,
) -> Option<Occurrence> {
    if !pattern.occurs_on_date(target) {
        return None;
    }

    let span = match template {
        RecurringTemplate::AllDay(_) => return Some(Occurrence::AllDay { date: target }),
        RecurringTemplate::Timed(span) => span,
    };

    let timezone = span
        .start
        .as_ref()
        .or(span.end.as_ref())
        .map_or(fallback_tz, |value| zone_of(value, fallback_tz));
    let start_time = span
        .start
        .as_ref()
        .and_then(|start| local_time_of(source, &start.date_time, timezone))
        .unwrap_or_else(default_start_time);
    let duration = template_duration(source, span, fallback_tz);

    let start = wall_clock_to_instant(source, target, start_time, timezone)?;
    let end = start.checked_add_signed(duration)?;
    Some(Occurrence::Timed(TimeInterval::new(start, end)))
}

/// Resolves a recurring event's occurrence on `target`.
///
/// Non-recurring events and blank rules yield `None`.
pub fn resolve_event_occurrence<S: OffsetSource + ?Sized>(
    source: &S,
    event: &CalendarEvent,
    target: NaiveDate,
    fallback_tz: &str,
) -> Option<Occurrence> {
    let EventKind::Recurring { rule, template } = &event.kind else {
        return None;
    };
    if rule.trim().is_empty() {
        tracing::debug!(event_id = %event.id, "recurring event has no rule");
        return None;
    }
    let pattern = RecurrencePattern::parse(rule);
    resolve_occurrence(source, &pattern, template, target, fallback_tz)
}

fn all_day_range(span: &DateSpan) -> Option<DateRange> {
    Some(DateRange::at_least_one_day(span.start?, span.end))
}

/// Expands an event into its occurrences between `from` and `to` inclusive.
///
/// Timed events are included when they intersect the local days of the range
/// in `fallback_tz`. All-day events yield one occurrence per covered day.
pub fn occurrences_between<S: OffsetSource + ?Sized>(
    source: &S,
    event: &CalendarEvent,
    from: NaiveDate,
    to: NaiveDate,
    fallback_tz: &str,
) -> Vec<Occurrence> {
    let days = from.iter_days().take_while(move |day| *day <= to);

    match &event.kind {
        EventKind::Recurring { .. } => days
            .filter_map(|day| resolve_event_occurrence(source, event, day, fallback_tz))
            .collect(),
        EventKind::AllDay(span) => all_day_range(span).map_or_else(Vec::new, |range| {
            days.filter(|day| range.contains(*day))
                .map(|date| Occurrence::AllDay { date })
                .collect()
        }),
        EventKind::Timed(span) => {
            let window = to.succ_opt().and_then(|after| {
                let start = wall_clock_to_instant(source, from, NaiveTime::MIN, fallback_tz)?;
                let end = wall_clock_to_instant(source, after, NaiveTime::MIN, fallback_tz)?;
                Some(TimeInterval::new(start, end))
            });
            match (window, timed_interval(source, span, fallback_tz)) {
                (Some(window), Some(interval)) if window.overlaps(&interval) => {
                    vec![Occurrence::Timed(interval)]
                }
                _ => Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wall_clock::{FixedOffsetTable, TzdbOffsets};
    use chrono::{FixedOffset, TimeZone};

    const NEW_YORK: &str = "America/New_York";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn timed(start: &str, end: &str, tz: Option<&str>) -> RecurringTemplate {
        RecurringTemplate::Timed(TimedSpan {
            start: Some(ZonedDateTime::new(start, tz)),
            end: Some(ZonedDateTime::new(end, tz)),
        })
    }

    fn monday_standup() -> RecurringTemplate {
        timed("2026-01-05T09:00", "2026-01-05T10:00", Some(NEW_YORK))
    }

    #[test]
    fn weekly_template_resolves_on_later_monday() {
        let pattern = RecurrencePattern::parse("FREQ=WEEKLY;BYDAY=MO");
        let monday = date(2026, 1, 12);
        let occurrence =
            resolve_occurrence(&TzdbOffsets, &pattern, &monday_standup(), monday, "UTC");
        assert_eq!(
            occurrence,
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 1, 12, 14, 0),
                utc(2026, 1, 12, 15, 0)
            )))
        );
    }

    #[test]
    fn weekly_template_has_no_occurrence_on_tuesday() {
        let pattern = RecurrencePattern::parse("FREQ=WEEKLY;BYDAY=MO");
        let tuesday = date(2026, 1, 13);
        let occurrence =
            resolve_occurrence(&TzdbOffsets, &pattern, &monday_standup(), tuesday, "UTC");
        assert_eq!(occurrence, None);
    }

    #[test]
    fn weekday_filter_resolves_only_listed_days() {
        let pattern = RecurrencePattern::parse("FREQ=WEEKLY;BYDAY=MO,WE,FR");
        let resolved: Vec<bool> = (11..=17)
            .map(|day| {
                let target = date(2026, 1, day);
                resolve_occurrence(&TzdbOffsets, &pattern, &monday_standup(), target, "UTC")
                    .is_some()
            })
            .collect();
        assert_eq!(resolved, vec![false, true, false, true, false, true, false]);
    }

    #[test]
    fn occurrence_keeps_wall_clock_time_across_spring_forward() {
        // New York springs forward at 02:00 on Sunday 2026-03-08.
        let pattern = RecurrencePattern::parse("FREQ=WEEKLY;BYDAY=SU");
        let template = timed("2026-03-01T09:00", "2026-03-01T09:30", Some(NEW_YORK));

        let before =
            resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 3, 1), "UTC");
        let on = resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 3, 8), "UTC");

        assert_eq!(
            before,
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 3, 1, 14, 0),
                utc(2026, 3, 1, 14, 30)
            )))
        );
        assert_eq!(
            on,
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 3, 8, 13, 0),
                utc(2026, 3, 8, 13, 30)
            )))
        );
    }

    #[test]
    fn absolute_template_start_is_read_in_template_zone() {
        let pattern = RecurrencePattern::parse("FREQ=DAILY");
        let template = timed("2026-01-05T14:00:00Z", "2026-01-05T15:30:00Z", Some(NEW_YORK));
        let occurrence =
            resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 7, 1), "UTC");
        // 09:00 EDT in July.
        assert_eq!(
            occurrence,
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 7, 1, 13, 0),
                utc(2026, 7, 1, 14, 30)
            )))
        );
    }

    #[test]
    fn short_or_open_ended_templates_last_fifteen_minutes() {
        let pattern = RecurrencePattern::parse("FREQ=DAILY");
        let short = timed("2026-01-05T09:00", "2026-01-05T09:05", Some(NEW_YORK));
        let open = RecurringTemplate::Timed(TimedSpan {
            start: Some(ZonedDateTime::new("2026-01-05T09:00", Some(NEW_YORK))),
            end: None,
        });

        for template in [short, open] {
            let Some(Occurrence::Timed(interval)) =
                resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 1, 6), "UTC")
            else {
                panic!("expected a timed occurrence");
            };
            assert_eq!(interval.duration(), Duration::minutes(15));
        }
    }

    #[test]
    fn template_without_start_defaults_to_nine() {
        let pattern = RecurrencePattern::parse("FREQ=DAILY");
        let template = RecurringTemplate::Timed(TimedSpan::default());
        let occurrence =
            resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 1, 6), NEW_YORK);
        assert_eq!(
            occurrence,
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 1, 6, 14, 0),
                utc(2026, 1, 6, 14, 15)
            )))
        );
    }

    #[test]
    fn all_day_template_covers_target_day() {
        let pattern = RecurrencePattern::parse("FREQ=WEEKLY;BYDAY=TU");
        let template = RecurringTemplate::AllDay(DateSpan::default());
        assert_eq!(
            resolve_occurrence(&TzdbOffsets, &pattern, &template, date(2026, 1, 13), "UTC"),
            Some(Occurrence::AllDay {
                date: date(2026, 1, 13)
            })
        );
    }

    #[test]
    fn unsupported_frequency_and_blank_rule_resolve_to_none() {
        let monthly = CalendarEvent::recurring("rent", "FREQ=MONTHLY", monday_standup());
        let blank = CalendarEvent::recurring("blank", "  ", monday_standup());
        for event in [monthly, blank] {
            assert_eq!(
                resolve_event_occurrence(&TzdbOffsets, &event, date(2026, 1, 12), "UTC"),
                None
            );
        }
    }

    #[test]
    fn injected_offset_table_drives_resolution() {
        let table =
            FixedOffsetTable::new().with_zone("Test/Plus2", FixedOffset::east_opt(7200).unwrap());
        let pattern = RecurrencePattern::parse("FREQ=DAILY");
        let template = timed("2026-01-05T09:00", "2026-01-05T10:00", Some("Test/Plus2"));
        assert_eq!(
            resolve_occurrence(&table, &pattern, &template, date(2026, 1, 6), "UTC"),
            Some(Occurrence::Timed(TimeInterval::new(
                utc(2026, 1, 6, 7, 0),
                utc(2026, 1, 6, 8, 0)
            )))
        );
        // Unknown to the table.
        let elsewhere = timed("2026-01-05T09:00", "2026-01-05T10:00", Some(NEW_YORK));
        assert_eq!(
            resolve_occurrence(&table, &pattern, &elsewhere, date(2026, 1, 6), "UTC"),
            None
        );
    }

    fn expand(event: &CalendarEvent, from: NaiveDate, to: NaiveDate) -> Vec<Occurrence> {
        occurrences_between(&TzdbOffsets, event, from, to, NEW_YORK)
    }

    #[test]
    fn occurrences_between_expands_each_shape() {
        let daily = CalendarEvent::recurring("daily", "FREQ=DAILY", monday_standup());
        let occurrences = expand(&daily, date(2026, 1, 12), date(2026, 1, 14));
        assert_eq!(occurrences.len(), 3);

        let retreat =
            CalendarEvent::all_day("retreat", date(2026, 1, 10), Some(date(2026, 1, 14)));
        let occurrences = expand(&retreat, date(2026, 1, 12), date(2026, 1, 20));
        assert_eq!(
            occurrences,
            vec![
                Occurrence::AllDay { date: date(2026, 1, 12) },
                Occurrence::AllDay { date: date(2026, 1, 13) },
            ]
        );

        let meeting = CalendarEvent::timed(
            "meeting",
            ZonedDateTime::new("2026-01-13T23:30:00-05:00", None),
            ZonedDateTime::new("2026-01-14T00:30:00-05:00", None),
        );
        let inside = expand(&meeting, date(2026, 1, 14), date(2026, 1, 14));
        assert_eq!(inside.len(), 1);
        let outside = expand(&meeting, date(2026, 1, 15), date(2026, 1, 16));
        assert!(outside.is_empty());
    }
}
