//! Calendar events as supplied by the surrounding application.
//!
//! On the wire an event is a flat record (`isAllDay`, `isRecurring`,
//! `recurrenceRule`, `start`/`end` as `{dateTime, timeZone}` or `{date}`).
//! In memory it is a [`CalendarEvent`] whose [`EventKind`] carries only the
//! fields relevant to its shape.
//!
//! Conversion from the wire never fails on timing fields. Values that cannot be
//! evaluated are kept (or dropped to `None`) and the conflict engine skips them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A `dateTime` value with its named timezone.
///
/// `date_time` is either an RFC 3339 timestamp or a naive local date-time,
/// resolved later against `time_zone` (or the viewer's zone when absent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZonedDateTime {
    pub date_time: String,
    pub time_zone: Option<String>,
}

impl ZonedDateTime {
    pub fn new(date_time: impl Into<String>, time_zone: Option<&str>) -> Self {
        Self {
            date_time: date_time.into(),
            time_zone: time_zone.map(str::to_string),
        }
    }
}

/// Start/end of a timed event. Either side may be missing in malformed data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimedSpan {
    pub start: Option<ZonedDateTime>,
    pub end: Option<ZonedDateTime>,
}

/// Start/end dates of an all-day event; `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// The stored instance a recurring event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecurringTemplate {
    Timed(TimedSpan),
    AllDay(DateSpan),
}

/// Shape of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Timed(TimedSpan),
    AllDay(DateSpan),
    Recurring {
        /// Raw rule string, parsed on evaluation.
        rule: String,
        template: RecurringTemplate,
    },
}

/// A scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EventRecord", into = "EventRecord")]
pub struct CalendarEvent {
    /// Opaque identifier, unique within a collection.
    pub id: String,
    pub summary: Option<String>,
    pub kind: EventKind,
}

impl CalendarEvent {
    pub fn timed(id: impl Into<String>, start: ZonedDateTime, end: ZonedDateTime) -> Self {
        Self {
            id: id.into(),
            summary: None,
            kind: EventKind::Timed(TimedSpan {
                start: Some(start),
                end: Some(end),
            }),
        }
    }

    pub fn all_day(id: impl Into<String>, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            kind: EventKind::AllDay(DateSpan {
                start: Some(start),
                end,
            }),
        }
    }

    pub fn recurring(
        id: impl Into<String>,
        rule: impl Into<String>,
        template: RecurringTemplate,
    ) -> Self {
        Self {
            id: id.into(),
            summary: None,
            kind: EventKind::Recurring {
                rule: rule.into(),
                template,
            },
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub const fn is_all_day(&self) -> bool {
        matches!(
            self.kind,
            EventKind::AllDay(_)
                | EventKind::Recurring {
                    template: RecurringTemplate::AllDay(_),
                    ..
                }
        )
    }

    pub const fn is_recurring(&self) -> bool {
        matches!(self.kind, EventKind::Recurring { .. })
    }

    /// Display label: the summary when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.id)
    }
}

/// Wire form of a start or end value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Wire form of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
}

fn zoned(value: Option<EventDateTime>) -> Option<ZonedDateTime> {
    let value = value?;
    Some(ZonedDateTime {
        date_time: value.date_time?,
        time_zone: value.time_zone,
    })
}

/// Reads `date`, falling back to the date part of `dateTime`.
fn calendar_date(value: Option<&EventDateTime>) -> Option<NaiveDate> {
    let value = value?;
    let raw = value.date.as_deref().or(value.date_time.as_deref())?.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn timed_span(start: Option<EventDateTime>, end: Option<EventDateTime>) -> TimedSpan {
    TimedSpan {
        start: zoned(start),
        end: zoned(end),
    }
}

fn date_span(start: Option<&EventDateTime>, end: Option<&EventDateTime>) -> DateSpan {
    DateSpan {
        start: calendar_date(start),
        end: calendar_date(end),
    }
}

impl From<EventRecord> for CalendarEvent {
    fn from(record: EventRecord) -> Self {
        let EventRecord {
            id,
            summary,
            is_all_day,
            is_recurring,
            recurrence_rule,
            start,
            end,
        } = record;

        let kind = if is_all_day {
            let span = date_span(start.as_ref(), end.as_ref());
            if is_recurring {
                EventKind::Recurring {
                    rule: recurrence_rule.unwrap_or_default(),
                    template: RecurringTemplate::AllDay(span),
                }
            } else {
                EventKind::AllDay(span)
            }
        } else {
            let span = timed_span(start, end);
            if is_recurring {
                EventKind::Recurring {
                    rule: recurrence_rule.unwrap_or_default(),
                    template: RecurringTemplate::Timed(span),
                }
            } else {
                EventKind::Timed(span)
            }
        };

        Self { id, summary, kind }
    }
}

impl From<ZonedDateTime> for EventDateTime {
    fn from(value: ZonedDateTime) -> Self {
        Self {
            date_time: Some(value.date_time),
            time_zone: value.time_zone,
            date: None,
        }
    }
}

fn date_value(date: Option<NaiveDate>) -> Option<EventDateTime> {
    date.map(|date| EventDateTime {
        date: Some(date.format("%Y-%m-%d").to_string()),
        ..EventDateTime::default()
    })
}

impl From<CalendarEvent> for EventRecord {
    fn from(event: CalendarEvent) -> Self {
        let mut record = Self {
            id: event.id,
            summary: event.summary,
            ..Self::default()
        };

        let (template, rule) = match event.kind {
            EventKind::Timed(span) => (RecurringTemplate::Timed(span), None),
            EventKind::AllDay(span) => (RecurringTemplate::AllDay(span), None),
            EventKind::Recurring { rule, template } => (template, Some(rule)),
        };

        if let Some(rule) = rule {
            record.is_recurring = true;
            record.recurrence_rule = Some(rule).filter(|rule| !rule.is_empty());
        }

        match template {
            RecurringTemplate::Timed(span) => {
                record.start = span.start.map(EventDateTime::from);
                record.end = span.end.map(EventDateTime::from);
            }
            RecurringTemplate::AllDay(span) => {
                record.is_all_day = true;
                record.start = date_value(span.start);
                record.end = date_value(span.end);
            }
        }

        record
    }
}
