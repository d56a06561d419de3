//! Recurrence rule grammar.
//!
//! Only a small subset of RRULE is understood:
//! `FREQ=<DAILY|WEEKLY>[;BYDAY=<two-letter weekday codes>]`.
//! Keys and values are case-insensitive and whitespace around separators is ignored.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How often a recurring event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    /// A syntactically valid frequency this engine does not expand (e.g. `MONTHLY`).
    Unsupported(String),
}

impl Frequency {
    fn from_value(value: &str) -> Self {
        let upper = value.to_ascii_uppercase();
        match upper.as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            name if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()) => {
                Self::Unsupported(upper)
            }
            _ => Self::Weekly,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Unsupported(name) => name,
        }
    }
}

/// Set of weekdays, numbered 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, weekday: Weekday) {
        self.0 |= 1 << weekday.num_days_from_sunday();
    }

    pub fn contains(self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Weekdays in the set, Sunday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEKDAY_CODES
            .iter()
            .map(|(_, weekday)| *weekday)
            .filter(move |weekday| self.contains(*weekday))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for weekday in iter {
            set.insert(weekday);
        }
        set
    }
}

const WEEKDAY_CODES: [(&str, Weekday); 7] = [
    ("SU", Weekday::Sun),
    ("MO", Weekday::Mon),
    ("TU", Weekday::Tue),
    ("WE", Weekday::Wed),
    ("TH", Weekday::Thu),
    ("FR", Weekday::Fri),
    ("SA", Weekday::Sat),
];

fn weekday_from_code(code: &str) -> Option<Weekday> {
    WEEKDAY_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(code))
        .map(|(_, weekday)| *weekday)
}

fn weekday_code(weekday: Weekday) -> &'static str {
    WEEKDAY_CODES[weekday.num_days_from_sunday() as usize].0
}

/// Structured form of a recurrence rule string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub by_day: WeekdaySet,
}

impl Default for RecurrencePattern {
    fn default() -> Self {
        Self {
            frequency: Frequency::Weekly,
            by_day: WeekdaySet::EMPTY,
        }
    }
}

impl RecurrencePattern {
    /// Parses a rule string. Never fails: missing or malformed parts fall back to defaults.
    ///
    /// - `FREQ` defaults to `WEEKLY` when absent or malformed.
    /// - Unknown `BYDAY` codes are dropped.
    /// - Other keys are ignored.
    pub fn parse(rule: &str) -> Self {
        let mut pattern = Self::default();
        let rule = rule.trim();
        let rule = match rule.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &rule[6..],
            _ => rule,
        };

        for part in rule.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => pattern.frequency = Frequency::from_value(value),
                "BYDAY" => {
                    pattern.by_day = value
                        .split(',')
                        .filter_map(|code| weekday_from_code(code.trim()))
                        .collect();
                }
                _ => {}
            }
        }

        pattern
    }

    /// Whether an occurrence falls on the given weekday.
    ///
    /// `WEEKLY` with no `BYDAY` list repeats every day. Unsupported frequencies never occur.
    pub fn occurs_on(&self, weekday: Weekday) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => self.by_day.is_empty() || self.by_day.contains(weekday),
            Frequency::Unsupported(_) => false,
        }
    }

    pub fn occurs_on_date(&self, date: NaiveDate) -> bool {
        self.occurs_on(date.weekday())
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency.as_str())?;
        if !self.by_day.is_empty() {
            let codes: Vec<&str> = self.by_day.iter().map(weekday_code).collect();
            write!(f, ";BYDAY={}", codes.join(","))?;
        }
        Ok(())
    }
}
