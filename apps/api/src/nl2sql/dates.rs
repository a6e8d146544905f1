//! Russian date phrases: single dates, `с … по …` ranges and whole months.
//!
//! The parser never reads a clock. The year used for phrases without one is passed in
//! by the caller.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// Genitive month names, as used after a day number ("28 ноября").
const MONTHS_GENITIVE: [(&str, u32); 12] = [
    ("января", 1),
    ("февраля", 2),
    ("марта", 3),
    ("апреля", 4),
    ("мая", 5),
    ("июня", 6),
    ("июля", 7),
    ("августа", 8),
    ("сентября", 9),
    ("октября", 10),
    ("ноября", 11),
    ("декабря", 12),
];

const MONTH_ABBREVIATIONS: &[(&str, u32)] = &[
    ("янв", 1),
    ("фев", 2),
    ("мар", 3),
    ("апр", 4),
    ("июн", 6),
    ("июл", 7),
    ("авг", 8),
    ("сен", 9),
    ("сент", 9),
    ("окт", 10),
    ("ноя", 11),
    ("дек", 12),
];

/// Nominative and prepositional forms, as used in "за ноябрь" / "в ноябре".
const MONTHS_STANDALONE: &[(&str, u32)] = &[
    ("январь", 1),
    ("январе", 1),
    ("февраль", 2),
    ("феврале", 2),
    ("март", 3),
    ("марте", 3),
    ("апрель", 4),
    ("апреле", 4),
    ("май", 5),
    ("мае", 5),
    ("июнь", 6),
    ("июне", 6),
    ("июль", 7),
    ("июле", 7),
    ("август", 8),
    ("августе", 8),
    ("сентябрь", 9),
    ("сентябре", 9),
    ("октябрь", 10),
    ("октябре", 10),
    ("ноябрь", 11),
    ("ноябре", 11),
    ("декабрь", 12),
    ("декабре", 12),
];

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^а-яa-z0-9])с\s+(\d{1,2})(?:\s+([а-я]+)\.?)?(?:\s+(\d{4}))?(?:\s*(?:года|г)\.?)?\s+(?:по|до)\s+(\d{1,2})\s+([а-я]+)\.?(?:\s+(\d{4}))?",
    )
    .expect("range pattern is valid")
});

static SINGLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9.])(\d{1,2})\s+([а-я]+)\.?(?:\s+(\d{4}))?")
        .expect("single date pattern is valid")
});

static MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^а-яa-z0-9])(?:в|во|за)\s+([а-я]+)(?:\s+(\d{4}))?")
        .expect("month pattern is valid")
});

/// An inclusive calendar range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Midnight UTC of the first day.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC of the day after the last day.
    pub fn end_exclusive_utc(&self) -> DateTime<Utc> {
        (self.end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    /// No date phrase in the text. The question is not restricted by date.
    Absent,
    Date(NaiveDate),
    Range(DateRange),
    /// A date phrase was found but does not name a real date or an ordered range.
    Malformed(String),
}

impl DateOutcome {
    /// The period to filter by; a single date becomes a one-day range.
    pub fn period(&self) -> Option<DateRange> {
        match self {
            DateOutcome::Date(day) => Some(DateRange::single(*day)),
            DateOutcome::Range(range) => Some(*range),
            DateOutcome::Absent | DateOutcome::Malformed(_) => None,
        }
    }
}

/// Extracts a date or date range from normalized text.
///
/// Precedence: an explicit `с … по …` range, then the first `<day> <month>` date, then a
/// whole month (`за ноябрь 2025`).
pub fn extract_date(text: &str, current_year: i32) -> DateOutcome {
    if let Some(outcome) = find_range(text, current_year) {
        return outcome;
    }
    if let Some(outcome) = find_single(text, current_year) {
        return outcome;
    }
    if let Some(outcome) = find_month(text, current_year) {
        return outcome;
    }
    DateOutcome::Absent
}

fn find_range(text: &str, current_year: i32) -> Option<DateOutcome> {
    for caps in RANGE_RE.captures_iter(text) {
        let Some(end_month) = genitive_month(&caps[5]) else {
            continue;
        };
        let start_month = match caps.get(2) {
            Some(m) => match genitive_month(m.as_str()) {
                Some(month) => month,
                None => continue,
            },
            None => end_month,
        };

        let start_year_raw = year_at(&caps, 3);
        let end_year = year_at(&caps, 6)
            .or(start_year_raw)
            .unwrap_or(current_year);
        let start_year = start_year_raw.unwrap_or(end_year);

        let Some(start) = make_date(start_year, start_month, &caps[1]) else {
            return Some(malformed(format!(
                "invalid range start: {} {}",
                &caps[1],
                caps.get(2).map_or(&caps[5], |m| m.as_str())
            )));
        };
        let Some(end) = make_date(end_year, end_month, &caps[4]) else {
            return Some(malformed(format!(
                "invalid range end: {} {}",
                &caps[4], &caps[5]
            )));
        };

        return Some(match DateRange::new(start, end) {
            Some(range) => DateOutcome::Range(range),
            None => malformed(format!("range start {start} is after end {end}")),
        });
    }
    None
}

fn find_single(text: &str, current_year: i32) -> Option<DateOutcome> {
    for caps in SINGLE_RE.captures_iter(text) {
        let Some(month) = genitive_month(&caps[2]) else {
            continue;
        };
        let year = year_at(&caps, 3).unwrap_or(current_year);
        return Some(match make_date(year, month, &caps[1]) {
            Some(day) => DateOutcome::Date(day),
            None => malformed(format!("invalid date: {} {} {year}", &caps[1], &caps[2])),
        });
    }
    None
}

fn find_month(text: &str, current_year: i32) -> Option<DateOutcome> {
    for caps in MONTH_RE.captures_iter(text) {
        let Some(month) = lookup(MONTHS_STANDALONE, &caps[1]) else {
            continue;
        };
        let year = year_at(&caps, 2).unwrap_or(current_year);
        return Some(match month_range(year, month) {
            Some(range) => DateOutcome::Range(range),
            None => malformed(format!("invalid month: {} {year}", &caps[1])),
        });
    }
    None
}

fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    DateRange::new(start, next.pred_opt()?)
}

fn genitive_month(word: &str) -> Option<u32> {
    lookup(&MONTHS_GENITIVE, word).or_else(|| lookup(MONTH_ABBREVIATIONS, word))
}

fn lookup(table: &[(&str, u32)], word: &str) -> Option<u32> {
    table
        .iter()
        .find(|(name, _)| *name == word)
        .map(|&(_, month)| month)
}

fn year_at(caps: &Captures<'_>, index: usize) -> Option<i32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn make_date(year: i32, month: u32, day: &str) -> Option<NaiveDate> {
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn malformed(reason: String) -> DateOutcome {
    DateOutcome::Malformed(reason)
}
