//! Date normalization for resume entries.
//!
//! Everything the model returns is rewritten to `Mon YYYY`, `Present`, or
//! `Mon YYYY - Mon YYYY`. A bare year stays a bare year; strings we cannot read
//! are left exactly as they came in.

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::schema::ResumeSection;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const PRESENT_WORDS: [&str; 6] = ["present", "current", "now", "ongoing", "to date", "till date"];

/// Entry keys rewritten in every sequence section.
const DATE_KEYS: [&str; 4] = ["start_date", "end_date", "date", "dates"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthYear {
    pub year: i32,
    /// 1-based.
    pub month: u32,
}

impl MonthYear {
    fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePoint {
    Month(MonthYear),
    Year(i32),
    Present,
}

impl DatePoint {
    fn render(self) -> String {
        match self {
            DatePoint::Month(my) => format!("{} {}", MONTH_ABBR[(my.month - 1) as usize], my.year),
            DatePoint::Year(y) => y.to_string(),
            DatePoint::Present => "Present".to_string(),
        }
    }
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s.parse().ok()?;
    (1900..=2100).contains(&year).then_some(year)
}

fn parse_month_number(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let month: u32 = s.parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

fn parse_day(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let day: u32 = s.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

fn month_from_word(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    if word.len() < 3 || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&word))
        .map(|i| i as u32 + 1)
}

/// Parses a single point in time (not a range).
pub fn parse_point(input: &str) -> Option<DatePoint> {
    let s = input.trim().trim_end_matches(['.', ',']).trim();
    if s.is_empty() {
        return None;
    }
    let lower = s.to_lowercase();
    if PRESENT_WORDS.contains(&lower.as_str()) {
        return Some(DatePoint::Present);
    }
    if let Some(year) = parse_year(s) {
        return Some(DatePoint::Year(year));
    }

    // YYYY-MM or YYYY-MM-DD
    let dashed: Vec<&str> = s.split('-').collect();
    if (2..=3).contains(&dashed.len()) && dashed.get(2).map_or(true, |d| parse_day(d).is_some()) {
        if let (Some(year), Some(month)) = (parse_year(dashed[0]), parse_month_number(dashed[1])) {
            return Some(DatePoint::Month(MonthYear { year, month }));
        }
    }

    // MM/YYYY or MM/DD/YYYY
    let slashed: Vec<&str> = s.split('/').collect();
    if (2..=3).contains(&slashed.len()) {
        let year = slashed.last().and_then(|y| parse_year(y));
        if let (Some(year), Some(month)) = (year, parse_month_number(slashed[0])) {
            return Some(DatePoint::Month(MonthYear { year, month }));
        }
    }

    // "January 2022", "Jan. 2022", "Sept, 2022"
    let cleaned = s.replace([',', '.'], " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() == 2 {
        if let (Some(month), Some(year)) = (month_from_word(words[0]), parse_year(words[1])) {
            return Some(DatePoint::Month(MonthYear { year, month }));
        }
    }

    None
}

fn split_range(s: &str) -> Option<(&str, &str)> {
    for sep in [" - ", " – ", " — ", " to ", " To ", " TO ", "–", "—"] {
        if let Some((start, end)) = s.split_once(sep) {
            return Some((start, end));
        }
    }
    // A bare hyphen is a range only where both sides read as dates:
    // "2019-2021" and "2019-04-Present" split, "2019-04" does not.
    s.match_indices('-')
        .map(|(i, _)| (&s[..i], &s[i + 1..]))
        .find(|(start, end)| parse_point(start).is_some() && parse_point(end).is_some())
}

/// Normalizes a date or date range. `None` when the input is not recognizable.
pub fn normalize_date(input: &str) -> Option<String> {
    if let Some((start, end)) = split_range(input) {
        let (start, end) = (parse_point(start)?, parse_point(end)?);
        return Some(format!("{} - {}", start.render(), end.render()));
    }
    parse_point(input).map(DatePoint::render)
}

/// Inclusive month span between `start` and `end` (today when absent or "Present"),
/// rendered as "2 yrs 3 mos". Requires month precision on both ends.
pub fn compute_duration(start: &str, end: Option<&str>, today: NaiveDate) -> Option<String> {
    let start = match parse_point(start)? {
        DatePoint::Month(my) => my,
        _ => return None,
    };
    let now = MonthYear {
        year: today.year(),
        month: today.month(),
    };
    let end = match end.map(str::trim).filter(|e| !e.is_empty()) {
        None => now,
        Some(e) => match parse_point(e)? {
            DatePoint::Month(my) => my,
            DatePoint::Present => now,
            DatePoint::Year(_) => return None,
        },
    };
    if end < start {
        return None;
    }

    let months = end.ordinal() - start.ordinal() + 1;
    let (years, rem) = (months / 12, months % 12);
    let mut parts = Vec::new();
    if years > 0 {
        parts.push(format!("{years} {}", if years == 1 { "yr" } else { "yrs" }));
    }
    if rem > 0 {
        parts.push(format!("{rem} {}", if rem == 1 { "mo" } else { "mos" }));
    }
    Some(parts.join(" "))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Rewrites dates in every sequence section and fills missing experience durations.
pub fn normalize_sections(content: &mut Map<String, Value>, today: NaiveDate) {
    for section in ResumeSection::SEQUENCES {
        let Some(Value::Array(entries)) = content.get_mut(section.key()) else {
            continue;
        };
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            for key in DATE_KEYS {
                let normalized = entry
                    .get(key)
                    .and_then(Value::as_str)
                    .and_then(normalize_date);
                if let Some(normalized) = normalized {
                    entry.insert(key.to_string(), Value::String(normalized));
                }
            }

            if section != ResumeSection::Experience || !is_blank(entry.get("duration")) {
                continue;
            }
            let start = entry.get("start_date").and_then(Value::as_str);
            let end = entry.get("end_date").and_then(Value::as_str);
            let duration = start.and_then(|s| compute_duration(s, end, today));
            if let Some(duration) = duration {
                entry.insert("duration".to_string(), Value::String(duration));
            }
        }
    }
}
