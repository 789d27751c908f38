use std::sync::LazyLock;

use jiff::Span;
use jiff::civil::{Date, DateTime};
use regex::Regex;
use thiserror::Error;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full and abbreviated month names. Lookup is case-sensitive.
const MONTH_LOOKUP: [(&str, i8); 24] = [
    ("January", 1),
    ("February", 2),
    ("March", 3),
    ("April", 4),
    ("May", 5),
    ("June", 6),
    ("July", 7),
    ("August", 8),
    ("September", 9),
    ("October", 10),
    ("November", 11),
    ("December", 12),
    ("Jan", 1),
    ("Feb", 2),
    ("Mar", 3),
    ("Apr", 4),
    ("Jun", 6),
    ("Jul", 7),
    ("Aug", 8),
    ("Sep", 9),
    ("Sept", 9),
    ("Oct", 10),
    ("Nov", 11),
    ("Dec", 12),
];

/// Month used when a name or index is not recognized.
///
/// Unknown input silently becomes January. This keeps compatibility with
/// records already produced by the spreadsheet importers.
pub const FALLBACK_MONTH: i8 = 1;

/// Spreadsheet serial day number of 1970-01-01 (serial 0 is 1899-12-30,
/// which absorbs the 1900 leap-year bug of spreadsheet software).
pub const SERIAL_UNIX_EPOCH: i64 = 25569;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("ISO date pattern is valid"));

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid date format: '{0}'")]
    InvalidDateFormat(String),
}

/// A month as it appears in a source cell
#[derive(Debug, Clone, PartialEq)]
pub enum MonthValue {
    /// Text cell; numeric text such as "3" is read as an index
    Name(String),
    /// Numeric cell
    Index(i64),
    Missing,
}

/// The shapes a final or internal deadline arrives in
#[derive(Debug, Clone, PartialEq)]
pub enum DeadlineInput {
    /// Month and day without a year: anchored to the next occurrence
    MonthDay { month: MonthValue, day: Option<i64> },
    /// `M/D/YYYY`, year taken literally
    FullDate(String),
    /// Spreadsheet serial date number
    Serial(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDeadline {
    pub month_name: String,
    pub day: i8,
    pub date: Date,
}

impl NormalizedDeadline {
    fn from_date(date: Date) -> Self {
        Self {
            month_name: month_name(date.month()).to_string(),
            day: date.day(),
            date,
        }
    }

    /// `YYYY-MM-DD`
    pub fn iso_date(&self) -> String {
        self.date.to_string()
    }
}

/// Resolves a deadline input to a month name, day and calendar date.
///
/// `now` is the caller's local wall-clock time. A month/day whose date (at
/// midnight) is before `now` is moved to the following year, so a deadline
/// falling on today already counts as the next occurrence. February 29
/// lands on the next leap year.
pub fn normalize(input: &DeadlineInput, now: DateTime) -> Result<NormalizedDeadline, NormalizeError> {
    match input {
        DeadlineInput::MonthDay { month, day } => {
            let month = resolve_month(month);
            let day = resolve_day(*day);
            let raw = format!("{}/{}", month, day);

            next_occurrence(month, day, now)
                .map(NormalizedDeadline::from_date)
                .ok_or(NormalizeError::InvalidDateFormat(raw))
        }
        DeadlineInput::FullDate(raw) => parse_full_date(raw).map(NormalizedDeadline::from_date),
        DeadlineInput::Serial(serial) => from_serial(*serial).map(NormalizedDeadline::from_date),
    }
}

pub fn month_name(month: i8) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or(MONTH_NAMES[0])
}

/// Month number for a full or abbreviated English name, falling back to
/// January for anything unrecognized.
pub fn month_from_name(name: &str) -> i8 {
    MONTH_LOOKUP
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, month)| *month)
        .unwrap_or(FALLBACK_MONTH)
}

fn resolve_month(value: &MonthValue) -> i8 {
    match value {
        MonthValue::Name(name) => {
            let name = name.trim();
            match name.parse::<i64>() {
                Ok(index) => month_from_index(index),
                Err(_) => month_from_name(name),
            }
        }
        MonthValue::Index(index) => month_from_index(*index),
        MonthValue::Missing => FALLBACK_MONTH,
    }
}

fn month_from_index(index: i64) -> i8 {
    if (1..=12).contains(&index) {
        index as i8
    } else {
        FALLBACK_MONTH
    }
}

/// Missing or zero days become the 1st
fn resolve_day(day: Option<i64>) -> i64 {
    match day {
        None | Some(0) => 1,
        Some(day) => day,
    }
}

/// Leap days recur at most eight years apart (e.g. 2096 to 2104)
const MAX_YEARS_AHEAD: i64 = 8;

/// First date on or after `now`'s day with this month and day
fn next_occurrence(month: i8, day: i64, now: DateTime) -> Option<Date> {
    let this_year = now.year() as i64;

    (this_year..=this_year + MAX_YEARS_AHEAD)
        .filter_map(|year| calendar_date(year, month as i64, day, "").ok())
        .find(|date| date.at(0, 0, 0, 0) >= now)
}

fn calendar_date(year: i64, month: i64, day: i64, raw: &str) -> Result<Date, NormalizeError> {
    let invalid = || NormalizeError::InvalidDateFormat(raw.to_string());

    let year = i16::try_from(year).map_err(|_| invalid())?;
    let month = i8::try_from(month).map_err(|_| invalid())?;
    let day = i8::try_from(day).map_err(|_| invalid())?;

    Date::new(year, month, day).map_err(|_| invalid())
}

/// Parses `M/D/YYYY` without applying any year rollover
pub fn parse_full_date(raw: &str) -> Result<Date, NormalizeError> {
    let invalid = || NormalizeError::InvalidDateFormat(raw.to_string());

    let parts = raw
        .trim()
        .split('/')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let [month, day, year] = parts[..] else {
        return Err(invalid());
    };

    calendar_date(year, month, day, raw)
}

/// Converts a spreadsheet serial date number, ignoring any time fraction
pub fn from_serial(serial: f64) -> Result<Date, NormalizeError> {
    let invalid = || NormalizeError::InvalidDateFormat(serial.to_string());

    if !serial.is_finite() {
        return Err(invalid());
    }

    let days = serial.floor() as i64 - SERIAL_UNIX_EPOCH;
    Span::new()
        .try_days(days)
        .and_then(|span| jiff::civil::date(1970, 1, 1).checked_add(span))
        .map_err(|_| invalid())
}

/// Parses a stored `YYYY-MM-DD` string, rejecting other layouts and dates
/// that do not exist on the calendar.
pub fn parse_iso_date(value: &str) -> Option<Date> {
    if !is_iso_date_layout(value) {
        return None;
    }
    value.parse().ok()
}

pub fn is_iso_date_layout(value: &str) -> bool {
    ISO_DATE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn june_first() -> DateTime {
        date(2026, 6, 1).at(12, 0, 0, 0)
    }

    fn month_day(month: MonthValue, day: i64) -> DeadlineInput {
        DeadlineInput::MonthDay {
            month,
            day: Some(day),
        }
    }

    #[test]
    fn test_full_and_abbreviated_month_names() {
        assert_eq!(month_from_name("March"), 3);
        assert_eq!(month_from_name("Sept"), 9);
        assert_eq!(month_from_name("Sep"), 9);
        assert_eq!(month_from_name("Dec"), 12);
    }

    #[test]
    fn test_unrecognized_month_name_defaults_to_january() {
        assert_eq!(month_from_name("march"), FALLBACK_MONTH);
        assert_eq!(month_from_name("Mayo"), FALLBACK_MONTH);
        assert_eq!(month_from_name(""), FALLBACK_MONTH);

        let result = normalize(&month_day(MonthValue::Name("Smarch".into()), 20), june_first()).unwrap();
        assert_eq!(result.month_name, "January");
        assert_eq!(result.iso_date(), "2027-01-20");
    }

    #[test]
    fn test_numeric_month_text_is_an_index() {
        let result = normalize(&month_day(MonthValue::Name("9".into()), 15), june_first()).unwrap();
        assert_eq!(result.month_name, "September");
        assert_eq!(result.day, 15);
        assert_eq!(result.iso_date(), "2026-09-15");
    }

    #[test]
    fn test_out_of_range_index_defaults_to_january() {
        let result = normalize(&month_day(MonthValue::Index(13), 2), june_first()).unwrap();
        assert_eq!(result.month_name, "January");
    }

    #[test]
    fn test_past_month_day_rolls_to_next_year() {
        let result = normalize(&month_day(MonthValue::Name("March".into()), 15), june_first()).unwrap();
        assert_eq!(result.iso_date(), "2027-03-15");
        assert_eq!(result.month_name, "March");
    }

    #[test]
    fn test_future_month_day_stays_in_current_year() {
        let result = normalize(&month_day(MonthValue::Index(11), 30), june_first()).unwrap();
        assert_eq!(result.iso_date(), "2026-11-30");
    }

    #[test]
    fn test_deadline_today_counts_as_passed() {
        let result = normalize(&month_day(MonthValue::Name("June".into()), 1), june_first()).unwrap();
        assert_eq!(result.iso_date(), "2027-06-01");

        let at_midnight = date(2026, 6, 1).at(0, 0, 0, 0);
        let result = normalize(&month_day(MonthValue::Name("June".into()), 1), at_midnight).unwrap();
        assert_eq!(result.iso_date(), "2026-06-01");
    }

    #[test]
    fn test_leap_day_moves_to_next_leap_year() {
        let leap_day = month_day(MonthValue::Name("February".into()), 29);

        let result = normalize(&leap_day, date(2026, 10, 19).at(9, 0, 0, 0)).unwrap();
        assert_eq!(result.iso_date(), "2028-02-29");
        assert_eq!(result.month_name, "February");
        assert_eq!(result.day, 29);

        let result = normalize(&leap_day, date(2028, 1, 10).at(9, 0, 0, 0)).unwrap();
        assert_eq!(result.iso_date(), "2028-02-29");

        let result = normalize(&leap_day, date(2028, 3, 1).at(9, 0, 0, 0)).unwrap();
        assert_eq!(result.iso_date(), "2032-02-29");

        let result = normalize(&leap_day, date(2097, 6, 1).at(9, 0, 0, 0)).unwrap();
        assert_eq!(result.iso_date(), "2104-02-29");
    }

    #[test]
    fn test_missing_day_defaults_to_first() {
        let input = DeadlineInput::MonthDay {
            month: MonthValue::Name("August".into()),
            day: None,
        };
        assert_eq!(normalize(&input, june_first()).unwrap().iso_date(), "2026-08-01");
    }

    #[test]
    fn test_day_outside_month_is_rejected() {
        let result = normalize(&month_day(MonthValue::Name("February".into()), 30), june_first());
        assert!(matches!(result, Err(NormalizeError::InvalidDateFormat(_))));
    }

    #[test]
    fn test_full_date_is_taken_literally() {
        for (raw, expected) in [
            ("3/15/2020", "2020-03-15"),
            ("12/1/2031", "2031-12-01"),
            (" 1/31/2026 ", "2026-01-31"),
        ] {
            let result = normalize(&DeadlineInput::FullDate(raw.into()), june_first()).unwrap();
            assert_eq!(result.iso_date(), expected, "input {raw}");
        }

        let result = normalize(&DeadlineInput::FullDate("2/29/2024".into()), june_first()).unwrap();
        assert_eq!(result.month_name, "February");
        assert_eq!(result.day, 29);
    }

    #[test]
    fn test_full_date_rejects_bad_shapes() {
        for raw in ["3/15", "3/15/2026/1", "March/15/2026", "", "2026-03-15", "2/30/2026"] {
            let result = normalize(&DeadlineInput::FullDate(raw.into()), june_first());
            assert_eq!(
                result,
                Err(NormalizeError::InvalidDateFormat(raw.to_string())),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(from_serial(45366.0).unwrap(), date(2024, 3, 15));
        assert_eq!(from_serial(45366.75).unwrap(), date(2024, 3, 15));
        assert_eq!(from_serial(25569.0).unwrap(), date(1970, 1, 1));
        assert!(from_serial(f64::NAN).is_err());

        let result = normalize(&DeadlineInput::Serial(45366.0), june_first()).unwrap();
        assert_eq!(result.month_name, "March");
        assert_eq!(result.iso_date(), "2024-03-15");
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2026-10-08"), Some(date(2026, 10, 8)));
        assert_eq!(parse_iso_date("2026-02-30"), None);
        assert_eq!(parse_iso_date("2026-1-08"), None);
        assert_eq!(parse_iso_date("10/08/2026"), None);
    }
}
