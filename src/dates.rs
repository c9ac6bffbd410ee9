//! Date normalization for heterogeneous release-date strings.
//!
//! Release dates reach the dashboard as ISO dates, RFC 3339 timestamps,
//! free-form strings ("March 3rd, 2024") or sentinels meaning "unknown".
//! Everything normalizes to a local calendar day or `None`; nothing here
//! ever fails loudly.

use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Marker rendered wherever a date is absent.
pub const ABSENT_MARKER: &str = "—";

/// Display format for absolute dates, e.g. `Mar 20, 2024`.
pub const ABSOLUTE_FORMAT: &str = "%b %d, %Y";

const SENTINELS: [&str; 4] = ["none", "n/a", "-", ABSENT_MARKER];

/// Date-only layouts tried after the ISO extraction and RFC parsers.
const DATE_FORMATS: [&str; 10] = [
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%a, %b %d, %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%b. %d, %Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S", "%b %d, %Y %H:%M"];

static ISO_DATE_RE: OnceLock<Regex> = OnceLock::new();
static ORDINAL_RE: OnceLock<Regex> = OnceLock::new();

fn iso_date_re() -> &'static Regex {
    ISO_DATE_RE.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("ISO date pattern is valid")
    })
}

fn ordinal_re() -> &'static Regex {
    ORDINAL_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal pattern is valid")
    })
}

/// Whether a trimmed value is one of the "unknown" sentinels.
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || SENTINELS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
}

/// Normalize any date-like string to a local calendar day.
///
/// An embedded `YYYY-MM-DD` substring always wins over other parses, so
/// `"Release: 2024-03-20 (preorder)"` yields 2024-03-20. An ISO-looking
/// substring that is not a real calendar date yields `None`.
pub fn parse_any_date(input: &str) -> Option<NaiveDate> {
    if is_sentinel(input) {
        return None;
    }
    let trimmed = input.trim();

    if let Some(caps) = iso_date_re().captures(trimmed) {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let day = caps[3].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    parse_free_form(trimmed)
}

/// Same as [`parse_any_date`], treating a missing value as absent.
pub fn parse_opt(input: Option<&str>) -> Option<NaiveDate> {
    input.and_then(parse_any_date)
}

fn parse_free_form(input: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Local).date_naive());
    }

    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = ordinal_re().replace_all(&collapsed, "$1");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| parse_long_month(&cleaned))
}

/// `%b` only accepts three-letter abbreviations, so full month names
/// ("March 20, 2024", "20 March 2024") are shortened before a retry.
fn parse_long_month(input: &str) -> Option<NaiveDate> {
    let shortened = input
        .split(' ')
        .map(|word| {
            let bare = word.trim_end_matches([',', '.']);
            if bare.len() > 3 && bare.chars().all(|c| c.is_ascii_alphabetic()) {
                let suffix = &word[bare.len()..];
                format!("{}{}", &bare[..3], suffix)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if shortened == input {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&shortened, fmt).ok())
}

/// Whole calendar days from `today` to `date`.
///
/// Computed on calendar days rather than elapsed milliseconds, so a DST
/// transition between the two days never shifts the result.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Format a day as `Mar 20, 2024`.
pub fn format_absolute(date: NaiveDate) -> String {
    date.format(ABSOLUTE_FORMAT).to_string()
}

/// Format a day, or the absent marker.
pub fn format_absolute_or_marker(date: Option<NaiveDate>) -> String {
    date.map(format_absolute)
        .unwrap_or_else(|| ABSENT_MARKER.to_string())
}
