//! Fare text parsing shared by the airline scrapers

use crate::{Error, Result};
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PRICE_RE: Regex = Regex::new(r"\d[\d,]*").unwrap();
    static ref NUMERIC_US_RE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap();
    static ref ISO_RE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap();
    static ref NAMED_RE: Regex =
        Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$").unwrap();
    static ref HEADING_RE: Regex = Regex::new(r"^([A-Za-z]+)\.?(?:,?\s+(\d{4}))?$").unwrap();
    static ref SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

const MONTHS: [&str; 12] = [
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

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// First run of digits in `text`, thousands separators allowed: `"$1,234"` is 1234
pub fn parse_price(text: &str) -> Result<u32> {
    let digits = PRICE_RE
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
        .ok_or_else(|| Error::parse("price", text))?;
    digits.parse().map_err(|_| Error::parse("price", text))
}

/// Parse a fare date as airline pages print it.
///
/// Accepts `12/21/2026`, `2026-12-21`, `Dec 21`, `December 21, 2026`, any of
/// them optionally preceded by a weekday (`Mon Dec 21`). Without a year the
/// date lands in whichever year puts it closest to `reference`.
pub fn parse_date(text: &str, reference: NaiveDate) -> Result<NaiveDate> {
    let cleaned = strip_weekday(text.trim());
    let fail = || Error::parse("date", text);

    if let Some(caps) = NUMERIC_US_RE.captures(&cleaned) {
        let (month, day, year) = (number(&caps[1])?, number(&caps[2])?, number(&caps[3])?);
        return NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(fail);
    }

    if let Some(caps) = ISO_RE.captures(&cleaned) {
        let (year, month, day) = (number(&caps[1])?, number(&caps[2])?, number(&caps[3])?);
        return NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(fail);
    }

    if let Some(caps) = NAMED_RE.captures(&cleaned) {
        let month = month_number(&caps[1]).ok_or_else(fail)?;
        let day = number(&caps[2])?;
        return match caps.get(3) {
            Some(year) => {
                NaiveDate::from_ymd_opt(number(year.as_str())? as i32, month, day).ok_or_else(fail)
            }
            None => nearest_year(month, day, reference).ok_or_else(fail),
        };
    }

    Err(fail())
}

/// First day of the month named by a calendar heading such as
/// `December 2026` or `Dec`; a missing year is resolved like [`parse_date`].
pub fn parse_month_heading(text: &str, reference: NaiveDate) -> Result<NaiveDate> {
    let cleaned = SPACE_RE.replace_all(text.trim(), " ");
    let fail = || Error::parse("month", text);
    let caps = HEADING_RE.captures(&cleaned).ok_or_else(fail)?;
    let month = month_number(&caps[1]).ok_or_else(fail)?;

    match caps.get(2) {
        Some(year) => NaiveDate::from_ymd_opt(number(year.as_str())? as i32, month, 1).ok_or_else(fail),
        None => nearest_year(month, 1, reference).ok_or_else(fail),
    }
}

fn number(digits: &str) -> Result<u32> {
    digits.parse().map_err(|_| Error::parse("number", digits))
}

fn strip_weekday(text: &str) -> String {
    let text = SPACE_RE.replace_all(text, " ").into_owned();
    match text.split_once(' ') {
        Some((first, rest)) if is_weekday(first) => rest.to_string(),
        _ => text,
    }
}

fn is_weekday(word: &str) -> bool {
    let word = word.trim_end_matches([',', '.']).to_lowercase();
    word.len() >= 3 && WEEKDAYS.iter().any(|day| *day == word || day[..3] == word)
}

/// 1-based month for a full name or three-letter abbreviation (`sept` too)
fn month_number(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    MONTHS
        .iter()
        .position(|name| *name == word || (word.len() >= 3 && name.starts_with(&word)))
        .map(|i| i as u32 + 1)
}

fn nearest_year(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    [reference.year() - 1, reference.year(), reference.year() + 1]
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .min_by_key(|date| (*date - reference).num_days().abs())
}
