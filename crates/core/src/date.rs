use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical textual layout of a [`NormalizedDate`].
pub const CANONICAL_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDateError {
    #[error("Expected DD/MM/YYYY, got '{0}'")]
    Shape(String),
    #[error("Not a calendar date: '{0}'")]
    Calendar(String),
}

/// A calendar date rendered as `DD/MM/YYYY`.
///
/// Only constructible from a valid calendar date with a four-digit year, so
/// every value formats to exactly ten characters. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedDate(NaiveDate);

impl NormalizedDate {
    /// Validate a day/month/year triple. Returns `None` for anything the
    /// calendar rejects (31 Feb, month 13, day 0) or a year outside 1..=9999.
    pub fn from_dmy(day: u32, month: u32, year: i32) -> Option<Self> {
        if !(1..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(NormalizedDate)
    }

    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        Self::from_dmy(date.day(), date.month(), date.year())
    }

    pub fn as_naive(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for NormalizedDate {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        let shaped = b.len() == 10
            && b[2] == b'/'
            && b[5] == b'/'
            && b.iter()
                .enumerate()
                .all(|(i, c)| i == 2 || i == 5 || c.is_ascii_digit());
        if !shaped {
            return Err(ParseDateError::Shape(s.to_string()));
        }
        let date = NaiveDate::parse_from_str(s, CANONICAL_FORMAT)
            .map_err(|_| ParseDateError::Calendar(s.to_string()))?;
        Self::from_naive(date).ok_or_else(|| ParseDateError::Calendar(s.to_string()))
    }
}

impl Serialize for NormalizedDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NormalizedDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Expand a two-digit year with the POSIX `%y` pivot: 00–68 → 20xx, 69–99 → 19xx.
pub fn expand_two_digit_year(yy: u32) -> i32 {
    let yy = yy as i32;
    if yy < 69 { 2000 + yy } else { 1900 + yy }
}

/// JAN..DEC, case-insensitive.
pub fn month_abbr_to_num(abbr: &str) -> Option<u32> {
    match abbr.to_ascii_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
