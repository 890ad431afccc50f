//! Canonical month values and month parsing
//!
//! Every ledger table, router extraction and metric is keyed by [`Month`],
//! a (year, month) pair with no day component.

use crate::error::CopilotError;
use crate::Result;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Alternation of month names and their accepted abbreviations
pub const MONTH_PATTERN: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|\
jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Year assumed by the fallback parser when the text carries none
const DEFAULT_YEAR: i32 = 2000;

/// Full-date layouts tried before the token fallback
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

fn numeric_regex() -> &'static Regex {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("numeric month regex is valid")
    })
}

fn named_regex() -> &'static Regex {
    static NAMED_RE: OnceLock<Regex> = OnceLock::new();
    NAMED_RE.get_or_init(|| {
        Regex::new(r"^(?i)([a-z]+)\.?,?\s+(\d{4})$").expect("named month regex is valid")
    })
}

/// A calendar month. Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Build a month, rejecting month numbers outside 1..=12
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(CopilotError::MonthParse(format!(
                "month number out of range: {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Truncate a date to its month
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Short human label, e.g. `Jun 2025`
    pub fn label(&self) -> String {
        let name = MONTH_NAMES[(self.month - 1) as usize];
        let mut short = name[..3].to_string();
        short[..1].make_ascii_uppercase();
        format!("{} {}", short, self.year)
    }

    /// Parse free text or a `YYYY-MM` / `YYYY/MM` string into a month.
    ///
    /// Accepted, in order: numeric year-month, month name (or abbreviation)
    /// followed by a 4-digit year, any full date layout in [`DATE_FORMATS`],
    /// and finally a token scan that defaults the year to 2000 and the month
    /// to January when the text leaves them out.
    pub fn parse(text: &str) -> Result<Self> {
        let s = text.trim();
        if s.is_empty() {
            return Err(CopilotError::MonthParse("empty month text".to_string()));
        }

        if let Some(caps) = numeric_regex().captures(s) {
            let year = caps[1].parse::<i32>().map_err(|e| {
                CopilotError::MonthParse(format!("invalid year in '{}': {}", s, e))
            })?;
            let month = caps[2].parse::<u32>().map_err(|e| {
                CopilotError::MonthParse(format!("invalid month in '{}': {}", s, e))
            })?;
            return Self::new(year, month);
        }

        if let Some(caps) = named_regex().captures(s) {
            if let Some(month) = month_from_name(&caps[1]) {
                let year = caps[2].parse::<i32>().map_err(|e| {
                    CopilotError::MonthParse(format!("invalid year in '{}': {}", s, e))
                })?;
                return Self::new(year, month);
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Ok(Self::from_date(date));
            }
        }

        parse_tokens(s)
    }
}

/// Anything the month parser accepts: a month already, a date, or text.
#[derive(Debug, Clone, Copy)]
pub enum MonthInput<'a> {
    Month(Month),
    Date(NaiveDate),
    Text(&'a str),
}

impl From<Month> for MonthInput<'_> {
    fn from(month: Month) -> Self {
        MonthInput::Month(month)
    }
}

impl From<NaiveDate> for MonthInput<'_> {
    fn from(date: NaiveDate) -> Self {
        MonthInput::Date(date)
    }
}

impl<'a> From<&'a str> for MonthInput<'a> {
    fn from(text: &'a str) -> Self {
        MonthInput::Text(text)
    }
}

/// Resolve any supported month reference to a canonical [`Month`]
pub fn parse_month<'a>(input: impl Into<MonthInput<'a>>) -> Result<Month> {
    match input.into() {
        MonthInput::Month(month) => Ok(month),
        MonthInput::Date(date) => Ok(Month::from_date(date)),
        MonthInput::Text(text) => Month::parse(text),
    }
}

/// Month number for a full name or abbreviation (`jun`, `sept`, `June`)
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    if lower == "sept" {
        return Some(9);
    }
    MONTH_NAMES
        .iter()
        .position(|full| *full == lower || full[..3] == lower)
        .map(|idx| idx as u32 + 1)
}

/// Last-resort scan: a month name, a 4-digit year and small numbers.
fn parse_tokens(s: &str) -> Result<Month> {
    let mut year = None;
    let mut month = None;
    let mut numbers = Vec::new();

    for token in s
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if let Some(m) = month_from_name(token) {
            month.get_or_insert(m);
        } else if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
            if year.is_none() {
                year = token.parse::<i32>().ok();
            }
        } else if let Ok(n) = token.parse::<u32>() {
            numbers.push(n);
        } else {
            return Err(CopilotError::MonthParse(format!(
                "unrecognised month text: '{}'",
                s
            )));
        }
    }

    if month.is_none() {
        month = numbers.iter().copied().find(|n| (1..=12).contains(n));
    }

    if year.is_none() && month.is_none() {
        return Err(CopilotError::MonthParse(format!(
            "unrecognised month text: '{}'",
            s
        )));
    }

    Month::new(year.unwrap_or(DEFAULT_YEAR), month.unwrap_or(1))
}

/// The `n` latest distinct months, ascending. Fewer when history is short.
pub fn last_n_distinct<I>(months: I, n: usize) -> Vec<Month>
where
    I: IntoIterator<Item = Month>,
{
    let distinct: BTreeSet<Month> = months.into_iter().collect();
    let skip = distinct.len().saturating_sub(n);
    distinct.into_iter().skip(skip).collect()
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self> {
        Month::parse(s)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Month::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(Month::parse("2025-06").unwrap(), ym(2025, 6));
        assert_eq!(Month::parse("2025/6").unwrap(), ym(2025, 6));
        assert_eq!(Month::parse(" 2023-09 ").unwrap(), ym(2023, 9));
        assert!(Month::parse("2025-13").is_err());
    }

    #[test]
    fn test_month_names() {
        assert_eq!(Month::parse("June 2025").unwrap(), ym(2025, 6));
        assert_eq!(Month::parse("jun 2025").unwrap(), ym(2025, 6));
        assert_eq!(Month::parse("SEPT 2024").unwrap(), ym(2024, 9));
        assert_eq!(Month::parse("Dec. 2023").unwrap(), ym(2023, 12));
    }

    #[test]
    fn test_full_dates_truncate() {
        assert_eq!(Month::parse("2025-06-15").unwrap(), ym(2025, 6));
        assert_eq!(Month::parse("03/31/2024").unwrap(), ym(2024, 3));
        assert_eq!(Month::parse("July 4, 2026").unwrap(), ym(2026, 7));
    }

    #[test]
    fn test_fallback_defaults() {
        assert_eq!(Month::parse("March").unwrap(), ym(2000, 3));
        assert_eq!(Month::parse("2024").unwrap(), ym(2024, 1));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Month::parse("").is_err());
        assert!(Month::parse("next quarter").is_err());
        assert!(matches!(
            Month::parse("banana"),
            Err(CopilotError::MonthParse(_))
        ));
    }

    #[test]
    fn test_parse_month_inputs() {
        let m = ym(2025, 6);
        assert_eq!(parse_month(m).unwrap(), m);
        let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(parse_month(date).unwrap(), m);
        assert_eq!(parse_month("June 2025").unwrap(), m);
    }

    #[test]
    fn test_ordering_and_display() {
        assert!(ym(2024, 12) < ym(2025, 1));
        assert_eq!(ym(2025, 6).to_string(), "2025-06");
        assert_eq!(ym(2025, 6).label(), "Jun 2025");
        assert_eq!(ym(2025, 6).first_day(), NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn test_last_n_distinct() {
        let months = vec![ym(2025, 3), ym(2025, 1), ym(2025, 3), ym(2025, 2), ym(2024, 12)];
        assert_eq!(
            last_n_distinct(months.clone(), 3),
            vec![ym(2025, 1), ym(2025, 2), ym(2025, 3)]
        );
        assert_eq!(last_n_distinct(months, 10).len(), 4);
        assert!(last_n_distinct(Vec::new(), 3).is_empty());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ym(2025, 6)).unwrap();
        assert_eq!(json, "\"2025-06\"");
        let back: Month = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym(2025, 6));
    }
}
