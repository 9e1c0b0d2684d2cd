use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Maximum length of a category token, matching the `varchar(100)` column.
pub const MAX_CATEGORY_LEN: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("Invalid category: {0:?}")]
    InvalidCategory(String),

    #[error("Unknown month name: {0:?}")]
    UnknownMonthName(String),

    #[error("Invalid year: {0:?}")]
    InvalidYear(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid month table: {0}")]
pub struct MonthTableError(pub String);

/// Parse free-form date text into a calendar date.
///
/// All digit runs are extracted and read as `day.month.year`, so
/// "15.03.2024", "15/3/2024" and "15 03 2024" all resolve to the same day.
/// The year must be written with four digits.
pub fn normalize_date(text: &str) -> Result<NaiveDate, NormalizeError> {
    let invalid = || NormalizeError::InvalidDate(text.to_string());

    let runs = digit_runs(text);
    let [day, month, year] = runs.as_slice() else {
        return Err(invalid());
    };
    if day.len() > 2 || month.len() > 2 || year.len() != 4 {
        return Err(invalid());
    }

    let joined = format!("{}.{}.{}", day, month, year);
    NaiveDate::parse_from_str(&joined, "%d.%m.%Y").map_err(|_| invalid())
}

/// Extract the first word out of free-form text and lower-case it.
pub fn normalize_category(text: &str) -> Result<String, NormalizeError> {
    let word = word_runs(text)
        .into_iter()
        .next()
        .ok_or_else(|| NormalizeError::InvalidCategory(text.to_string()))?;

    let category = word.to_lowercase();
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(NormalizeError::InvalidCategory(text.to_string()));
    }
    Ok(category)
}

/// Parse "<month-name> <year>" into the first day of that month.
pub fn normalize_month_year(text: &str, months: &MonthNames) -> Result<NaiveDate, NormalizeError> {
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let name = tokens
        .first()
        .ok_or_else(|| NormalizeError::UnknownMonthName(text.to_string()))?;
    let month = months
        .month_number(name)
        .ok_or_else(|| NormalizeError::UnknownMonthName(name.to_string()))?;

    let year_token = tokens
        .get(1)
        .ok_or_else(|| NormalizeError::InvalidYear(text.to_string()))?;
    if year_token.len() != 4 || !year_token.chars().all(|c| c.is_ascii_digit()) {
        return Err(NormalizeError::InvalidYear(year_token.to_string()));
    }
    let year: i32 = year_token
        .parse()
        .map_err(|_| NormalizeError::InvalidYear(year_token.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| NormalizeError::InvalidYear(year_token.to_string()))
}

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day0(0).unwrap_or(date)
}

fn digit_runs(text: &str) -> Vec<&str> {
    runs_by(text, |c| c.is_ascii_digit())
}

fn word_runs(text: &str) -> Vec<&str> {
    runs_by(text, |c| c.is_alphanumeric() || c == '_')
}

fn runs_by(text: &str, matches: impl Fn(char) -> bool) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = None;

    for (idx, c) in text.char_indices() {
        match (matches(c), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                runs.push(&text[s..idx]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(&text[s..]);
    }

    runs
}

/// Lookup table from month names in the ledger's working language to
/// month numbers (1..=12).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthNames {
    names: HashMap<String, u32>,
}

impl MonthNames {
    /// Build a table from explicit name/number pairs.
    ///
    /// Every month 1..=12 must be covered and no number may fall outside
    /// that range. Names are matched case-insensitively.
    pub fn new<I, S>(pairs: I) -> Result<Self, MonthTableError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut names = HashMap::new();
        for (name, number) in pairs {
            let name = name.as_ref().trim().to_lowercase();
            if name.is_empty() {
                return Err(MonthTableError("month name must not be empty".to_string()));
            }
            if !(1..=12).contains(&number) {
                return Err(MonthTableError(format!(
                    "month {:?} maps to {}, expected 1..=12",
                    name, number
                )));
            }
            names.insert(name, number);
        }

        for month in 1..=12 {
            if !names.values().any(|&n| n == month) {
                return Err(MonthTableError(format!(
                    "no name configured for month {}",
                    month
                )));
            }
        }

        Ok(Self { names })
    }

    /// Russian nominative month names.
    pub fn russian() -> Self {
        let names = [
            ("январь", 1),
            ("февраль", 2),
            ("март", 3),
            ("апрель", 4),
            ("май", 5),
            ("июнь", 6),
            ("июль", 7),
            ("август", 8),
            ("сентябрь", 9),
            ("октябрь", 10),
            ("ноябрь", 11),
            ("декабрь", 12),
        ]
        .into_iter()
        .map(|(name, number)| (name.to_string(), number))
        .collect();

        Self { names }
    }

    pub fn month_number(&self, name: &str) -> Option<u32> {
        self.names.get(&name.to_lowercase()).copied()
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self::russian()
    }
}
