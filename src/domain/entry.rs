use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{NormalizeError, normalize_category, normalize_date};

/// Surrogate key assigned by storage; monotonically increasing, never reused.
pub type EntryId = i64;

/// A recorded expense as persisted in the `costs` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

/// An expense as typed by the user, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub date: String,
    pub category: String,
    pub amount: f64,
}

impl RawEntry {
    pub fn new(date: impl Into<String>, category: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
            amount,
        }
    }

    /// Normalize date and category into a row ready for insertion.
    pub fn normalize(&self) -> Result<NewEntry, NormalizeError> {
        Ok(NewEntry {
            date: normalize_date(&self.date)?,
            category: normalize_category(&self.category)?,
            amount: self.amount,
        })
    }
}

impl<D, C> From<(D, C, f64)> for RawEntry
where
    D: Into<String>,
    C: Into<String>,
{
    fn from((date, category, amount): (D, C, f64)) -> Self {
        Self::new(date, category, amount)
    }
}

/// A normalized expense that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_entry_normalize() {
        let raw = RawEntry::from(("15/3/2024", "Food, lunch", 12.5));
        let entry = raw.normalize().unwrap();

        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(entry.category, "food");
        assert_eq!(entry.amount, 12.5);
    }

    #[test]
    fn test_raw_entry_normalize_rejects_bad_date() {
        let raw = RawEntry::new("someday", "food", 1.0);
        assert!(matches!(
            raw.normalize(),
            Err(NormalizeError::InvalidDate(_))
        ));
    }
}
