use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::format_amount;

/// Ceiling on total spend for one category within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLimit {
    /// Always the first day of the month.
    pub month: NaiveDate,
    pub category: String,
    pub limit: f64,
}

/// A month's category total that went past its configured limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overage {
    pub month: NaiveDate,
    pub category: String,
    pub limit: f64,
    pub spent: f64,
}

impl Overage {
    /// Compare a monthly total against a limit; `None` unless the total
    /// is strictly above it.
    pub fn detect(limit: &CategoryLimit, spent: f64) -> Option<Self> {
        (spent > limit.limit).then(|| Self {
            month: limit.month,
            category: limit.category.clone(),
            limit: limit.limit,
            spent,
        })
    }

    pub fn excess(&self) -> f64 {
        self.spent - self.limit
    }
}

impl std::fmt::Display for Overage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Limit of {} exceeded for '{}' in {} (spent {})",
            format_amount(self.limit),
            self.category,
            self.month.format("%m.%Y"),
            format_amount(self.spent)
        )
    }
}
