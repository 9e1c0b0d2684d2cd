use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{format_amount, format_date};

/// Total spent on one category during one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub category: String,
    pub total: f64,
}

impl DailyTotal {
    /// Display row: (`dd.mm.yyyy`, category, grouped total).
    pub fn formatted(&self) -> (String, String, String) {
        (
            format_date(self.date),
            self.category.clone(),
            format_amount(self.total),
        )
    }
}

/// Total spent on one category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

impl CategoryTotal {
    /// Display row: (category, grouped total).
    pub fn formatted(&self) -> (String, String) {
        (self.category.clone(), format_amount(self.total))
    }
}
