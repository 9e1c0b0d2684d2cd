//! Static schema handles for the two ledger collections.
//!
//! Column lists are known at compile time, so projections are validated
//! against them instead of reflecting table metadata from the database.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::domain::format_date;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Unknown column '{column}' in collection '{collection}'")]
    UnknownColumn { collection: String, column: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Date,
    Text,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const COSTS_COLUMNS: &[Column] = &[
    Column {
        name: "id",
        kind: ColumnKind::Integer,
    },
    Column {
        name: "col_date",
        kind: ColumnKind::Date,
    },
    Column {
        name: "col_group",
        kind: ColumnKind::Text,
    },
    Column {
        name: "col_summ",
        kind: ColumnKind::Real,
    },
];

const COSTS_LIMITS_COLUMNS: &[Column] = &[
    Column {
        name: "col_date",
        kind: ColumnKind::Date,
    },
    Column {
        name: "col_group",
        kind: ColumnKind::Text,
    },
    Column {
        name: "col_limit",
        kind: ColumnKind::Real,
    },
];

/// The persistent collections owned by the ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Costs,
    CostsLimits,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Costs => "costs",
            Collection::CostsLimits => "costs_limits",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Collection::Costs => COSTS_COLUMNS,
            Collection::CostsLimits => COSTS_LIMITS_COLUMNS,
        }
    }

    /// Resolve a requested projection to schema columns.
    ///
    /// `None` (or an empty list) selects every column. The result keeps the
    /// schema's column order regardless of the order names were requested in.
    pub fn project(&self, requested: Option<&[&str]>) -> Result<Vec<Column>, SchemaError> {
        let all = self.columns();
        let requested = match requested {
            Some(names) if !names.is_empty() => names,
            _ => return Ok(all.to_vec()),
        };

        if let Some(unknown) = requested
            .iter()
            .find(|name| !all.iter().any(|c| c.name == **name))
        {
            return Err(SchemaError::UnknownColumn {
                collection: self.as_str().to_string(),
                column: unknown.to_string(),
            });
        }

        Ok(all
            .iter()
            .filter(|c| requested.contains(&c.name))
            .copied()
            .collect())
    }
}

impl FromStr for Collection {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "costs" => Ok(Collection::Costs),
            "costs_limits" => Ok(Collection::CostsLimits),
            _ => Err(SchemaError::UnknownCollection(s.to_string())),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cell of a selected row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Date(#[serde(serialize_with = "serialize_date")] NaiveDate),
    Text(String),
    Real(f64),
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_date(*date))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", format_date(*d)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Real(v) => write!(f, "{}", v),
        }
    }
}

pub type Row = Vec<Value>;
