use thiserror::Error;

use crate::domain::NormalizeError;
use crate::storage::SchemaError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Invalid(#[from] NormalizeError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid limit: {0} (must be a positive number)")]
    InvalidLimit(f64),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl LedgerError {
    /// Whether the error was raised before touching storage.
    pub fn is_validation(&self) -> bool {
        !matches!(self, LedgerError::Database(_))
    }
}
