use anyhow::Result;
use std::io::Read;

use crate::application::{LedgerService, LimitCheckFailure};
use crate::domain::{Overage, RawEntry};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
    pub overages: Vec<Overage>,
    pub check_failures: Vec<LimitCheckFailure>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub check_limits: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            check_limits: true,
        }
    }
}

/// Importer for loading expense entries into the ledger
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import entries from CSV with a `date,category,amount` header.
    ///
    /// The file is imported as one batch: if any line fails to parse or
    /// normalize, nothing is written and every problem is reported.
    pub async fn import_entries_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.deserialize::<RawEntry>().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            if !entry.amount.is_finite() {
                errors.push(ImportError {
                    line,
                    field: Some("amount".to_string()),
                    error: format!("Invalid amount: {}", entry.amount),
                });
                continue;
            }

            if let Err(e) = entry.normalize() {
                errors.push(ImportError {
                    line,
                    field: Some(field_of(&e).to_string()),
                    error: e.to_string(),
                });
                continue;
            }

            entries.push(entry);
        }

        if !errors.is_empty() || options.dry_run {
            return Ok(ImportResult {
                imported: if errors.is_empty() { entries.len() } else { 0 },
                errors,
                overages: Vec::new(),
                check_failures: Vec::new(),
            });
        }

        let outcome = self
            .service
            .insert_entries(entries, options.check_limits)
            .await?;

        Ok(ImportResult {
            imported: outcome.ids.len(),
            errors,
            overages: outcome.overages,
            check_failures: outcome.check_failures,
        })
    }
}

fn field_of(error: &crate::domain::NormalizeError) -> &'static str {
    use crate::domain::NormalizeError;

    match error {
        NormalizeError::InvalidDate(_) => "date",
        NormalizeError::InvalidCategory(_) => "category",
        NormalizeError::UnknownMonthName(_) | NormalizeError::InvalidYear(_) => "month",
    }
}
