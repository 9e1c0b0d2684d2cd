use anyhow::Result;
use serde_json::{Map, Value as JsonValue};
use std::io::Write;

use crate::application::LedgerService;
use crate::storage::Collection;

/// Exporter for converting ledger collections to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export a collection (optionally projected) to CSV format
    pub async fn export_csv<W: Write>(
        &self,
        collection: &str,
        columns: Option<&[&str]>,
        writer: W,
    ) -> Result<usize> {
        let header = header(collection, columns)?;
        let rows = self.service.select(collection, columns).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(&header)?;

        for row in &rows {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// Export a collection (optionally projected) as a JSON array of objects
    pub async fn export_json<W: Write>(
        &self,
        collection: &str,
        columns: Option<&[&str]>,
        mut writer: W,
    ) -> Result<usize> {
        let header = header(collection, columns)?;
        let rows = self.service.select(collection, columns).await?;

        let objects = rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .zip(row)
                    .map(|(name, value)| -> Result<(String, JsonValue)> {
                        Ok((name.to_string(), serde_json::to_value(value)?))
                    })
                    .collect::<Result<Map<String, JsonValue>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let json = serde_json::to_string_pretty(&objects)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(rows.len())
    }
}

fn header(collection: &str, columns: Option<&[&str]>) -> Result<Vec<&'static str>> {
    let collection: Collection = collection.parse()?;
    Ok(collection
        .project(columns)?
        .iter()
        .map(|column| column.name)
        .collect())
}
