// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use costbook::application::LedgerService;
use costbook::storage::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Second connection to the test database, for tampering with the schema
/// behind the service's back
pub async fn side_pool(temp_dir: &TempDir) -> Result<SqlitePool> {
    let db_path = temp_dir.path().join("test.db");
    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    Ok(pool)
}

/// Helper to build a date
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ids of all stored entries, in insertion order
pub async fn entry_ids(service: &LedgerService) -> Result<Vec<i64>> {
    let rows = service.select("costs", Some(&["id"][..])).await?;
    Ok(rows
        .into_iter()
        .map(|row| match row.as_slice() {
            [Value::Integer(id)] => *id,
            other => panic!("unexpected row: {:?}", other),
        })
        .collect())
}

/// Test fixture: March 2024 expenses
pub struct MarchExpenses;

impl MarchExpenses {
    /// Two food entries and one fuel entry on 15.03.2024
    pub async fn record_day(service: &LedgerService) -> Result<()> {
        service
            .insert_entries(
                [
                    ("15.03.2024", "food", 100.0),
                    ("15.03.2024", "food", 50.0),
                    ("15.03.2024", "fuel", 30.0),
                ],
                false,
            )
            .await?;
        Ok(())
    }

    /// Entries spread across the month plus neighbours outside it
    pub async fn record_month(service: &LedgerService) -> Result<()> {
        service
            .insert_entries(
                [
                    ("29.02.2024", "food", 1000.0),
                    ("01.03.2024", "food", 10.0),
                    ("15.03.2024", "fuel", 30.0),
                    ("20.03.2024", "food", 20.5),
                    ("31.03.2024", "rent", 1500.0),
                    ("01.04.2024", "food", 1000.0),
                ],
                false,
            )
            .await?;
        Ok(())
    }
}
