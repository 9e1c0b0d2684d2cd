use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::application::{CategoryTotal, DailyTotal};
use crate::domain::{CategoryLimit, EntryId, ExpenseEntry, NewEntry};

use super::{Collection, Column, ColumnKind, MIGRATION_001_INITIAL, Value};

/// Storage format for dates; sorts and compares correctly as text.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A month's spending for one category next to the limit that applies to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthStatus {
    /// `None` when nothing was spent on the category that month.
    pub spent: Option<f64>,
    /// `None` when no limit is configured for the month and category.
    pub limit: Option<CategoryLimit>,
}

/// Repository for persisting and querying expense entries and limits.
///
/// Holds a single connection for its whole lifetime; every operation runs
/// inside its own transaction on that connection.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // One long-lived connection: operations never overlap, and an
        // in-memory database survives between operations.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create both collections if they don't exist yet. Safe to call repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        tracing::debug!("begin transaction");
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    /// Commit on success, roll back on failure. The transaction is consumed
    /// either way, so it is released on every path.
    async fn finish<T>(tx: Transaction<'static, Sqlite>, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                tx.commit().await.context("Failed to commit transaction")?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("rollback failed: {rollback_err}");
                } else {
                    tracing::debug!("transaction rolled back");
                }
                Err(err)
            }
        }
    }

    // ========================
    // Write operations
    // ========================

    /// Insert a batch of entries atomically. Returns the assigned ids in
    /// insertion order.
    pub async fn insert_entries(&self, entries: &[NewEntry]) -> Result<Vec<EntryId>> {
        let mut tx = self.begin().await?;
        let result = Self::insert_entries_in(&mut tx, entries).await;
        Self::finish(tx, result).await
    }

    async fn insert_entries_in(
        conn: &mut SqliteConnection,
        entries: &[NewEntry],
    ) -> Result<Vec<EntryId>> {
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO costs (col_date, col_group, col_summ)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(entry.date.format(DATE_FORMAT).to_string())
            .bind(&entry.category)
            .bind(entry.amount)
            .execute(&mut *conn)
            .await
            .context("Failed to insert expense entry")?;

            ids.push(result.last_insert_rowid());
        }

        Ok(ids)
    }

    /// Insert a monthly limit in its own transaction.
    pub async fn insert_limit(&self, limit: &CategoryLimit) -> Result<()> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO costs_limits (col_date, col_group, col_limit)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(limit.month.format(DATE_FORMAT).to_string())
        .bind(&limit.category)
        .bind(limit.limit)
        .execute(&mut *tx)
        .await
        .map(|_| ())
        .context("Failed to insert category limit");

        Self::finish(tx, result).await
    }

    /// Delete the entry with the highest id. Returns the number of rows
    /// removed, which is zero when there are no entries.
    pub async fn delete_most_recent_entry(&self) -> Result<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM costs WHERE id = (SELECT MAX(id) FROM costs)")
            .execute(&mut *tx)
            .await
            .map(|r| r.rows_affected())
            .context("Failed to delete most recent entry");

        Self::finish(tx, result).await
    }

    // ========================
    // Read operations
    // ========================

    /// Select rows from a collection, projected onto `columns`, in insertion order.
    pub async fn select(
        &self,
        collection: Collection,
        columns: &[Column],
    ) -> Result<Vec<Vec<Value>>> {
        let column_list = columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ");
        // Identifiers come from the static schema, never from user input.
        let query = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            column_list,
            collection.as_str()
        );

        let mut tx = self.begin().await?;
        let result = sqlx::query(&query)
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("Failed to select from {}", collection))
            .and_then(|rows| {
                rows.iter()
                    .map(|row| Self::row_to_values(row, columns))
                    .collect::<Result<Vec<_>>>()
            });

        Self::finish(tx, result).await
    }

    /// List all expense entries, ordered by id.
    pub async fn list_entries(&self) -> Result<Vec<ExpenseEntry>> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            r#"
            SELECT id, col_date, col_group, col_summ
            FROM costs
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list entries")
        .and_then(|rows| {
            rows.iter()
                .map(Self::row_to_entry)
                .collect::<Result<Vec<_>>>()
        });

        Self::finish(tx, result).await
    }

    /// Sum entries of one calendar day, grouped by category.
    pub async fn sum_by_date(&self, date: NaiveDate) -> Result<Vec<DailyTotal>> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            r#"
            SELECT col_date, col_group, SUM(col_summ) as total
            FROM costs
            WHERE col_date = ?
            GROUP BY col_group, col_date
            ORDER BY col_group
            "#,
        )
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&mut *tx)
        .await
        .context("Failed to sum entries by date")
        .and_then(|rows| {
            rows.iter()
                .map(Self::row_to_daily_total)
                .collect::<Result<Vec<_>>>()
        });

        Self::finish(tx, result).await
    }

    /// Sum entries within an inclusive date range, grouped by category.
    pub async fn sum_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<CategoryTotal>> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            r#"
            SELECT col_group, SUM(col_summ) as total
            FROM costs
            WHERE col_date BETWEEN ? AND ?
            GROUP BY col_group
            ORDER BY col_group
            "#,
        )
        .bind(first.format(DATE_FORMAT).to_string())
        .bind(last.format(DATE_FORMAT).to_string())
        .fetch_all(&mut *tx)
        .await
        .context("Failed to sum entries between dates")
        .map(|rows| {
            rows.iter()
                .map(|row| CategoryTotal {
                    category: row.get("col_group"),
                    total: row.get("total"),
                })
                .collect()
        });

        Self::finish(tx, result).await
    }

    /// Read a category's spending for the month `month` starts and the limit
    /// configured for it, in one snapshot.
    ///
    /// When several different limits exist for the same month and category,
    /// the most recently inserted one applies.
    pub async fn month_status(&self, month: NaiveDate, category: &str) -> Result<MonthStatus> {
        let mut tx = self.begin().await?;
        let result = Self::month_status_in(&mut tx, month, category).await;
        Self::finish(tx, result).await
    }

    async fn month_status_in(
        conn: &mut SqliteConnection,
        month: NaiveDate,
        category: &str,
    ) -> Result<MonthStatus> {
        let month_str = month.format(DATE_FORMAT).to_string();

        let spent = sqlx::query(
            r#"
            SELECT SUM(col_summ) as total
            FROM costs
            WHERE date(col_date, 'start of month') = date(?, 'start of month')
              AND col_group = ?
            GROUP BY date(col_date, 'start of month'), col_group
            "#,
        )
        .bind(&month_str)
        .bind(category)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to sum monthly spending")?
        .and_then(|row| row.get::<Option<f64>, _>("total"));

        let limit = sqlx::query(
            r#"
            SELECT col_date, col_group, col_limit
            FROM costs_limits
            WHERE col_date = date(?, 'start of month') AND col_group = ?
            ORDER BY rowid DESC
            LIMIT 1
            "#,
        )
        .bind(&month_str)
        .bind(category)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch category limit")?
        .map(|row| Self::row_to_limit(&row))
        .transpose()?
        .flatten();

        Ok(MonthStatus { spent, limit })
    }

    fn row_to_values(row: &SqliteRow, columns: &[Column]) -> Result<Vec<Value>> {
        columns
            .iter()
            .map(|column| -> Result<Value> {
                let value = match column.kind {
                    ColumnKind::Integer => row
                        .try_get::<Option<i64>, _>(column.name)?
                        .map(Value::Integer),
                    ColumnKind::Date => row
                        .try_get::<Option<String>, _>(column.name)?
                        .map(|s| parse_stored_date(&s).map(Value::Date))
                        .transpose()?,
                    ColumnKind::Text => row
                        .try_get::<Option<String>, _>(column.name)?
                        .map(Value::Text),
                    ColumnKind::Real => row
                        .try_get::<Option<f64>, _>(column.name)?
                        .map(Value::Real),
                };
                Ok(value.unwrap_or(Value::Null))
            })
            .collect()
    }

    fn row_to_entry(row: &SqliteRow) -> Result<ExpenseEntry> {
        let date_str: String = row.get("col_date");

        Ok(ExpenseEntry {
            id: row.get("id"),
            date: parse_stored_date(&date_str)?,
            category: row.get("col_group"),
            amount: row.get("col_summ"),
        })
    }

    fn row_to_daily_total(row: &SqliteRow) -> Result<DailyTotal> {
        let date_str: String = row.get("col_date");

        Ok(DailyTotal {
            date: parse_stored_date(&date_str)?,
            category: row.get("col_group"),
            total: row.get("total"),
        })
    }

    /// Limit rows with a missing column are treated as no limit at all.
    fn row_to_limit(row: &SqliteRow) -> Result<Option<CategoryLimit>> {
        let date_str: Option<String> = row.get("col_date");
        let category: Option<String> = row.get("col_group");
        let limit: Option<f64> = row.get("col_limit");

        match (date_str, category, limit) {
            (Some(date_str), Some(category), Some(limit)) => Ok(Some(CategoryLimit {
                month: parse_stored_date(&date_str)?,
                category,
                limit,
            })),
            _ => Ok(None),
        }
    }
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date: {}", s))
}
