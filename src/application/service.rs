use chrono::NaiveDate;

use crate::domain::{
    CategoryLimit, EntryId, ExpenseEntry, MonthNames, NewEntry, Overage, RawEntry, format_amount,
    format_date, month_start, normalize_category, normalize_date, normalize_month_year,
};
use crate::storage::{Collection, Repository, Row};

use super::{CategoryTotal, DailyTotal, LedgerError};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct LedgerService {
    repo: Repository,
    months: MonthNames,
}

/// Result of inserting a batch of entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    /// Ids assigned to the new entries, in input order.
    pub ids: Vec<EntryId>,
    /// Limits found exceeded after the batch committed.
    pub overages: Vec<Overage>,
    /// Limit checks that could not run. The entries are committed regardless.
    pub check_failures: Vec<LimitCheckFailure>,
}

/// A post-commit limit check that failed in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitCheckFailure {
    pub month: NaiveDate,
    pub category: String,
    pub error: String,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            months: MonthNames::default(),
        }
    }

    /// Replace the month-name table used to parse limit months.
    pub fn with_months(mut self, months: MonthNames) -> Self {
        self.months = months;
        self
    }

    pub fn months(&self) -> &MonthNames {
        &self.months
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Open a fresh in-memory ledger with the schema in place.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let repo = Repository::init("sqlite::memory:").await?;
        Ok(Self::new(repo))
    }

    /// Ensure both collections exist. No-op when they already do.
    pub async fn initialize(&self) -> Result<(), LedgerError> {
        self.repo.migrate().await?;
        Ok(())
    }

    // ========================
    // Entry operations
    // ========================

    /// Normalize and insert a batch of entries in a single transaction.
    ///
    /// Nothing is written if any entry fails to normalize or the storage
    /// rejects any row. When `check_limits` is set, each distinct
    /// (month, category) of the batch is checked against its limit once the
    /// transaction has committed.
    pub async fn insert_entries<I>(
        &self,
        entries: I,
        check_limits: bool,
    ) -> Result<InsertOutcome, LedgerError>
    where
        I: IntoIterator,
        I::Item: Into<RawEntry>,
    {
        let rows = entries
            .into_iter()
            .map(|raw| {
                let raw: RawEntry = raw.into();
                if !raw.amount.is_finite() {
                    return Err(LedgerError::InvalidAmount(raw.amount));
                }
                let row = raw.normalize()?;
                tracing::debug!(
                    "normalized entry {} '{}' {}",
                    format_date(row.date),
                    row.category,
                    format_amount(row.amount)
                );
                Ok(row)
            })
            .collect::<Result<Vec<NewEntry>, LedgerError>>()?;

        if rows.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let ids = self.repo.insert_entries(&rows).await?;
        tracing::info!("inserted {} expense entries", ids.len());

        let mut outcome = InsertOutcome {
            ids,
            ..Default::default()
        };
        if check_limits {
            self.check_batch_limits(&rows, &mut outcome).await;
        }

        Ok(outcome)
    }

    /// Record a single expense and check its limit.
    pub async fn record_expense(
        &self,
        date: &str,
        category: &str,
        amount: f64,
    ) -> Result<InsertOutcome, LedgerError> {
        self.insert_entries([RawEntry::new(date, category, amount)], true)
            .await
    }

    /// Delete the most recently inserted entry. Returns the number of rows
    /// removed (zero when the ledger is empty).
    pub async fn delete_most_recent_entry(&self) -> Result<u64, LedgerError> {
        let deleted = self.repo.delete_most_recent_entry().await?;
        if deleted > 0 {
            tracing::info!("most recent entry deleted");
        } else {
            tracing::info!("no entries to delete");
        }
        Ok(deleted)
    }

    // ========================
    // Limit operations
    // ========================

    /// Set a monthly limit for a category. `month_year` reads like "март 2024".
    ///
    /// Setting a limit never triggers a limit check.
    pub async fn insert_limit(
        &self,
        month_year: &str,
        category: &str,
        limit: f64,
    ) -> Result<CategoryLimit, LedgerError> {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(LedgerError::InvalidLimit(limit));
        }

        let limit = CategoryLimit {
            month: normalize_month_year(month_year, &self.months)?,
            category: normalize_category(category)?,
            limit,
        };
        tracing::debug!(
            "normalized limit month {} category '{}'",
            format_date(limit.month),
            limit.category
        );

        self.repo.insert_limit(&limit).await?;
        tracing::info!(
            "limit {} set for '{}' from {}",
            format_amount(limit.limit),
            limit.category,
            format_date(limit.month)
        );

        Ok(limit)
    }

    /// Compare the month's total for `category` against its limit.
    ///
    /// Returns `None` when no limit is configured, nothing was spent, or the
    /// total is within the limit. Repeated calls report the same overage
    /// again; nothing about past warnings is remembered.
    pub async fn check_limit(
        &self,
        month: NaiveDate,
        category: &str,
    ) -> Result<Option<Overage>, LedgerError> {
        let category = normalize_category(category)?;
        let status = self
            .repo
            .month_status(month_start(month), &category)
            .await?;

        let overage = match (status.spent, status.limit) {
            (Some(spent), Some(limit)) => Overage::detect(&limit, spent),
            _ => None,
        };

        if let Some(overage) = &overage {
            tracing::warn!("{}", overage);
        }

        Ok(overage)
    }

    async fn check_batch_limits(&self, rows: &[NewEntry], outcome: &mut InsertOutcome) {
        let mut checked: Vec<(NaiveDate, &str)> = Vec::new();

        for row in rows {
            let key = (month_start(row.date), row.category.as_str());
            if checked.contains(&key) {
                continue;
            }
            checked.push(key);

            // The batch is already committed; a failed check must not
            // look like a failed insert.
            match self.check_limit(key.0, key.1).await {
                Ok(Some(overage)) => outcome.overages.push(overage),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!("limit check failed for '{}': {}", key.1, err);
                    outcome.check_failures.push(LimitCheckFailure {
                        month: key.0,
                        category: key.1.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    // ========================
    // Query operations
    // ========================

    /// Return every row of a collection, optionally projected onto a subset
    /// of its columns.
    pub async fn select(
        &self,
        collection: &str,
        columns: Option<&[&str]>,
    ) -> Result<Vec<Row>, LedgerError> {
        let collection: Collection = collection.parse()?;
        let columns = collection.project(columns)?;
        Ok(self.repo.select(collection, &columns).await?)
    }

    /// All recorded entries, oldest first.
    pub async fn list_entries(&self) -> Result<Vec<ExpenseEntry>, LedgerError> {
        Ok(self.repo.list_entries().await?)
    }

    /// Per-category totals for a single day.
    pub async fn aggregate_by_date(&self, date: &str) -> Result<Vec<DailyTotal>, LedgerError> {
        let date = normalize_date(date)?;
        tracing::debug!("aggregating entries of {}", format_date(date));
        Ok(self.repo.sum_by_date(date).await?)
    }

    /// Per-category totals over an inclusive date range.
    pub async fn aggregate_between(
        &self,
        first: &str,
        last: &str,
    ) -> Result<Vec<CategoryTotal>, LedgerError> {
        let first = normalize_date(first)?;
        let last = normalize_date(last)?;
        tracing::debug!(
            "aggregating entries from {} to {}",
            format_date(first),
            format_date(last)
        );
        Ok(self.repo.sum_between(first, last).await?)
    }
}
