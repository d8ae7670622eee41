use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::domain::{Entry, EntryFilter, EntryId, EntryType, NewEntry, Totals};

use super::query::{push_where, Predicate};
use super::MIGRATION_001_INITIAL;

const ENTRY_COLUMNS: &str = "id, date, type, category, amount, note, created_at";

/// Repository for persisting and querying ledger entries.
///
/// Every call checks a connection out of the pool for its own duration only.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the SQLite file at `path`, creating it if it doesn't exist.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database {}", path.display()))?;
        Ok(Self::new(pool))
    }

    /// Open a private in-memory database.
    /// The pool is pinned to a single connection that never expires, since
    /// each SQLite in-memory connection is a separate database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(path: &Path) -> Result<Self> {
        let repo = Self::connect(path).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Entry operations
    // ========================

    /// Insert a new entry and return the id SQLite assigned to it.
    pub async fn insert_entry(&self, entry: &NewEntry, created_at: DateTime<Utc>) -> Result<EntryId> {
        let result = sqlx::query(
            r#"
            INSERT INTO entries (date, type, category, amount, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.date)
        .bind(entry.entry_type.as_str())
        .bind(&entry.category)
        .bind(entry.amount)
        .bind(&entry.note)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert entry")?;

        Ok(result.last_insert_rowid())
    }

    /// Get an entry by id.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch entry")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// List all entries in insertion order.
    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        let rows = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// List entries matching a filter, newest date first.
    /// Dates order lexically as stored; ties fall back to the newest id.
    pub async fn list_entries_filtered(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let predicates = Predicate::from_filter(filter);

        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ENTRY_COLUMNS} FROM entries"));
        push_where(&mut builder, &predicates);
        builder.push(" ORDER BY date DESC, id DESC");

        tracing::debug!(sql = builder.sql(), ?filter, "listing filtered entries");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered entries")?;

        tracing::debug!(count = rows.len(), "filtered entries found");

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Sum amounts by type over every entry.
    pub async fn sum_by_type(&self) -> Result<Totals> {
        self.sum_by_type_filtered(&EntryFilter::default()).await
    }

    /// Sum amounts by type over the entries a filter selects.
    /// Uses the same predicates as [`Repository::list_entries_filtered`].
    pub async fn sum_by_type_filtered(&self, filter: &EntryFilter) -> Result<Totals> {
        let predicates = Predicate::from_filter(filter);

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COALESCE(SUM(CASE WHEN type = ");
        builder
            .push_bind(EntryType::Income.as_str())
            .push(" THEN amount END), 0.0) AS total_income, COALESCE(SUM(CASE WHEN type = ")
            .push_bind(EntryType::Expense.as_str())
            .push(" THEN amount END), 0.0) AS total_expense FROM entries");
        push_where(&mut builder, &predicates);

        tracing::debug!(sql = builder.sql(), ?filter, "summing entries");

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum entries")?;

        let total_income: f64 = row.try_get("total_income").context("Invalid income total")?;
        let total_expense: f64 = row
            .try_get("total_expense")
            .context("Invalid expense total")?;

        Ok(Totals::new(total_income, total_expense))
    }

    /// Replace the mutable fields of an entry. `created_at` is left untouched.
    /// Returns false if no entry has this id.
    pub async fn update_entry(&self, id: EntryId, entry: &NewEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE entries
            SET date = ?, type = ?, category = ?, amount = ?, note = ?
            WHERE id = ?
            "#,
        )
        .bind(&entry.date)
        .bind(entry.entry_type.as_str())
        .bind(&entry.category)
        .bind(entry.amount)
        .bind(&entry.note)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update entry")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry. Returns false if no entry has this id.
    pub async fn delete_entry(&self, id: EntryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete entry")?;

        Ok(result.rows_affected() > 0)
    }

    /// Distinct stored categories, case-sensitive, sorted.
    pub async fn list_categories(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT category FROM entries ORDER BY category")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("category").context("Invalid category"))
            .collect()
    }

    /// Count all entries.
    pub async fn count_entries(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM entries")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count entries")?
            .try_get("count")?;
        Ok(count)
    }

    fn row_to_entry(row: &SqliteRow) -> Result<Entry> {
        let type_str: String = row.try_get("type")?;
        let created_at_str: String = row.try_get("created_at")?;

        Ok(Entry {
            id: row.try_get("id")?,
            date: row.try_get("date")?,
            entry_type: EntryType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry type: {}", type_str))?,
            category: row.try_get("category")?,
            amount: row.try_get("amount")?,
            note: row.try_get("note")?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

/// Parse a stored timestamp: RFC 3339 as written by this crate, or SQLite's
/// `CURRENT_TIMESTAMP` layout for rows inserted elsewhere.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid created_at timestamp: {}", value))
}
