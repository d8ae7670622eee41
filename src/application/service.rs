use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;

use crate::domain::{filter_choices, Entry, EntryFilter, EntryId, NewEntry, Totals};
use crate::storage::Repository;

use super::{AppError, Lenient};

/// File name of the ledger database inside the data directory.
pub const DATABASE_FILE: &str = "expenses.db";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Location of the ledger database for a data directory.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Application service providing the ledger operations.
/// This is the handle every client (CLI, GUI, tests) holds; construct it once
/// and pass it by reference.
pub struct LedgerService {
    repo: Repository,
    in_memory: bool,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            in_memory: false,
        }
    }

    /// Open the database at `database_path`, creating its directory, the file
    /// and the schema as needed. Safe to call on every start.
    pub async fn init(database_path: &Path) -> Result<Self, AppError> {
        let repo = open_repository(database_path).await.map_err(|source| AppError::Initialization {
            path: database_path.display().to_string(),
            source,
        })?;

        tracing::debug!(path = %database_path.display(), "ledger database ready");
        Ok(Self::new(repo))
    }

    /// Open a private in-memory ledger. Nothing is persisted.
    pub async fn in_memory() -> Result<Self, AppError> {
        let repo = open_memory_repository().await.map_err(|source| AppError::Initialization {
            path: ":memory:".to_string(),
            source,
        })?;

        Ok(Self {
            repo,
            in_memory: true,
        })
    }

    /// Open the database at `database_path`, or fall back to an in-memory
    /// ledger if it cannot be initialized. Check [`LedgerService::is_in_memory`]
    /// to find out which one you got.
    pub async fn open_or_in_memory(database_path: &Path) -> Result<Self, AppError> {
        match Self::init(database_path).await {
            Ok(service) => Ok(service),
            Err(err @ AppError::Initialization { .. }) => {
                tracing::warn!(error = %err, "falling back to an in-memory ledger");
                Self::in_memory().await
            }
            Err(err) => Err(err),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// Close the underlying connections.
    pub async fn close(self) {
        self.repo.close().await;
    }

    // ========================
    // Entry operations
    // ========================

    /// Record a new entry. The id and creation time are assigned here.
    pub async fn create_entry(&self, entry: NewEntry) -> Result<Entry, AppError> {
        validate_entry(&entry)?;

        let created_at = Utc::now();
        let id = self.repo.insert_entry(&entry, created_at).await?;
        tracing::debug!(id, category = %entry.category, "entry created");

        Ok(Entry {
            id,
            date: entry.date,
            entry_type: entry.entry_type,
            category: entry.category,
            amount: entry.amount,
            note: entry.note,
            created_at,
        })
    }

    /// Get an entry by id, `None` if it doesn't exist.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        Ok(self.repo.get_entry(id).await?)
    }

    /// List every entry in insertion order.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, AppError> {
        Ok(self.repo.list_entries().await?)
    }

    /// List entries matching a filter, ordered by date descending.
    pub async fn list_entries_filtered(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<Entry>, AppError> {
        Ok(self.repo.list_entries_filtered(filter).await?)
    }

    /// Income, expense and balance over every entry.
    pub async fn totals(&self) -> Result<Totals, AppError> {
        Ok(self.repo.sum_by_type().await?)
    }

    /// Income, expense and balance over the entries `filter` selects.
    /// Always consistent with [`LedgerService::list_entries_filtered`].
    pub async fn totals_filtered(&self, filter: &EntryFilter) -> Result<Totals, AppError> {
        Ok(self.repo.sum_by_type_filtered(filter).await?)
    }

    /// Replace every mutable field of an entry.
    pub async fn update_entry(&self, id: EntryId, entry: NewEntry) -> Result<Entry, AppError> {
        validate_entry(&entry)?;

        if !self.repo.update_entry(id, &entry).await? {
            return Err(AppError::EntryNotFound(id));
        }
        tracing::debug!(id, "entry updated");

        self.repo
            .get_entry(id)
            .await?
            .ok_or(AppError::EntryNotFound(id))
    }

    /// Permanently remove an entry.
    pub async fn delete_entry(&self, id: EntryId) -> Result<(), AppError> {
        if !self.repo.delete_entry(id).await? {
            return Err(AppError::EntryNotFound(id));
        }
        tracing::debug!(id, "entry deleted");
        Ok(())
    }

    /// Distinct stored categories, sorted.
    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        Ok(self.repo.list_categories().await?)
    }

    /// Category filter choices. Falls back to the canonical categories if the
    /// stored ones cannot be read.
    pub async fn filter_choices(&self) -> Vec<String> {
        let stored = self.categories().await.or_logged_default("list categories");
        filter_choices(&stored)
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_entries().await?)
    }
}

async fn open_repository(database_path: &Path) -> anyhow::Result<Repository> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    Repository::init(database_path).await
}

async fn open_memory_repository() -> anyhow::Result<Repository> {
    let repo = Repository::connect_in_memory().await?;
    repo.migrate().await?;
    Ok(repo)
}

/// Checks every caller gets, whatever validation it did itself.
fn validate_entry(entry: &NewEntry) -> Result<(), AppError> {
    if entry.date.trim().is_empty() {
        return Err(AppError::InvalidEntry("date is required".to_string()));
    }
    if entry.category.trim().is_empty() {
        return Err(AppError::InvalidEntry("category is required".to_string()));
    }
    if !entry.amount.is_finite() {
        return Err(AppError::InvalidAmount(
            "Amount must be a finite number".to_string(),
        ));
    }
    if entry.amount < 0.0 {
        return Err(AppError::InvalidAmount(
            "Amount cannot be negative".to_string(),
        ));
    }
    Ok(())
}
