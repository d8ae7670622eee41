use thiserror::Error;

use crate::domain::EntryId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to initialize ledger at {path}: {source:#}")]
    Initialization {
        path: String,
        source: anyhow::Error,
    },

    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid entry type '{0}' (expected Income or Expense)")]
    InvalidEntryType(String),

    #[error("Invalid date '{0}' (expected MM-DD-YYYY)")]
    InvalidDate(String),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}
