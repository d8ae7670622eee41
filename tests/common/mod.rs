// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use expensebook::application::LedgerService;
use expensebook::domain::{Entry, EntryType, NewEntry};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("data").join("expenses.db");
    let service = LedgerService::init(&db_path).await?;
    Ok((service, temp_dir))
}

pub fn income(date: &str, category: &str, amount: f64) -> NewEntry {
    NewEntry::new(date, EntryType::Income, category, amount)
}

pub fn expense(date: &str, category: &str, amount: f64) -> NewEntry {
    NewEntry::new(date, EntryType::Expense, category, amount)
}

/// Test fixture: the three-entry scenario (salary, lunch, bus).
pub struct JanuaryLedger;

impl JanuaryLedger {
    pub async fn create(service: &LedgerService) -> Result<Vec<Entry>> {
        let salary = service
            .create_entry(income("01-15-2024", "Salary", 2000.0).with_note(""))
            .await?;
        let lunch = service
            .create_entry(expense("01-16-2024", "Food", 50.0).with_note("lunch"))
            .await?;
        let bus = service
            .create_entry(expense("01-17-2024", "Transport", 20.0))
            .await?;
        Ok(vec![salary, lunch, bus])
    }
}

/// Ids of the given entries, in order.
pub fn ids(entries: &[Entry]) -> Vec<i64> {
    entries.iter().map(|e| e.id).collect()
}
