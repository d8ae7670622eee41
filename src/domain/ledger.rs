use serde::{Deserialize, Serialize};

use super::{Amount, Entry, EntryType};

/// Income and expense sums over a set of entries.
/// The balance is always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub balance: Amount,
}

impl Totals {
    pub fn new(total_income: Amount, total_expense: Amount) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }

    /// Compute totals from already loaded entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let (income, expense) =
            entries
                .into_iter()
                .fold((0.0, 0.0), |(income, expense), entry| match entry.entry_type {
                    EntryType::Income => (income + entry.amount, expense),
                    EntryType::Expense => (income, expense + entry.amount),
                });
        Self::new(income, expense)
    }
}
