use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;

/// Store-assigned row id. Never reused or renumbered.
pub type EntryId = i64;

/// Textual date format entries carry (`MM-DD-YYYY`).
pub const DATE_FORMAT: &str = "%m-%d-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "Income",
            EntryType::Expense => "Expense",
        }
    }

    /// Exact, case-sensitive parse of the stored vocabulary.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Income" => Some(EntryType::Income),
            "Expense" => Some(EntryType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mutable fields of an entry, as supplied by a caller on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    /// `MM-DD-YYYY`, kept as text
    pub date: String,
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Amount,
    pub note: Option<String>,
}

impl NewEntry {
    pub fn new(
        date: impl Into<String>,
        entry_type: EntryType,
        category: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            date: date.into(),
            entry_type,
            category: category.into(),
            amount,
            note: None,
        }
    }

    /// Empty notes are stored as NULL.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.is_empty() { None } else { Some(note) };
        self
    }
}

/// A persisted income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub date: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Amount,
    pub note: Option<String>,
    /// Assigned by the store at insertion; never changed by updates
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// The mutable part of this entry, e.g. as a base for a partial edit.
    pub fn to_new_entry(&self) -> NewEntry {
        NewEntry {
            date: self.date.clone(),
            entry_type: self.entry_type,
            category: self.category.clone(),
            amount: self.amount,
            note: self.note.clone(),
        }
    }
}
