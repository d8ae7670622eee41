use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::domain::{Entry, Totals};

/// Header row of the CSV export.
pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Date",
    "Type",
    "Category",
    "Amount",
    "Note",
    "Created At",
];

/// Full ledger dump for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub totals: Totals,
    pub entries: Vec<Entry>,
}

impl LedgerSnapshot {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            totals: Totals::from_entries(&entries),
            entries,
        }
    }
}

/// Write entries as CSV, one row per entry in the given order.
/// Returns the number of rows written (header excluded).
pub fn write_entries_csv<W: Write>(entries: &[Entry], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for entry in entries {
        csv_writer.write_record([
            entry.id.to_string(),
            entry.date.clone(),
            entry.entry_type.to_string(),
            entry.category.clone(),
            entry.amount.to_string(),
            entry.note.clone().unwrap_or_default(),
            entry.created_at.to_rfc3339(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(entries.len())
}

/// Write a pretty-printed JSON snapshot of the given entries.
pub fn write_snapshot_json<W: Write>(entries: Vec<Entry>, mut writer: W) -> Result<LedgerSnapshot> {
    let snapshot = LedgerSnapshot::new(entries);

    let json = serde_json::to_string_pretty(&snapshot)?;
    writer.write_all(json.as_bytes())?;
    writer.flush()?;

    Ok(snapshot)
}
