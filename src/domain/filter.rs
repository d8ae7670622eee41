use super::{is_canonical, Entry, EntryType, ALL_SENTINEL, OTHER_SENTINEL};

/// How entries are filtered by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Categories outside the canonical set (case-sensitive exclusion)
    Other,
    /// Case-insensitive equality
    Named(String),
}

impl CategoryFilter {
    /// Interpret a raw filter value, honoring the "All" and "Other" sentinels.
    pub fn parse(value: &str) -> Self {
        match value {
            "" | ALL_SENTINEL => CategoryFilter::All,
            OTHER_SENTINEL => CategoryFilter::Other,
            name => CategoryFilter::Named(name.to_string()),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Other => !is_canonical(category),
            // SQLite LOWER() only folds ASCII
            CategoryFilter::Named(name) => name.eq_ignore_ascii_case(category),
        }
    }
}

/// Optional filters for listing entries and computing totals.
/// All active filters combine with AND.
///
/// Date bounds are inclusive and compared as plain strings against the stored
/// `MM-DD-YYYY` text, so they follow lexical rather than calendar order:
/// `"12-01-2023"` sorts after `"06-01-2024"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub category: CategoryFilter,
    pub entry_type: Option<EntryType>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_date(mut self, date: impl Into<String>) -> Self {
        self.from_date = Some(date.into());
        self
    }

    pub fn to_date(mut self, date: impl Into<String>) -> Self {
        self.to_date = Some(date.into());
        self
    }

    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Lower date bound, ignoring empty strings.
    pub fn from_bound(&self) -> Option<&str> {
        self.from_date.as_deref().filter(|d| !d.is_empty())
    }

    /// Upper date bound, ignoring empty strings.
    pub fn to_bound(&self) -> Option<&str> {
        self.to_date.as_deref().filter(|d| !d.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.from_bound().is_none()
            && self.to_bound().is_none()
            && self.category == CategoryFilter::All
            && self.entry_type.is_none()
    }

    /// In-memory evaluation of the same predicate the repository runs in SQL.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(from) = self.from_bound() {
            if entry.date.as_str() < from {
                return false;
            }
        }
        if let Some(to) = self.to_bound() {
            if entry.date.as_str() > to {
                return false;
            }
        }
        if let Some(entry_type) = self.entry_type {
            if entry.entry_type != entry_type {
                return false;
            }
        }
        self.category.matches(&entry.category)
    }
}
