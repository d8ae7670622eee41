use sqlx::{QueryBuilder, Sqlite};

use crate::domain::{CategoryFilter, EntryFilter, EntryType, CANONICAL_CATEGORIES};

/// A single WHERE clause with its bound values.
///
/// Values only ever reach SQLite through `push_bind`; nothing here is
/// interpolated into the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Predicate<'a> {
    DateFrom(&'a str),
    DateTo(&'a str),
    CategoryOutsideCanonical,
    CategoryEquals(&'a str),
    TypeIs(EntryType),
}

impl<'a> Predicate<'a> {
    /// Active clauses of a filter, in a fixed order.
    pub(crate) fn from_filter(filter: &'a EntryFilter) -> Vec<Self> {
        let mut predicates = Vec::new();

        if let Some(from) = filter.from_bound() {
            predicates.push(Predicate::DateFrom(from));
        }
        if let Some(to) = filter.to_bound() {
            predicates.push(Predicate::DateTo(to));
        }
        match &filter.category {
            CategoryFilter::All => {}
            CategoryFilter::Other => predicates.push(Predicate::CategoryOutsideCanonical),
            CategoryFilter::Named(name) => predicates.push(Predicate::CategoryEquals(name)),
        }
        if let Some(entry_type) = filter.entry_type {
            predicates.push(Predicate::TypeIs(entry_type));
        }

        predicates
    }

    fn push_to(&self, builder: &mut QueryBuilder<'a, Sqlite>) {
        match *self {
            Predicate::DateFrom(date) => {
                builder.push("date >= ").push_bind(date);
            }
            Predicate::DateTo(date) => {
                builder.push("date <= ").push_bind(date);
            }
            Predicate::CategoryOutsideCanonical => {
                builder.push("category NOT IN (");
                let mut names = builder.separated(", ");
                for name in CANONICAL_CATEGORIES {
                    names.push_bind(name);
                }
                names.push_unseparated(")");
            }
            Predicate::CategoryEquals(name) => {
                builder
                    .push("LOWER(category) = LOWER(")
                    .push_bind(name)
                    .push(")");
            }
            Predicate::TypeIs(entry_type) => {
                builder.push("type = ").push_bind(entry_type.as_str());
            }
        }
    }
}

/// Append `WHERE a AND b ...` for the given predicates; nothing if empty.
pub(crate) fn push_where<'a>(builder: &mut QueryBuilder<'a, Sqlite>, predicates: &[Predicate<'a>]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        predicate.push_to(builder);
    }
}
