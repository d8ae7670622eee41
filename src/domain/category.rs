/// Categories the presentation layer offers by default. Anything else falls
/// into the "Other" bucket at query time.
pub const CANONICAL_CATEGORIES: [&str; 4] = ["Food", "Transport", "Utilities", "Entertainment"];

/// Filter sentinel meaning "do not filter on this dimension".
pub const ALL_SENTINEL: &str = "All";

/// Filter sentinel for categories outside [`CANONICAL_CATEGORIES`].
pub const OTHER_SENTINEL: &str = "Other";

/// Case-sensitive membership in the canonical set.
pub fn is_canonical(category: &str) -> bool {
    CANONICAL_CATEGORIES.contains(&category)
}

/// Choices for a category filter: "All", the sorted union of canonical and
/// stored categories, then "Other".
pub fn filter_choices(stored: &[String]) -> Vec<String> {
    let mut names: Vec<String> = CANONICAL_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .chain(stored.iter().cloned())
        .filter(|c| c != ALL_SENTINEL && c != OTHER_SENTINEL)
        .collect();
    names.sort();
    names.dedup();

    let mut choices = Vec::with_capacity(names.len() + 2);
    choices.push(ALL_SENTINEL.to_string());
    choices.extend(names);
    choices.push(OTHER_SENTINEL.to_string());
    choices
}
