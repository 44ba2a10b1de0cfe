//! Row filtering for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

/// Rows where any cell's text contains `query`, ignoring case.
///
/// `query` is a literal substring. Missing cells never match. An empty (or all-whitespace)
/// query returns every row.
pub fn search(dataset: &DataSet, query: &str) -> DataSet {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return dataset.clone();
    }
    filter(dataset, |row| {
        row.iter()
            .filter_map(Value::to_text)
            .any(|cell| cell.to_lowercase().contains(&needle))
    })
}
