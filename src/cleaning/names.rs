//! Column-name normalization.
//!
//! Labels become lower-case `snake_case` identifiers that are safe to use unquoted in SQL:
//! surrounding whitespace is trimmed, inner whitespace and hyphens turn into `_`, anything
//! outside `[A-Za-z0-9_]` is dropped, and a handful of reserved keywords get a `_col` suffix.

use std::collections::HashSet;

use crate::types::DataSet;

/// Keywords that would break an unquoted SQL identifier.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "select", "from", "where", "group", "order", "table", "insert", "update", "delete", "join",
    "limit",
];

const EMPTY_NAME: &str = "col";

/// Normalize a single column label.
///
/// Does not disambiguate collisions; see [`normalize_names`] for that.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            out.push('_');
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }

    if out.is_empty() {
        return EMPTY_NAME.to_string();
    }
    if RESERVED_KEYWORDS.contains(&out.as_str()) {
        out.push_str("_col");
    }
    out
}

/// Normalize a full set of labels, keeping the output unique.
///
/// The first label that maps to a given identifier keeps it; later ones get `_1`, `_2`, ...
/// (skipping any suffix that is already taken).
pub fn normalize_names<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for label in raw {
        let base = normalize_name(label.as_ref());
        let mut candidate = base.clone();
        let mut n = 0usize;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Return `dataset` with every column renamed by [`normalize_names`].
///
/// The second element pairs each original label with its new identifier, in column order.
pub fn normalize_columns(dataset: &DataSet) -> (DataSet, Vec<(String, String)>) {
    let originals = dataset.column_names();
    let normalized = normalize_names(&originals);

    let mut out = dataset.clone();
    for (field, name) in out.schema.fields.iter_mut().zip(&normalized) {
        field.name.clone_from(name);
    }
    let mapping = originals.into_iter().zip(normalized).collect();
    (out, mapping)
}

#[cfg(test)]
mod tests {
    use super::{normalize_columns, normalize_name, normalize_names};
    use crate::types::{DataSet, Schema};

    #[test]
    fn normalizes_spacing_case_and_symbols() {
        assert_eq!(normalize_name("  Order Date "), "order_date");
        assert_eq!(normalize_name("Unit-Price ($)"), "unit_price_");
        assert_eq!(normalize_name("E-mail\tAddress"), "e_mail_address");
        assert_eq!(normalize_name("2024"), "2024");
    }

    #[test]
    fn reserved_keywords_get_suffix() {
        assert_eq!(normalize_name("order"), "order_col");
        assert_eq!(normalize_name(" SELECT "), "select_col");
        assert_eq!(normalize_name("orders"), "orders");
    }

    #[test]
    fn empty_result_falls_back() {
        assert_eq!(normalize_name("%%%"), "col");
        assert_eq!(normalize_name(""), "col");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let out = normalize_names(&["A B", "A-B", "a_b", "a_b_1"]);
        assert_eq!(out, vec!["a_b", "a_b_1", "a_b_2", "a_b_1_1"]);
    }

    #[test]
    fn normalizing_is_idempotent() {
        let once = normalize_names(&["First Name", "order", "Zip-Code", "first name", "???"]);
        let twice = normalize_names(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_columns_reports_mapping() {
        let ds = DataSet::new(Schema::utf8(&["Customer ID", "Where"]), vec![]);
        let (out, mapping) = normalize_columns(&ds);
        assert_eq!(out.column_names(), vec!["customer_id", "where_col"]);
        assert_eq!(mapping[1], ("Where".to_string(), "where_col".to_string()));
    }
}
