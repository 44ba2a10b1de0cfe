//! Whitespace and casing normalization for textual columns.

use crate::rules::Casing;
use crate::types::Value;

/// Columns whose name contains one of these are never re-cased.
const EXEMPT_NAME_PARTS: &[&str] = &["email", "url"];

/// `true` if a column holds addresses/identifiers that must keep their original casing.
pub fn is_exempt(column: &str) -> bool {
    EXEMPT_NAME_PARTS.iter().any(|part| column.contains(part))
}

/// Trim, collapse inner whitespace runs to a single space, then apply `casing`.
pub fn normalize_text(raw: &str, casing: Casing) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match casing {
        Casing::Upper => collapsed.to_uppercase(),
        Casing::Lower => collapsed.to_lowercase(),
        Casing::Title => title_case(&collapsed),
    }
}

/// Normalize every present cell of a column. Missing cells are left as they are.
pub fn normalize_text_column(values: Vec<Value>, casing: Casing) -> Vec<Value> {
    values
        .into_iter()
        .map(|v| match v.to_text() {
            Some(text) => Value::Utf8(normalize_text(&text, casing)),
            None => v,
        })
        .collect()
}

// A letter is upper-cased when it follows a non-letter, lower-cased otherwise.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
