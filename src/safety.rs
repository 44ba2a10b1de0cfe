//! Pre-persistence checks.
//!
//! Strict sinks (relational stores in particular) reject embedded NUL bytes and may reject
//! missing values. [`safety_issues`] reports both so the caller can act before writing.

use crate::types::{DataSet, DataType, Value};

/// Scan `dataset` and describe every column that is unsafe for structured storage.
///
/// Per column, in column order: `"Invalid character in column: <col>"` when a text column
/// contains `\0`, then `"Remaining NULLs in column: <col>"` when any cell is missing. An empty
/// list means the dataset is safe.
pub fn safety_issues(dataset: &DataSet) -> Vec<String> {
    let mut issues = Vec::new();
    for (idx, field) in dataset.schema.fields.iter().enumerate() {
        if field.data_type == DataType::Utf8 && has_nul(dataset, idx) {
            issues.push(format!("Invalid character in column: {}", field.name));
        }
        if dataset.missing_count(idx) > 0 {
            issues.push(format!("Remaining NULLs in column: {}", field.name));
        }
    }
    if !issues.is_empty() {
        tracing::warn!(issues = issues.len(), "dataset is not safe to persist");
    }
    issues
}

fn has_nul(dataset: &DataSet, idx: usize) -> bool {
    dataset
        .column_values(idx)
        .any(|v| matches!(v, Value::Utf8(s) if s.contains('\0')))
}

#[cfg(test)]
mod tests {
    use super::safety_issues;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    #[test]
    fn clean_dataset_has_no_issues() {
        let ds = DataSet::new(Schema::utf8(&["a"]), vec![vec![Value::Utf8("ok".to_string())]]);
        assert!(safety_issues(&ds).is_empty());
    }

    #[test]
    fn one_missing_cell_gives_exactly_one_issue() {
        let ds = DataSet::new(
            Schema::new(vec![Field::new("a", DataType::Utf8), Field::new("b", DataType::Int64)]),
            vec![
                vec![Value::Utf8("x".to_string()), Value::Int64(1)],
                vec![Value::Utf8("y".to_string()), Value::Invalid("??".to_string())],
            ],
        );
        assert_eq!(safety_issues(&ds), vec!["Remaining NULLs in column: b".to_string()]);
    }

    #[test]
    fn nul_bytes_are_flagged_only_in_text_columns() {
        let ds = DataSet::new(
            Schema::utf8(&["note"]),
            vec![vec![Value::Utf8("bad\0byte".to_string())], vec![Value::Null]],
        );
        assert_eq!(
            safety_issues(&ds),
            vec![
                "Invalid character in column: note".to_string(),
                "Remaining NULLs in column: note".to_string(),
            ]
        );
    }
}
