//! Row-wise concatenation.

use std::collections::HashMap;

use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Concatenate `datasets` top to bottom, in slice order.
///
/// The output schema is the union of all column names in first-seen order. Cells for columns a
/// dataset does not have are [`Value::Null`]. A column declared with different types across
/// inputs becomes [`DataType::Utf8`] and its present cells are stringified.
///
/// Columns are matched by exact name; callers that want label-insensitive matching normalize
/// first (see [`super::append`]).
pub fn concat_rows(datasets: &[DataSet]) -> DataSet {
    let mut fields: Vec<Field> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for ds in datasets {
        for field in &ds.schema.fields {
            match positions.get(&field.name) {
                Some(&i) => fields[i].data_type = unify(fields[i].data_type, field.data_type),
                None => {
                    positions.insert(field.name.clone(), fields.len());
                    fields.push(field.clone());
                }
            }
        }
    }

    let total: usize = datasets.iter().map(DataSet::row_count).sum();
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);
    for ds in datasets {
        let targets: Vec<usize> = ds
            .schema
            .fields
            .iter()
            .filter_map(|f| positions.get(&f.name).copied())
            .collect();
        for row in &ds.rows {
            let mut out = vec![Value::Null; fields.len()];
            for (value, &target) in row.iter().zip(&targets) {
                out[target] = conform(value.clone(), fields[target].data_type);
            }
            rows.push(out);
        }
    }

    DataSet::new(Schema::new(fields), rows)
}

/// Resulting type of a column declared as both `a` and `b`.
pub(crate) fn unify(a: DataType, b: DataType) -> DataType {
    if a == b { a } else { DataType::Utf8 }
}

/// Bring a cell in line with its column's (possibly widened) type.
pub(crate) fn conform(value: Value, data_type: DataType) -> Value {
    match (data_type, value) {
        (_, v) if v.is_missing() => v,
        (DataType::Utf8, Value::Utf8(s)) => Value::Utf8(s),
        (DataType::Utf8, v) => Value::Utf8(v.to_string()),
        (_, v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::concat_rows;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    #[test]
    fn union_of_columns_in_first_seen_order() {
        let a = DataSet::new(
            Schema::new(vec![Field::new("a", DataType::Int64), Field::new("b", DataType::Utf8)]),
            vec![vec![Value::Int64(1), Value::Utf8("x".to_string())]],
        );
        let b = DataSet::new(
            Schema::new(vec![Field::new("c", DataType::Bool), Field::new("a", DataType::Int64)]),
            vec![vec![Value::Bool(true), Value::Int64(2)]],
        );
        let out = concat_rows(&[a, b]);
        assert_eq!(out.column_names(), vec!["a", "b", "c"]);
        assert_eq!(out.rows[0], vec![Value::Int64(1), Value::Utf8("x".to_string()), Value::Null]);
        assert_eq!(out.rows[1], vec![Value::Int64(2), Value::Null, Value::Bool(true)]);
    }

    #[test]
    fn conflicting_types_become_text() {
        let a = DataSet::new(
            Schema::new(vec![Field::new("v", DataType::Int64)]),
            vec![vec![Value::Int64(7)], vec![Value::Null]],
        );
        let b = DataSet::new(
            Schema::new(vec![Field::new("v", DataType::Utf8)]),
            vec![vec![Value::Utf8("seven".to_string())]],
        );
        let out = concat_rows(&[a, b]);
        assert_eq!(out.schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Utf8("7".to_string())],
                vec![Value::Null],
                vec![Value::Utf8("seven".to_string())],
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_dataset() {
        let out = concat_rows(&[]);
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.column_count(), 0);
    }
}
