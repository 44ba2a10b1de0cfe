//! Core data model types.
//!
//! Every stage of the engine consumes and produces an in-memory [`DataSet`]: an ordered
//! [`Schema`] of named, typed [`Field`]s plus row-major [`Value`] storage.

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};

/// Logical data type for a schema field.
///
/// This is the *intended* type of a column. Cells that failed coercion or were never populated
/// are still allowed (see [`Value::is_missing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Calendar timestamp.
    Date,
}

impl DataType {
    /// `true` for [`DataType::Int64`] and [`DataType::Float64`].
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Create a schema where every column is [`DataType::Utf8`].
    pub fn utf8<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| Field::new(n.as_ref(), DataType::Utf8))
                .collect(),
        )
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single cell in a [`DataSet`].
///
/// There are two distinct "missing" markers: [`Value::Null`] for a cell that never held data,
/// and [`Value::Invalid`] for a cell whose content could not be coerced to the column's target
/// type. Both answer `true` to [`Value::is_missing`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// Coercion failed; holds the original text for diagnostics.
    Invalid(String),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar timestamp (date-only values are stored at midnight).
    Date(NaiveDateTime),
}

impl Value {
    /// `true` for [`Value::Null`] and [`Value::Invalid`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Null | Self::Invalid(_))
    }

    /// Numeric view of the value, if it is an integer or float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// String form of a present value; `None` for missing cells.
    pub fn to_text(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Hashable identity used for duplicate detection and join matching.
    ///
    /// Both missing markers collapse to the same key, and integral floats compare equal to
    /// the matching integer.
    pub(crate) fn key(&self) -> ValueKey {
        match self {
            Self::Null | Self::Invalid(_) => ValueKey::Missing,
            Self::Int64(v) => ValueKey::Int(*v),
            Self::Float64(v) => {
                if v.fract() == 0.0 && v.abs() < 9.0e15 {
                    ValueKey::Int(*v as i64)
                } else if v.is_nan() {
                    ValueKey::Float(f64::NAN.to_bits())
                } else {
                    ValueKey::Float(v.to_bits())
                }
            }
            Self::Bool(b) => ValueKey::Bool(*b),
            Self::Utf8(s) => ValueKey::Text(s.clone()),
            Self::Date(d) => ValueKey::Date(*d),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Invalid(_) => Ok(()),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1.0e15 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Self::Bool(b) => write!(f, "{b}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Date(d) => {
                if d.time() == NaiveTime::MIN {
                    write!(f, "{}", d.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Missing,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
    Date(NaiveDateTime),
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields. Row
/// positions are always dense and 0-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Build a dataset from column-major storage.
    ///
    /// Columns shorter than the first column are padded with [`Value::Null`].
    pub fn from_columns(schema: Schema, columns: Vec<Vec<Value>>) -> Self {
        let row_count = columns.first().map_or(0, Vec::len);
        let mut iters: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();
        let rows = (0..row_count)
            .map(|_| {
                iters
                    .iter_mut()
                    .map(|it| it.next().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { schema, rows }
    }

    /// Split the dataset into its schema and column-major storage.
    pub fn into_columns(self) -> (Schema, Vec<Vec<Value>>) {
        let mut columns: Vec<Vec<Value>> = (0..self.schema.fields.len())
            .map(|_| Vec::with_capacity(self.rows.len()))
            .collect();
        for row in self.rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        (self.schema, columns)
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.field_names().map(str::to_owned).collect()
    }

    /// Iterate the cells of column `idx` top to bottom.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Number of missing cells in column `idx`.
    pub fn missing_count(&self, idx: usize) -> usize {
        self.column_values(idx).filter(|v| v.is_missing()).count()
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DataSet, DataType, Field, Schema, Value, ValueKey};

    fn sample() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ]);
        DataSet::new(
            schema,
            vec![
                vec![Value::Int64(1), Value::Utf8("a".to_string())],
                vec![Value::Int64(2), Value::Null],
                vec![Value::Int64(3), Value::Invalid("??".to_string())],
            ],
        )
    }

    #[test]
    fn both_missing_markers_are_missing_but_distinct() {
        assert!(Value::Null.is_missing());
        assert!(Value::Invalid("x".to_string()).is_missing());
        assert_ne!(Value::Null, Value::Invalid("x".to_string()));
        assert_eq!(Value::Null.key(), Value::Invalid("x".to_string()).key());
    }

    #[test]
    fn column_round_trip_preserves_rows() {
        let ds = sample();
        let (schema, columns) = ds.clone().into_columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        assert_eq!(DataSet::from_columns(schema, columns), ds);
    }

    #[test]
    fn missing_count_counts_null_and_invalid() {
        let ds = sample();
        assert_eq!(ds.missing_count(0), 0);
        assert_eq!(ds.missing_count(1), 2);
    }

    #[test]
    fn display_formats_floats_and_dates() {
        assert_eq!(Value::Float64(15.0).to_string(), "15.0");
        assert_eq!(Value::Float64(2.5).to_string(), "2.5");
        let d = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-01-05");
        assert_eq!(Value::Null.to_text(), None);
    }

    #[test]
    fn integral_float_key_matches_int() {
        assert_eq!(Value::Float64(3.0).key(), ValueKey::Int(3));
        assert_ne!(Value::Float64(3.5).key(), Value::Int64(3).key());
    }
}
