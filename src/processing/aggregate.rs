//! Group-by aggregation for [`crate::types::DataSet`].

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value, ValueKey};

/// Built-in aggregation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Present (non-missing) values; group size when no value column is given.
    Count,
    /// Distinct present values; group size when no value column is given.
    Distinct,
    /// Sum of numeric values.
    Sum,
    /// Arithmetic mean of numeric values.
    Mean,
    /// Minimum numeric value.
    Min,
    /// Maximum numeric value.
    Max,
}

impl AggregateOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Distinct => "distinct",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    fn is_counting(self) -> bool {
        matches!(self, Self::Count | Self::Distinct)
    }
}

impl FromStr for AggregateOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "distinct" | "nunique" => Ok(Self::Distinct),
            "sum" => Ok(Self::Sum),
            "mean" | "avg" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(EngineError::UnknownVariant {
                kind: "aggregation",
                value: s.to_string(),
            }),
        }
    }
}

/// Aggregate `value_column` with `op`, optionally per group.
///
/// - No `group_by`: a single-row dataset with one column named after `value_column`.
/// - `group_by` without `value_column` (counting ops only): group sizes in a column named
///   after the op.
/// - `group_by` with `value_column`: one row per group, group columns first, then
///   `value_column`.
///
/// Groups appear in first-seen order; rows with a missing group key are left out. Numeric ops
/// read integers, floats, and numeric text, skipping everything else.
///
/// # Errors
///
/// [`EngineError::SchemaMismatch`] for an unknown column, or when the call shape does not
/// name anything to aggregate.
pub fn aggregate(
    dataset: &DataSet,
    group_by: &[&str],
    value_column: Option<&str>,
    op: AggregateOp,
) -> EngineResult<DataSet> {
    let group_idxs: Vec<usize> = group_by
        .iter()
        .map(|name| column_index(dataset, name))
        .collect::<EngineResult<_>>()?;
    let value_idx = value_column.map(|name| column_index(dataset, name)).transpose()?;

    if value_idx.is_none() && (group_idxs.is_empty() || !op.is_counting()) {
        return Err(EngineError::SchemaMismatch {
            message: format!("aggregation '{}' needs a value column", op.name()),
        });
    }

    // Group rows, keeping first-seen order.
    let mut order: Vec<Vec<ValueKey>> = Vec::new();
    let mut groups: HashMap<Vec<ValueKey>, Vec<usize>> = HashMap::new();
    for (i, row) in dataset.rows.iter().enumerate() {
        let cells: Vec<&Value> = group_idxs.iter().filter_map(|&g| row.get(g)).collect();
        if cells.len() != group_idxs.len() || cells.iter().any(|v| v.is_missing()) {
            continue;
        }
        let key: Vec<ValueKey> = cells.into_iter().map(Value::key).collect();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(i);
    }

    let mut fields: Vec<Field> = group_idxs
        .iter()
        .map(|&g| dataset.schema.fields[g].clone())
        .collect();
    let result_name = value_column.unwrap_or(op.name()).to_string();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(order.len());
    let mut result_types: Vec<Option<DataType>> = Vec::with_capacity(order.len());
    for key in &order {
        let members = &groups[key];
        let first = &dataset.rows[members[0]];
        let mut row: Vec<Value> = group_idxs.iter().map(|&g| first[g].clone()).collect();
        let result = match value_idx {
            Some(v) => reduce(members.iter().filter_map(|&i| dataset.rows[i].get(v)), op),
            None => Value::Int64(members.len() as i64),
        };
        result_types.push(type_of(&result));
        row.push(result);
        rows.push(row);
    }

    fields.push(Field::new(result_name, result_type(op, &result_types)));
    Ok(DataSet::new(Schema::new(fields), rows))
}

fn column_index(dataset: &DataSet, name: &str) -> EngineResult<usize> {
    dataset
        .schema
        .index_of(name)
        .ok_or_else(|| EngineError::SchemaMismatch {
            message: format!(
                "aggregation column '{name}' not found. columns={:?}",
                dataset.column_names()
            ),
        })
}

fn reduce<'a>(values: impl Iterator<Item = &'a Value>, op: AggregateOp) -> Value {
    match op {
        AggregateOp::Count => Value::Int64(values.filter(|v| !v.is_missing()).count() as i64),
        AggregateOp::Distinct => {
            let distinct: HashSet<ValueKey> = values.filter(|v| !v.is_missing()).map(Value::key).collect();
            Value::Int64(distinct.len() as i64)
        }
        AggregateOp::Sum | AggregateOp::Mean | AggregateOp::Min | AggregateOp::Max => {
            let numbers: Vec<Value> = values.filter_map(numeric).collect();
            reduce_numeric(&numbers, op)
        }
    }
}

// Integers stay integers for sum/min/max when every input is an integer.
fn reduce_numeric(numbers: &[Value], op: AggregateOp) -> Value {
    let all_int = numbers.iter().all(|v| matches!(v, Value::Int64(_)));
    let floats: Vec<f64> = numbers.iter().filter_map(Value::as_f64).collect();
    if floats.is_empty() {
        return match op {
            AggregateOp::Sum => Value::Int64(0),
            _ => Value::Null,
        };
    }
    if all_int && op != AggregateOp::Mean {
        let ints = numbers.iter().filter_map(|v| match v {
            Value::Int64(i) => Some(*i),
            _ => None,
        });
        let out = match op {
            AggregateOp::Sum => ints.fold(0i64, i64::saturating_add),
            AggregateOp::Min => ints.min().unwrap_or_default(),
            _ => ints.max().unwrap_or_default(),
        };
        return Value::Int64(out);
    }
    let out = match op {
        AggregateOp::Sum => floats.iter().sum(),
        AggregateOp::Mean => floats.iter().sum::<f64>() / floats.len() as f64,
        AggregateOp::Min => floats.iter().copied().fold(f64::INFINITY, f64::min),
        _ => floats.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    Value::Float64(out)
}

fn numeric(v: &Value) -> Option<Value> {
    match v {
        Value::Int64(_) | Value::Float64(_) => Some(v.clone()),
        Value::Utf8(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .map(Value::Int64)
                .ok()
                .or_else(|| t.parse::<f64>().ok().filter(|f| !f.is_nan()).map(Value::Float64))
        }
        _ => None,
    }
}

fn type_of(v: &Value) -> Option<DataType> {
    match v {
        Value::Int64(_) => Some(DataType::Int64),
        Value::Float64(_) => Some(DataType::Float64),
        _ => None,
    }
}

fn result_type(op: AggregateOp, per_group: &[Option<DataType>]) -> DataType {
    if op.is_counting() {
        return DataType::Int64;
    }
    if op == AggregateOp::Mean || per_group.iter().flatten().any(|t| *t == DataType::Float64) {
        DataType::Float64
    } else {
        DataType::Int64
    }
}

#[cfg(test)]
mod tests {
    use super::{aggregate, AggregateOp};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn sales() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("region", DataType::Utf8),
            Field::new("units", DataType::Int64),
            Field::new("price", DataType::Utf8),
        ]);
        let row = |r: Option<&str>, u: Option<i64>, p: &str| {
            vec![
                r.map_or(Value::Null, |s| Value::Utf8(s.to_string())),
                u.map_or(Value::Null, Value::Int64),
                Value::Utf8(p.to_string()),
            ]
        };
        DataSet::new(
            schema,
            vec![
                row(Some("north"), Some(3), "2.5"),
                row(Some("south"), Some(1), "n/a"),
                row(Some("north"), None, "1.5"),
                row(None, Some(9), "9"),
                row(Some("north"), Some(3), "4"),
            ],
        )
    }

    #[test]
    fn whole_column_reductions() {
        let ds = sales();
        let sum = aggregate(&ds, &[], Some("units"), AggregateOp::Sum).unwrap();
        assert_eq!(sum.column_names(), vec!["units"]);
        assert_eq!(sum.rows, vec![vec![Value::Int64(16)]]);

        let mean = aggregate(&ds, &[], Some("price"), AggregateOp::Mean).unwrap();
        assert_eq!(mean.rows, vec![vec![Value::Float64(4.25)]]);

        let count = aggregate(&ds, &[], Some("units"), AggregateOp::Count).unwrap();
        assert_eq!(count.rows, vec![vec![Value::Int64(4)]]);
    }

    #[test]
    fn grouped_values_in_first_seen_order() {
        let out = aggregate(&sales(), &["region"], Some("units"), AggregateOp::Distinct).unwrap();
        assert_eq!(out.column_names(), vec!["region", "units"]);
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Utf8("north".to_string()), Value::Int64(1)],
                vec![Value::Utf8("south".to_string()), Value::Int64(1)],
            ]
        );

        let max = aggregate(&sales(), &["region"], Some("price"), AggregateOp::Max).unwrap();
        assert_eq!(max.schema.fields[1].data_type, DataType::Float64);
        assert_eq!(max.rows[0][1], Value::Float64(4.0));
        assert_eq!(max.rows[1][1], Value::Null);
    }

    #[test]
    fn group_sizes_without_value_column() {
        let out = aggregate(&sales(), &["region"], None, AggregateOp::Count).unwrap();
        assert_eq!(out.column_names(), vec!["region", "count"]);
        assert_eq!(out.rows[0][1], Value::Int64(3));
        assert_eq!(out.rows[1][1], Value::Int64(1));
    }

    #[test]
    fn bad_call_shapes_are_errors() {
        assert!(aggregate(&sales(), &["region"], None, AggregateOp::Sum).is_err());
        assert!(aggregate(&sales(), &[], None, AggregateOp::Count).is_err());
        let err = aggregate(&sales(), &["zone"], Some("units"), AggregateOp::Sum).unwrap_err();
        assert!(err.to_string().contains("aggregation column 'zone' not found"));
        assert!("median".parse::<AggregateOp>().is_err());
    }
}
