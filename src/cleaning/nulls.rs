//! Missing-value resolution.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::rules::NullStrategy;
use crate::types::{DataType, Value, ValueKey};

/// Fill (or keep) the missing cells of one column according to `strategy`.
///
/// Returns the new cells and the column's resulting [`DataType`]; only
/// [`NullStrategy::Placeholder`] and a fractional statistic on an integer column change it.
///
/// # Errors
///
/// [`EngineError::InvalidRule`] when the strategy cannot apply to the column type: `mean`/
/// `median` on a non-numeric column that holds at least one present value, or `zero` on a
/// boolean/date column.
pub fn resolve_nulls(
    column: &str,
    values: Vec<Value>,
    data_type: DataType,
    strategy: NullStrategy,
) -> EngineResult<(Vec<Value>, DataType)> {
    if strategy.requires_numeric() {
        // No present value: nothing to compute from, and no evidence the column is non-numeric.
        if values.iter().all(Value::is_missing) {
            return Ok((values, data_type));
        }
        if !data_type.is_numeric() {
            return Err(invalid(column, strategy, data_type));
        }
    }

    match strategy {
        NullStrategy::Keep => Ok((values, data_type)),
        NullStrategy::Zero => {
            let zero = match data_type {
                DataType::Int64 => Value::Int64(0),
                DataType::Float64 => Value::Float64(0.0),
                DataType::Utf8 => Value::Utf8("0".to_string()),
                DataType::Bool | DataType::Date => return Err(invalid(column, strategy, data_type)),
            };
            Ok((fill(values, &zero), data_type))
        }
        NullStrategy::Mean | NullStrategy::Median => {
            let mut present: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            let stat = if strategy == NullStrategy::Mean {
                mean(&present)
            } else {
                median(&mut present)
            };
            match stat {
                Some(stat) => Ok(fill_statistic(values, data_type, stat)),
                None => Ok((values, data_type)),
            }
        }
        NullStrategy::Mode => match mode(&values) {
            Some(m) => Ok((fill(values, &m), data_type)),
            None => Ok((values, data_type)),
        },
        NullStrategy::ForwardFill => Ok((forward_fill(values), data_type)),
        NullStrategy::Placeholder => {
            let placeholder = Value::Utf8(NullStrategy::PLACEHOLDER.to_string());
            Ok((fill(values, &placeholder), DataType::Utf8))
        }
    }
}

fn invalid(column: &str, strategy: NullStrategy, data_type: DataType) -> EngineError {
    EngineError::InvalidRule {
        column: column.to_string(),
        message: format!("null strategy {strategy:?} cannot be applied to a {data_type:?} column"),
    }
}

fn fill(values: Vec<Value>, with: &Value) -> Vec<Value> {
    values
        .into_iter()
        .map(|v| if v.is_missing() { with.clone() } else { v })
        .collect()
}

// Integer columns stay integer when the statistic is integral; otherwise the column is promoted.
fn fill_statistic(values: Vec<Value>, data_type: DataType, stat: f64) -> (Vec<Value>, DataType) {
    if data_type == DataType::Int64 && stat.fract() == 0.0 {
        return (fill(values, &Value::Int64(stat as i64)), DataType::Int64);
    }
    let promoted = values
        .into_iter()
        .map(|v| match v {
            Value::Int64(i) => Value::Float64(i as f64),
            other => other,
        })
        .collect();
    (fill(promoted, &Value::Float64(stat)), DataType::Float64)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

// Ties resolve to whichever value was seen first.
fn mode(values: &[Value]) -> Option<Value> {
    let mut counts: HashMap<ValueKey, (usize, usize)> = HashMap::new();
    for (pos, v) in values.iter().enumerate().filter(|(_, v)| !v.is_missing()) {
        counts.entry(v.key()).or_insert((0, pos)).0 += 1;
    }
    counts
        .into_values()
        .max_by(|(ca, pa), (cb, pb)| ca.cmp(cb).then(pb.cmp(pa)))
        .and_then(|(_, pos)| values.get(pos).cloned())
}

fn forward_fill(values: Vec<Value>) -> Vec<Value> {
    let mut last: Option<Value> = None;
    values
        .into_iter()
        .map(|v| {
            if v.is_missing() {
                last.clone().unwrap_or(v)
            } else {
                last = Some(v.clone());
                v
            }
        })
        .collect()
}
