//! Duplicate row elimination.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, Value, ValueKey};

/// Which member of a group of duplicate rows survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// Keep the first occurrence.
    #[default]
    First,
    /// Keep the last occurrence.
    Last,
    /// Drop every row that has a duplicate.
    None,
}

impl FromStr for KeepPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "none" => Ok(Self::None),
            _ => Err(EngineError::UnknownVariant {
                kind: "keep policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Remove rows whose `subset` columns (all columns when `None`) repeat an earlier row.
///
/// Surviving rows keep their relative order. Returns the de-duplicated dataset and the number
/// of rows removed. Missing cells compare equal to each other.
///
/// # Errors
///
/// [`EngineError::SchemaMismatch`] if a subset column does not exist.
pub fn remove_duplicates(
    dataset: &DataSet,
    subset: Option<&[&str]>,
    keep: KeepPolicy,
) -> EngineResult<(DataSet, usize)> {
    let idxs: Vec<usize> = match subset {
        None => (0..dataset.column_count()).collect(),
        Some(names) => names
            .iter()
            .map(|name| {
                dataset
                    .schema
                    .index_of(name)
                    .ok_or_else(|| EngineError::SchemaMismatch {
                        message: format!(
                            "duplicate key column '{name}' not found. columns={:?}",
                            dataset.column_names()
                        ),
                    })
            })
            .collect::<EngineResult<_>>()?,
    };

    let keys: Vec<Vec<ValueKey>> = dataset.rows.iter().map(|row| row_key(row, &idxs)).collect();
    let retained = retained_mask(&keys, keep);

    let rows: Vec<Vec<Value>> = dataset
        .rows
        .iter()
        .zip(&retained)
        .filter(|(_, kept)| **kept)
        .map(|(row, _)| row.clone())
        .collect();
    let removed = dataset.row_count() - rows.len();

    Ok((DataSet::new(dataset.schema.clone(), rows), removed))
}

fn row_key(row: &[Value], idxs: &[usize]) -> Vec<ValueKey> {
    idxs.iter()
        .map(|&i| row.get(i).map_or(ValueKey::Missing, Value::key))
        .collect()
}

fn retained_mask(keys: &[Vec<ValueKey>], keep: KeepPolicy) -> Vec<bool> {
    match keep {
        KeepPolicy::First => {
            let mut seen: HashSet<&[ValueKey]> = HashSet::with_capacity(keys.len());
            keys.iter().map(|k| seen.insert(k.as_slice())).collect()
        }
        KeepPolicy::Last => {
            let mut seen: HashSet<&[ValueKey]> = HashSet::with_capacity(keys.len());
            let mut mask: Vec<bool> = keys.iter().rev().map(|k| seen.insert(k.as_slice())).collect();
            mask.reverse();
            mask
        }
        KeepPolicy::None => {
            let mut counts: HashMap<&[ValueKey], usize> = HashMap::with_capacity(keys.len());
            for k in keys {
                *counts.entry(k.as_slice()).or_default() += 1;
            }
            keys.iter().map(|k| counts.get(k.as_slice()) == Some(&1)).collect()
        }
    }
}
