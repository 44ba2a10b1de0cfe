//! Combining several datasets into one.
//!
//! Every input first goes through [`crate::cleaning::basic_clean`] so that column labels line
//! up (`"Order ID"` and `"order id"` both become `order_id`). After that:
//!
//! - [`append`] stacks rows in collection order,
//! - [`merge`] joins left to right on a key column.
//!
//! [`consolidate`] dispatches on a [`ConsolidationMode`], which also names the export file.

pub mod append;
pub mod collection;
pub mod merge;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cleaning::{basic_clean, names::normalize_name};
use crate::error::{EngineError, EngineResult};
use crate::types::DataSet;

pub use append::concat_rows;
pub use collection::{dataset_id_from_path, CollectionEntry, DatasetCollection};
pub use merge::JoinKind;

use merge::JoinSide;

/// How a collection is combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum ConsolidationMode {
    /// Stack all rows.
    Append,
    /// Stack all rows, and keep the per-dataset tables for a multi-sheet workbook.
    Master,
    /// Join on `key`.
    Merge { key: String, join: JoinKind },
}

impl ConsolidationMode {
    /// File name of the consolidated CSV export.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Append => "append_export.csv",
            Self::Master => "master_export.csv",
            Self::Merge { .. } => "merged_export.csv",
        }
    }
}

impl FromStr for ConsolidationMode {
    type Err = EngineError;

    /// Parses `append`, `master`, or `merge:<key>[:<join>]` (join defaults to `inner`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, ':');
        let head = parts.next().unwrap_or_default().to_ascii_lowercase();
        match head.as_str() {
            "append" => Ok(Self::Append),
            "master" => Ok(Self::Master),
            "merge" => {
                let key = parts
                    .next()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| EngineError::UnknownVariant {
                        kind: "consolidation mode",
                        value: s.to_string(),
                    })?;
                let join = parts.next().map(JoinKind::from_str).transpose()?.unwrap_or_default();
                Ok(Self::Merge {
                    key: key.trim().to_string(),
                    join,
                })
            }
            _ => Err(EngineError::UnknownVariant {
                kind: "consolidation mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Combine `collection` according to `mode`.
pub fn consolidate(collection: &DatasetCollection, mode: &ConsolidationMode) -> EngineResult<DataSet> {
    match mode {
        ConsolidationMode::Append | ConsolidationMode::Master => append(collection),
        ConsolidationMode::Merge { key, join } => merge(collection, key, *join),
    }
}

/// Structurally clean each dataset, then stack all rows in collection order.
///
/// Columns missing from a dataset are `Null` for its rows.
pub fn append(collection: &DatasetCollection) -> EngineResult<DataSet> {
    let cleaned = cleaned_inputs(collection)?;
    let datasets: Vec<DataSet> = cleaned.into_iter().map(|(_, ds)| ds).collect();
    let out = concat_rows(&datasets);
    tracing::debug!(
        datasets = datasets.len(),
        rows = out.row_count(),
        columns = out.column_count(),
        "appended datasets"
    );
    Ok(out)
}

/// Structurally clean each dataset, then join them left to right on `key`.
///
/// `key` is normalized like any column label. An empty collection yields an empty dataset and
/// a single dataset is returned as is (after cleaning), provided it has the key.
///
/// # Errors
///
/// [`EngineError::MissingMergeKey`] naming the first dataset without the key.
pub fn merge(collection: &DatasetCollection, key: &str, join: JoinKind) -> EngineResult<DataSet> {
    let key = normalize_name(key);
    let cleaned = cleaned_inputs(collection)?;

    // Check every input up front so the error names the offending dataset.
    for (id, ds) in &cleaned {
        JoinSide::new(id, ds, &key)?;
    }

    let mut inputs = cleaned.into_iter();
    let Some((first_id, mut acc)) = inputs.next() else {
        return Ok(DataSet::default());
    };
    let mut acc_name = first_id;
    for (id, ds) in inputs {
        let left = JoinSide::new(&acc_name, &acc, &key)?;
        let right = JoinSide::new(&id, &ds, &key)?;
        let joined = merge::join(&left, &right, join);
        acc_name = format!("{acc_name}+{id}");
        acc = joined;
    }
    Ok(acc)
}

fn cleaned_inputs(collection: &DatasetCollection) -> EngineResult<Vec<(String, DataSet)>> {
    collection
        .iter()
        .map(|entry| Ok((entry.id.clone(), basic_clean(&entry.dataset)?.dataset)))
        .collect()
}
