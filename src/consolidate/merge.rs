//! Key-based joins.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cleaning::names::normalize_names;
use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value, ValueKey};

use super::append::{conform, unify};

/// Join kind used when merging datasets on a key column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    /// Only keys present on both sides.
    #[default]
    Inner,
    /// Every left row, with matches where they exist.
    Left,
    /// Every right row, with matches where they exist.
    Right,
    /// Every row from both sides.
    Outer,
}

impl FromStr for JoinKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "outer" | "full" => Ok(Self::Outer),
            _ => Err(EngineError::UnknownVariant {
                kind: "join kind",
                value: s.to_string(),
            }),
        }
    }
}

/// One side of a join: the dataset, its name for error messages, and its key column index.
pub(crate) struct JoinSide<'a> {
    pub(crate) name: &'a str,
    pub(crate) dataset: &'a DataSet,
    key_idx: usize,
}

impl<'a> JoinSide<'a> {
    /// Locate `key` in `dataset`.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingMergeKey`] listing the dataset's columns.
    pub(crate) fn new(name: &'a str, dataset: &'a DataSet, key: &str) -> EngineResult<Self> {
        let key_idx = dataset
            .schema
            .index_of(key)
            .ok_or_else(|| EngineError::MissingMergeKey {
                key: key.to_string(),
                dataset: name.to_string(),
                available: dataset.column_names(),
            })?;
        Ok(Self {
            name,
            dataset,
            key_idx,
        })
    }

    // Keys are compared in the joined key column's type, so a widened key matches as text.
    fn key_of(&self, row: &[Value], key_type: DataType) -> Option<ValueKey> {
        row.get(self.key_idx)
            .filter(|v| !v.is_missing())
            .map(|v| conform(v.clone(), key_type).key())
    }

    // Row positions grouped by key, in row order. Missing keys are left out so they never match.
    fn index(&self, key_type: DataType) -> HashMap<ValueKey, Vec<usize>> {
        let mut index: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        for (i, row) in self.dataset.rows.iter().enumerate() {
            if let Some(k) = self.key_of(row, key_type) {
                index.entry(k).or_default().push(i);
            }
        }
        index
    }
}

/// Join two datasets on their key columns.
///
/// Output columns: every left column (the key stays where it is on the left), then every
/// right column except the key. Non-key names present on both sides get `_x` (left) and `_y`
/// (right) suffixes.
///
/// Row order: `inner`/`left` follow the left rows, each expanded by its matches in right order;
/// `right` follows the right rows the same way; `outer` is the `left` result followed by the
/// right rows that matched nothing.
///
/// When the key columns disagree on type, the key becomes `Utf8` and keys match on their text.
pub(crate) fn join(left: &JoinSide<'_>, right: &JoinSide<'_>, kind: JoinKind) -> DataSet {
    let schema = joined_schema(left, right);
    let key_type = schema.fields[left.key_idx].data_type;
    let left_width = left.dataset.column_count();

    let assemble = |l: Option<usize>, r: Option<usize>| -> Vec<Value> {
        let mut row: Vec<Value> = match l {
            Some(i) => left.dataset.rows[i].clone(),
            None => vec![Value::Null; left_width],
        };
        if let Some(j) = r {
            let right_row = &right.dataset.rows[j];
            if l.is_none() {
                if let Some(k) = right_row.get(right.key_idx) {
                    row[left.key_idx] = k.clone();
                }
            }
            row.extend(
                right_row
                    .iter()
                    .enumerate()
                    .filter(|(c, _)| *c != right.key_idx)
                    .map(|(_, v)| v.clone()),
            );
        } else {
            row.extend(std::iter::repeat_n(Value::Null, right.dataset.column_count().saturating_sub(1)));
        }
        row[left.key_idx] = conform(std::mem::replace(&mut row[left.key_idx], Value::Null), key_type);
        row
    };

    let mut rows: Vec<Vec<Value>> = Vec::new();
    match kind {
        JoinKind::Inner | JoinKind::Left | JoinKind::Outer => {
            let index = right.index(key_type);
            let mut right_matched = vec![false; right.dataset.row_count()];
            for (i, row) in left.dataset.rows.iter().enumerate() {
                let matches = left.key_of(row, key_type).and_then(|k| index.get(&k));
                match matches {
                    Some(js) => {
                        for &j in js {
                            right_matched[j] = true;
                            rows.push(assemble(Some(i), Some(j)));
                        }
                    }
                    None if kind != JoinKind::Inner => rows.push(assemble(Some(i), None)),
                    None => {}
                }
            }
            if kind == JoinKind::Outer {
                for (j, matched) in right_matched.iter().enumerate() {
                    if !matched {
                        rows.push(assemble(None, Some(j)));
                    }
                }
            }
        }
        JoinKind::Right => {
            let index = left.index(key_type);
            for (j, row) in right.dataset.rows.iter().enumerate() {
                match right.key_of(row, key_type).and_then(|k| index.get(&k)) {
                    Some(is) => {
                        for &i in is {
                            rows.push(assemble(Some(i), Some(j)));
                        }
                    }
                    None => rows.push(assemble(None, Some(j))),
                }
            }
        }
    }

    tracing::debug!(
        left = left.name,
        right = right.name,
        ?kind,
        rows = rows.len(),
        "joined datasets"
    );

    DataSet::new(schema, rows)
}

fn joined_schema(left: &JoinSide<'_>, right: &JoinSide<'_>) -> Schema {
    let left_key = &left.dataset.schema.fields[left.key_idx];
    let right_key = &right.dataset.schema.fields[right.key_idx];

    let right_fields: Vec<&Field> = right
        .dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(c, _)| *c != right.key_idx)
        .map(|(_, f)| f)
        .collect();
    let overlaps = |name: &str| name != left_key.name && right_fields.iter().any(|f| f.name == name);

    let mut fields: Vec<Field> = left
        .dataset
        .schema
        .fields
        .iter()
        .map(|f| {
            if overlaps(&f.name) {
                Field::new(format!("{}_x", f.name), f.data_type)
            } else {
                f.clone()
            }
        })
        .collect();
    fields[left.key_idx].data_type = unify(left_key.data_type, right_key.data_type);

    let left_has = |name: &str| {
        left.dataset
            .schema
            .fields
            .iter()
            .enumerate()
            .any(|(c, f)| c != left.key_idx && f.name == name)
    };
    fields.extend(right_fields.into_iter().map(|f| {
        if left_has(&f.name) {
            Field::new(format!("{}_y", f.name), f.data_type)
        } else {
            f.clone()
        }
    }));

    // A suffixed name can still clash with an existing column; keep names unique.
    let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
    for (field, name) in fields.iter_mut().zip(normalize_names(&names)) {
        field.name = name;
    }
    Schema::new(fields)
}
