//! Rule-driven cleaning of a single [`DataSet`].
//!
//! [`clean_dataset`] runs the full pipeline:
//!
//! 1. normalize column names ([`names`])
//! 2. drop rows where every cell is missing
//! 3. per column, unless the rule says `skip_cleaning`:
//!    coerce the type ([`coerce`]), normalize text ([`text`]), resolve nulls ([`nulls`])
//! 4. remove fully duplicated rows ([`dedup`])
//!
//! and returns the cleaned dataset together with a [`CleaningReport`].
//!
//! Coercion runs before text cleaning so numeric columns are never re-formatted as text, and
//! before null handling so `mean`/`median` see the coerced numbers.
//!
//! ```rust
//! use rust_data_cleaning::cleaning::{clean_dataset, CleaningOptions};
//! use rust_data_cleaning::rules::{ColumnRule, ColumnRules, NullStrategy, TargetType};
//! use rust_data_cleaning::types::{DataSet, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::utf8(&["Price"]),
//!     vec![
//!         vec![Value::Utf8("10".to_string())],
//!         vec![Value::Utf8("20".to_string())],
//!         vec![Value::Utf8("".to_string())],
//!     ],
//! );
//! let rules = ColumnRules::new().with(
//!     "price",
//!     ColumnRule::new()
//!         .with_type(TargetType::Numeric)
//!         .with_null_strategy(NullStrategy::Mean),
//! );
//!
//! let out = clean_dataset(&ds, &rules, &CleaningOptions::default()).unwrap();
//! assert_eq!(out.dataset.rows[2][0], Value::Int64(15));
//! assert_eq!(out.report.types_converted, vec!["price".to_string()]);
//! ```

pub mod coerce;
pub mod dedup;
pub mod names;
pub mod nulls;
pub mod text;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::observability::{report_outcome, EventContext, PipelineObserver, Severity, Stage};
use crate::rules::{ColumnRule, ColumnRules};
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub use dedup::{remove_duplicates, KeepPolicy};

/// Summary of one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Rows in the input dataset.
    pub rows_before: usize,
    /// Rows in the cleaned dataset.
    pub rows_after: usize,
    /// Rows dropped because every cell was missing.
    pub empty_rows_dropped: usize,
    /// Rows removed as exact duplicates.
    pub duplicates_removed: usize,
    /// Missing cells found before resolution, only for columns that had any.
    pub nulls_fixed: BTreeMap<String, usize>,
    /// Columns with an explicit target type, in column order.
    pub types_converted: Vec<String>,
    /// `(original label, normalized name)` for every column, in column order.
    pub renamed: Vec<(String, String)>,
}

/// A cleaned dataset and the report describing how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningOutcome {
    pub dataset: DataSet,
    pub report: CleaningReport,
}

/// Options controlling a cleaning run.
///
/// Use [`Default`] for common cases: sequential, no observer.
#[derive(Clone)]
pub struct CleaningOptions {
    /// Clean columns concurrently on a rayon pool. Output is identical either way.
    pub parallel_columns: bool,
    /// Worker threads for `parallel_columns`. `None` uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Name used for this dataset in observer events.
    pub dataset_name: String,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for CleaningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleaningOptions")
            .field("parallel_columns", &self.parallel_columns)
            .field("num_threads", &self.num_threads)
            .field("dataset_name", &self.dataset_name)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            parallel_columns: false,
            num_threads: None,
            dataset_name: "dataset".to_string(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Clean `dataset` according to `rules`.
///
/// The input is never modified. On error nothing is returned, so callers never observe a
/// partially cleaned dataset.
///
/// # Errors
///
/// - [`crate::EngineError::InvalidRule`] if a rule cannot apply to its column (e.g. `mean` on
///   a text column).
/// - [`crate::EngineError::ThreadPool`] if `parallel_columns` is set and the pool cannot be built.
pub fn clean_dataset(
    dataset: &DataSet,
    rules: &ColumnRules,
    options: &CleaningOptions,
) -> EngineResult<CleaningOutcome> {
    let result = run_cleaning(dataset, rules, options);
    let ctx = EventContext::new(Stage::Clean, options.dataset_name.as_str());
    report_outcome(
        options.observer.as_ref(),
        options.alert_at_or_above,
        &ctx,
        &result,
        |o| o.dataset.row_count(),
    );
    result
}

/// Structural cleanup only: normalize names, drop all-missing rows, drop duplicate rows.
///
/// This is what consolidation applies to every input before combining.
pub fn basic_clean(dataset: &DataSet) -> EngineResult<CleaningOutcome> {
    let rows_before = dataset.row_count();
    let (named, renamed) = names::normalize_columns(dataset);
    let (non_empty, empty_rows_dropped) = drop_empty_rows(named);
    let (deduped, duplicates_removed) = remove_duplicates(&non_empty, None, KeepPolicy::First)?;

    let report = CleaningReport {
        rows_before,
        rows_after: deduped.row_count(),
        empty_rows_dropped,
        duplicates_removed,
        renamed,
        ..CleaningReport::default()
    };
    Ok(CleaningOutcome {
        dataset: deduped,
        report,
    })
}

fn run_cleaning(
    dataset: &DataSet,
    rules: &ColumnRules,
    options: &CleaningOptions,
) -> EngineResult<CleaningOutcome> {
    rules.validate()?;

    let rows_before = dataset.row_count();
    let (named, renamed) = names::normalize_columns(dataset);
    let (non_empty, empty_rows_dropped) = drop_empty_rows(named);

    let (schema, columns) = non_empty.into_columns();
    let jobs: Vec<(Field, Vec<Value>)> = schema.fields.into_iter().zip(columns).collect();

    let cleaned: Vec<EngineResult<CleanedColumn>> = if options.parallel_columns {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = options.num_threads {
            builder = builder.num_threads(n.max(1));
        }
        let pool = builder.build()?;
        pool.install(|| {
            jobs.into_par_iter()
                .map(|(field, values)| {
                    let rule = rules.get(&field.name);
                    clean_column(field, values, rule)
                })
                .collect()
        })
    } else {
        jobs.into_iter()
            .map(|(field, values)| {
                let rule = rules.get(&field.name);
                clean_column(field, values, rule)
            })
            .collect()
    };

    let mut report = CleaningReport {
        rows_before,
        empty_rows_dropped,
        renamed,
        ..CleaningReport::default()
    };
    let mut fields = Vec::with_capacity(cleaned.len());
    let mut columns = Vec::with_capacity(cleaned.len());
    for column in cleaned {
        let column = column?;
        if column.coerced {
            report.types_converted.push(column.field.name.clone());
        }
        if let Some(n) = column.nulls_fixed {
            report.nulls_fixed.insert(column.field.name.clone(), n);
        }
        fields.push(column.field);
        columns.push(column.values);
    }

    let assembled = DataSet::from_columns(Schema::new(fields), columns);
    let (deduped, duplicates_removed) = remove_duplicates(&assembled, None, KeepPolicy::First)?;
    report.duplicates_removed = duplicates_removed;
    report.rows_after = deduped.row_count();

    tracing::debug!(
        dataset = %options.dataset_name,
        rows_before = report.rows_before,
        rows_after = report.rows_after,
        duplicates_removed,
        "cleaned dataset"
    );

    Ok(CleaningOutcome {
        dataset: deduped,
        report,
    })
}

struct CleanedColumn {
    field: Field,
    values: Vec<Value>,
    coerced: bool,
    nulls_fixed: Option<usize>,
}

fn clean_column(
    field: Field,
    values: Vec<Value>,
    rule: Option<&ColumnRule>,
) -> EngineResult<CleanedColumn> {
    let default_rule = ColumnRule::default();
    let rule = rule.unwrap_or(&default_rule);

    if rule.skip_cleaning {
        tracing::debug!(column = %field.name, "skipping column");
        return Ok(CleanedColumn {
            field,
            values,
            coerced: false,
            nulls_fixed: None,
        });
    }

    let (values, data_type, coerced) = match rule.target_type {
        Some(target) => {
            let (values, data_type) = coerce::coerce_column(values, target);
            (values, data_type, true)
        }
        None => {
            let (values, data_type) = coerce::auto_detect(values, field.data_type);
            (values, data_type, false)
        }
    };

    let values = if data_type == DataType::Utf8 && !text::is_exempt(&field.name) {
        text::normalize_text_column(values, rule.casing.unwrap_or_default())
    } else {
        values
    };

    let missing = values.iter().filter(|v| v.is_missing()).count();
    let (values, data_type, nulls_fixed) = if missing > 0 {
        let strategy = rule.null_strategy.unwrap_or_default();
        let (values, data_type) = nulls::resolve_nulls(&field.name, values, data_type, strategy)?;
        (values, data_type, Some(missing))
    } else {
        (values, data_type, None)
    };

    Ok(CleanedColumn {
        field: Field::new(field.name, data_type),
        values,
        coerced,
        nulls_fixed,
    })
}

fn drop_empty_rows(mut dataset: DataSet) -> (DataSet, usize) {
    let before = dataset.row_count();
    dataset
        .rows
        .retain(|row| row.iter().any(|v| !v.is_missing()));
    let dropped = before - dataset.row_count();
    (dataset, dropped)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{basic_clean, clean_dataset, CleaningOptions};
    use crate::error::EngineError;
    use crate::rules::{Casing, ColumnRule, ColumnRules, NullStrategy, TargetType};
    use crate::types::{DataSet, DataType, Schema, Value};

    fn text(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    fn raw() -> DataSet {
        DataSet::new(
            Schema::utf8(&["Customer Name", "Amount", "Order", "Contact Email"]),
            vec![
                vec![text("  ada   LOVELACE "), text("10"), text("A-1"), text("Ada@Example.com")],
                vec![Value::Null, Value::Null, Value::Null, Value::Null],
                vec![text("grace hopper"), Value::Null, text("A-2"), text("GRACE@navy.mil")],
                vec![text("grace hopper"), Value::Null, text("A-2"), text("GRACE@navy.mil")],
            ],
        )
    }

    #[test]
    fn default_rules_normalize_everything() {
        let out = clean_dataset(&raw(), &ColumnRules::new(), &CleaningOptions::default()).unwrap();
        let ds = &out.dataset;
        assert_eq!(ds.column_names(), vec!["customer_name", "amount", "order_col", "contact_email"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.rows[0][0], text("Ada Lovelace"));
        // auto-detected numeric, then the placeholder turns it textual
        assert_eq!(ds.rows[0][1], Value::Int64(10));
        assert_eq!(ds.rows[1][1], text("Unknown"));
        assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
        // email columns keep their casing
        assert_eq!(ds.rows[0][3], text("Ada@Example.com"));

        let report = &out.report;
        assert_eq!(report.rows_before, 4);
        assert_eq!(report.empty_rows_dropped, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.rows_after, 2);
        assert_eq!(report.nulls_fixed, BTreeMap::from([("amount".to_string(), 2)]));
        assert!(report.types_converted.is_empty());
    }

    #[test]
    fn explicit_numeric_mean_fills_from_coerced_values() {
        let ds = DataSet::new(
            Schema::utf8(&["score"]),
            vec![vec![text("10")], vec![text("20")], vec![text("")]],
        );
        let rules = ColumnRules::new().with(
            "score",
            ColumnRule::new()
                .with_type(TargetType::Numeric)
                .with_null_strategy(NullStrategy::Mean),
        );
        let out = clean_dataset(&ds, &rules, &CleaningOptions::default()).unwrap();
        assert_eq!(
            out.dataset.rows,
            vec![vec![Value::Int64(10)], vec![Value::Int64(20)], vec![Value::Int64(15)]]
        );
        assert_eq!(out.report.types_converted, vec!["score".to_string()]);
        assert_eq!(out.report.nulls_fixed.get("score"), Some(&1));
    }

    #[test]
    fn skip_cleaning_leaves_column_untouched() {
        let rules = ColumnRules::new().with("Customer Name", ColumnRule::new().skipped());
        let out = clean_dataset(&raw(), &rules, &CleaningOptions::default()).unwrap();
        assert_eq!(out.dataset.rows[0][0], text("  ada   LOVELACE "));
        assert!(!out.report.nulls_fixed.contains_key("customer_name"));
    }

    #[test]
    fn casing_rule_is_applied() {
        let rules = ColumnRules::new().with("order", ColumnRule::new().with_casing(Casing::Lower));
        let out = clean_dataset(&raw(), &rules, &CleaningOptions::default()).unwrap();
        assert_eq!(out.dataset.rows[1][2], text("a-2"));
    }

    #[test]
    fn mean_on_auto_detected_text_fails_without_partial_output() {
        let ds = DataSet::new(
            Schema::utf8(&["customer_name", "order"]),
            vec![vec![text("x"), text("a-1")], vec![Value::Null, text("a-2")]],
        );
        let before = ds.clone();
        let rules = ColumnRules::new().with(
            "customer_name",
            ColumnRule::new().with_null_strategy(NullStrategy::Mean),
        );
        let err = clean_dataset(&ds, &rules, &CleaningOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRule { ref column, .. } if column == "customer_name"));
        assert_eq!(ds, before);
    }

    #[test]
    fn mean_on_an_all_missing_column_leaves_it_alone() {
        let ds = DataSet::new(
            Schema::utf8(&["name", "price"]),
            vec![vec![text("ada"), Value::Null], vec![text("bob"), Value::Null]],
        );
        let rules = ColumnRules::new().with("price", ColumnRule::new().with_null_strategy(NullStrategy::Mean));
        let out = clean_dataset(&ds, &rules, &CleaningOptions::default()).unwrap();
        assert_eq!(out.dataset.row_count(), 2);
        assert!(out.dataset.rows.iter().all(|r| r[1] == Value::Null));
        assert_eq!(out.report.nulls_fixed.get("price"), Some(&2));
    }

    #[test]
    fn parallel_columns_match_sequential() {
        let rules = ColumnRules::new().with("amount", ColumnRule::new().with_null_strategy(NullStrategy::Zero));
        let seq = clean_dataset(&raw(), &rules, &CleaningOptions::default()).unwrap();
        let par = clean_dataset(
            &raw(),
            &rules,
            &CleaningOptions {
                parallel_columns: true,
                num_threads: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn basic_clean_only_touches_structure() {
        let out = basic_clean(&raw()).unwrap();
        assert_eq!(out.dataset.row_count(), 2);
        assert_eq!(out.dataset.rows[0][0], text("  ada   LOVELACE "));
        assert_eq!(out.report.duplicates_removed, 1);
        assert_eq!(out.report.empty_rows_dropped, 1);
    }
}
