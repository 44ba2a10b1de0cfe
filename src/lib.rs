//! `rust-data-cleaning` cleans and consolidates tabular datasets held in memory as
//! [`types::DataSet`] values.
//!
//! The core is [`cleaning::clean_dataset`], which takes a dataset and a per-column
//! [`rules::ColumnRules`] map and returns the cleaned dataset together with a
//! [`cleaning::CleaningReport`]:
//!
//! 1. column labels become safe, unique identifiers (`"Order Date"` → `order_date`,
//!    `"order"` → `order_col`)
//! 2. rows where every cell is missing are dropped
//! 3. each column is coerced (`numeric`, `date`, `text`, or auto-detected), has its text
//!    whitespace/casing normalized, and has its missing cells resolved by a
//!    [`rules::NullStrategy`]
//! 4. exact duplicate rows are removed
//!
//! Several datasets can then be combined with [`consolidate`] (append or key-based merge), checked
//! with [`safety::safety_issues`] before they go to a strict sink, and written out with
//! [`export`].
//!
//! ## What you can read and write
//!
//! - **CSV / TSV**: `.csv`, `.tsv` (blank cells and NA tokens such as `NA`, `N/A`, `null` read as
//!   missing)
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): read `.xlsx`, `.xls`, `.xlsm`,
//!   `.xlsb`, `.ods`; write `.xlsx`
//!
//! ## Quick example: ingest, clean, check
//!
//! ```no_run
//! use rust_data_cleaning::cleaning::{clean_dataset, CleaningOptions};
//! use rust_data_cleaning::ingestion::{ingest_from_path, IngestionOptions};
//! use rust_data_cleaning::rules::ColumnRules;
//! use rust_data_cleaning::safety::safety_issues;
//!
//! # fn main() -> Result<(), rust_data_cleaning::EngineError> {
//! let raw = ingest_from_path("orders.csv", &IngestionOptions::default())?;
//! let rules = ColumnRules::from_json_str(
//!     r#"{"Unit Price": {"type": "numeric", "null_strategy": "median"}}"#,
//! )?;
//!
//! let out = clean_dataset(&raw, &rules, &CleaningOptions::default())?;
//! println!("{:?}", out.report);
//! for issue in safety_issues(&out.dataset) {
//!     eprintln!("{issue}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Quick example: consolidate a folder
//!
//! ```no_run
//! use rust_data_cleaning::consolidate::{ConsolidationMode, DatasetCollection, JoinKind};
//! use rust_data_cleaning::export::{export_consolidated, ExportOptions};
//! use rust_data_cleaning::ingestion::IngestionOptions;
//!
//! # fn main() -> Result<(), rust_data_cleaning::EngineError> {
//! let collection = DatasetCollection::load_glob("data/*.csv", &IngestionOptions::default())?;
//! let mode = ConsolidationMode::Merge {
//!     key: "Customer ID".to_string(),
//!     join: JoinKind::Left,
//! };
//! // Writes data/merged_export.csv
//! let written = export_consolidated(&collection, &mode, &ExportOptions::default())?;
//! println!("{} rows -> {}", written.dataset.row_count(), written.csv_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Ingestion, cleaning and consolidated export accept an optional
//! [`observability::PipelineObserver`]. [`observability::TracingObserver`] forwards events to
//! `tracing`; the pipeline also emits `tracing` debug events of its own.

pub mod cleaning;
pub mod consolidate;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod observability;
pub mod processing;
pub mod rules;
pub mod safety;
pub mod types;

pub use error::{EngineError, EngineResult};
