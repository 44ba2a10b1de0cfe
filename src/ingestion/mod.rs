//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - reads the file into an in-memory [`crate::types::DataSet`] with raw column labels
//! - optionally reports success/failure/alerts to a [`crate::observability::PipelineObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions};
