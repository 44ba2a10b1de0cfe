//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a file into an in-memory
//! [`crate::types::DataSet`] with raw column labels and untyped (or natively typed, for
//! workbooks) cells, ready for [`crate::cleaning::clean_dataset`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the file
//!   extension.
//! - If a [`PipelineObserver`] is provided, success/failure/alerts are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::observability::{report_outcome, EventContext, PipelineObserver, Severity, Stage};
use crate::types::DataSet;

use super::csv;

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// How to choose sheet(s) when ingesting an Excel workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcelSheetSelection {
    /// Ingest the first sheet (default).
    #[default]
    First,
    /// Ingest a single named sheet.
    Sheet(String),
    /// Ingest all sheets and append their rows.
    AllSheets,
    /// Ingest only the listed sheets (in order) and append their rows.
    Sheets(Vec<String>),
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            excel_sheet_selection: ExcelSheetSelection::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// - If `options.format` is `None`, format is inferred from the file extension.
/// - Use `options.excel_sheet_selection` for Excel multi-tab behavior.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ## CSV (auto-detect by extension)
///
/// ```no_run
/// use rust_data_cleaning::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), rust_data_cleaning::EngineError> {
/// let ds = ingest_from_path("people.csv", &IngestionOptions::default())?;
/// println!("rows={} columns={:?}", ds.row_count(), ds.column_names());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly (override extension inference)
///
/// ```no_run
/// use rust_data_cleaning::ingestion::{ingest_from_path, IngestionFormat, IngestionOptions};
///
/// # fn main() -> Result<(), rust_data_cleaning::EngineError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Tsv),
///     ..Default::default()
/// };
/// let ds = ingest_from_path("export.txt", &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use rust_data_cleaning::ingestion::{ingest_from_path, IngestionOptions};
/// use rust_data_cleaning::observability::{Severity, StdErrObserver};
///
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     alert_at_or_above: Severity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = ingest_from_path("does_not_exist.csv", &opts).unwrap_err();
/// ```
///
/// ## Excel (feature-gated)
///
/// ```no_run
/// use rust_data_cleaning::ingestion::{
///     ingest_from_path, ExcelSheetSelection, IngestionFormat, IngestionOptions,
/// };
///
/// # fn main() -> Result<(), rust_data_cleaning::EngineError> {
/// let opts = IngestionOptions {
///     format: Some(IngestionFormat::Excel),
///     excel_sheet_selection: ExcelSheetSelection::AllSheets,
///     ..Default::default()
/// };
/// let ds = ingest_from_path("workbook.xlsx", &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> EngineResult<DataSet> {
    let path = path.as_ref();
    let result = match options.format {
        Some(f) => Ok(f),
        None => infer_format_from_path(path),
    }
    .and_then(|fmt| match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Tsv => csv::ingest_delimited_from_path(path, b'\t'),
        IngestionFormat::Excel => ingest_excel_dispatch(path, &options.excel_sheet_selection),
    });

    let ctx = EventContext::for_path(Stage::Ingest, path);
    report_outcome(
        options.observer.as_ref(),
        options.alert_at_or_above,
        &ctx,
        &result,
        DataSet::row_count,
    );
    result
}

fn infer_format_from_path(path: &Path) -> EngineResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EngineError::SchemaMismatch {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| EngineError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn ingest_excel_dispatch(path: &Path, sel: &ExcelSheetSelection) -> EngineResult<DataSet> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sel);

    #[cfg(feature = "excel")]
    {
        use super::excel;

        match sel {
            ExcelSheetSelection::First => excel::ingest_excel_from_path(path, None),
            ExcelSheetSelection::Sheet(name) => excel::ingest_excel_from_path(path, Some(name.as_str())),
            ExcelSheetSelection::AllSheets => excel::ingest_excel_workbook_from_path(path, None),
            ExcelSheetSelection::Sheets(names) => {
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                excel::ingest_excel_workbook_from_path(path, Some(refs.as_slice()))
            }
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(EngineError::SchemaMismatch {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
