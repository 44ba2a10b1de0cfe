//! Writing datasets back to files.
//!
//! - [`export_to_path`] writes one dataset; the format follows the extension.
//! - [`export_consolidated`] combines a [`DatasetCollection`] and writes the result as
//!   `append_export.csv`, `master_export.csv` or `merged_export.csv` next to the first source
//!   file. Master mode can also write `master_export.xlsx` with one sheet per dataset.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::consolidate::{consolidate, ConsolidationMode, DatasetCollection};
use crate::error::{EngineError, EngineResult};
use crate::observability::{report_outcome, EventContext, PipelineObserver, Severity, Stage};
use crate::types::DataSet;

/// File name of the per-dataset workbook written in master mode.
pub const MASTER_WORKBOOK_FILE: &str = "master_export.xlsx";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    /// Feature-gated behind `excel`.
    Xlsx,
}

impl ExportFormat {
    /// Parse an export format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Write `dataset` to `path`, choosing the format from the extension.
///
/// # Errors
///
/// [`EngineError::SchemaMismatch`] for an unsupported extension, otherwise the writer's error.
pub fn export_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> EngineResult<()> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|s| s.to_str())
        .and_then(ExportFormat::from_extension)
        .ok_or_else(|| EngineError::SchemaMismatch {
            message: format!("cannot infer export format for path ({})", path.display()),
        })?;

    match format {
        ExportFormat::Csv => csv::write_csv(dataset, path),
        ExportFormat::Tsv => csv::write_delimited(dataset, path, b'\t'),
        ExportFormat::Xlsx => write_xlsx_dispatch(dataset, path),
    }
}

fn write_xlsx_dispatch(dataset: &DataSet, path: &Path) -> EngineResult<()> {
    #[cfg(feature = "excel")]
    {
        excel::write_xlsx(dataset, path, "Sheet1")
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (dataset, path);
        Err(EngineError::SchemaMismatch {
            message: "xlsx export not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Options controlling consolidated export.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ExportOptions {
    /// Directory to write into. `None` uses the directory of the first dataset's source file.
    pub output_dir: Option<PathBuf>,
    /// In master mode, also write [`MASTER_WORKBOOK_FILE`] (requires the `excel` feature).
    pub master_workbook: bool,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("output_dir", &self.output_dir)
            .field("master_workbook", &self.master_workbook)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            master_workbook: cfg!(feature = "excel"),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// What [`export_consolidated`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedExport {
    /// The combined dataset that was written.
    pub dataset: DataSet,
    /// Path of the CSV file.
    pub csv_path: PathBuf,
    /// Path of the master workbook, when one was written.
    pub workbook_path: Option<PathBuf>,
}

/// Consolidate `collection` with `mode` and write the result.
///
/// Observers see a `consolidate` event, then an `export` event for the written file.
///
/// # Errors
///
/// Consolidation errors (e.g. [`EngineError::MissingMergeKey`]), a
/// [`EngineError::SchemaMismatch`] when no output directory can be determined, or I/O errors.
pub fn export_consolidated(
    collection: &DatasetCollection,
    mode: &ConsolidationMode,
    options: &ExportOptions,
) -> EngineResult<ConsolidatedExport> {
    let combined = consolidate(collection, mode);
    let ctx = EventContext::new(Stage::Consolidate, mode.file_name());
    report_outcome(
        options.observer.as_ref(),
        options.alert_at_or_above,
        &ctx,
        &combined,
        DataSet::row_count,
    );
    let dataset = combined?;

    let written = output_dir(collection, options).and_then(|dir| {
        let csv_path = dir.join(mode.file_name());
        csv::write_csv(&dataset, &csv_path)?;
        let workbook_path = if *mode == ConsolidationMode::Master && options.master_workbook {
            let path = dir.join(MASTER_WORKBOOK_FILE);
            write_master_workbook(collection, &path)?;
            Some(path)
        } else {
            None
        };
        Ok((csv_path, workbook_path))
    });
    let ctx = EventContext::new(Stage::Export, mode.file_name());
    report_outcome(
        options.observer.as_ref(),
        options.alert_at_or_above,
        &ctx,
        &written,
        |_| dataset.row_count(),
    );
    let (csv_path, workbook_path) = written?;

    tracing::info!(path = %csv_path.display(), rows = dataset.row_count(), "wrote consolidated export");
    Ok(ConsolidatedExport {
        dataset,
        csv_path,
        workbook_path,
    })
}

fn output_dir(collection: &DatasetCollection, options: &ExportOptions) -> EngineResult<PathBuf> {
    options
        .output_dir
        .clone()
        .or_else(|| collection.output_dir())
        .ok_or_else(|| EngineError::SchemaMismatch {
            message: "no output directory: set ExportOptions::output_dir or load datasets from files"
                .to_string(),
        })
}

fn write_master_workbook(collection: &DatasetCollection, path: &Path) -> EngineResult<()> {
    #[cfg(feature = "excel")]
    {
        let cleaned: Vec<(String, DataSet)> = collection
            .iter()
            .map(|entry| Ok((entry.id.clone(), crate::cleaning::basic_clean(&entry.dataset)?.dataset)))
            .collect::<EngineResult<_>>()?;
        let sheets: Vec<(&str, &DataSet)> = cleaned.iter().map(|(id, ds)| (id.as_str(), ds)).collect();
        excel::write_workbook(&sheets, path)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (collection, path);
        Err(EngineError::SchemaMismatch {
            message: "master workbook needs the 'excel' feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{export_to_path, ExportFormat};
    use crate::types::DataSet;

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_extension("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_extension("xlsx"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_extension("xls"), None);
    }

    #[test]
    fn unknown_extension_is_rejected_before_writing() {
        let err = export_to_path(&DataSet::default(), "out.parquet").unwrap_err();
        assert!(err.to_string().contains("cannot infer export format"));
    }
}
