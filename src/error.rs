use thiserror::Error;

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type returned by ingestion, cleaning, consolidation and export.
///
/// Per-cell coercion failures are never reported through this type; they become
/// [`crate::types::Value::Invalid`] cells instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook read error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    #[cfg(feature = "excel")]
    /// Workbook write error (feature-gated behind `excel`).
    #[error("xlsx write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Rule configuration could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid glob pattern when loading a dataset collection.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The worker pool for parallel column cleaning could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The input does not have the expected shape (unknown column, missing header, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A merge key is absent from one of the datasets being merged.
    #[error("key '{key}' not found in dataset '{dataset}'. available columns: {}", available.join(", "))]
    MissingMergeKey {
        key: String,
        dataset: String,
        available: Vec<String>,
    },

    /// A column rule cannot be applied to the column it targets.
    #[error("invalid rule for column '{column}': {message}")]
    InvalidRule { column: String, message: String },

    /// A strategy/policy name that does not match any known variant.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
