//! Delimited-text ingestion.

use std::path::Path;

use crate::error::EngineResult;
use crate::types::{DataSet, Schema, Value};

/// Cell contents read as missing (compared after trimming).
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Ingest a comma-separated file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - The first record is the header row; its labels become column names as written.
/// - Every other cell is [`Value::Utf8`] holding the raw text, or [`Value::Null`] when it is
///   blank or one of [`NA_TOKENS`]. Typing is left to the cleaning stage.
/// - Short rows are padded with `Null`, long rows are truncated to the header width.
/// - Bytes that are not valid UTF-8 are replaced with `U+FFFD` instead of failing the file.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> EngineResult<DataSet> {
    ingest_delimited_from_path(path, b',')
}

/// Like [`ingest_csv_from_path`] with an explicit delimiter (e.g. `b'\t'`).
pub fn ingest_delimited_from_path(path: impl AsRef<Path>, delimiter: u8) -> EngineResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> EngineResult<DataSet> {
    let labels: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let schema = Schema::utf8(&labels);
    let width = schema.fields.len();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let row: Vec<Value> = (0..width)
            .map(|i| {
                record
                    .get(i)
                    .map_or(Value::Null, |raw| parse_cell(&String::from_utf8_lossy(raw)))
            })
            .collect();
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn parse_cell(raw: &str) -> Value {
    if is_na(raw) {
        Value::Null
    } else {
        Value::Utf8(raw.to_owned())
    }
}

/// `true` when `raw` is blank or an NA token.
pub fn is_na(raw: &str) -> bool {
    let trimmed = raw.trim();
    NA_TOKENS.contains(&trimmed)
}
