//! Delimited-text export.

use std::path::Path;

use crate::error::EngineResult;
use crate::types::DataSet;

/// Write `dataset` as CSV with a header row. Missing cells are written as empty fields.
pub fn write_csv(dataset: &DataSet, path: impl AsRef<Path>) -> EngineResult<()> {
    write_delimited(dataset, path, b',')
}

/// Like [`write_csv`] with an explicit delimiter.
pub fn write_delimited(dataset: &DataSet, path: impl AsRef<Path>, delimiter: u8) -> EngineResult<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_csv_to_writer(dataset, &mut wtr)
}

/// Write `dataset` to an existing CSV writer and flush it.
pub fn write_csv_to_writer<W: std::io::Write>(dataset: &DataSet, wtr: &mut csv::Writer<W>) -> EngineResult<()> {
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(ToString::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}
