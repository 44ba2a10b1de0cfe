#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::cleaning::coerce::parse_date;
use crate::consolidate::append::conform;
use crate::consolidate::concat_rows;
use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::csv::is_na;

/// Ingest one sheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Keeps native cell types (numbers, booleans, dates); whole-number floats become integers;
///   blank cells, error cells and NA strings become `Null`
/// - Infers each column's type from its present cells; mixed columns become `Utf8`
pub fn ingest_excel_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> EngineResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = match sheet_name {
        Some(s) => s.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EngineError::SchemaMismatch {
                message: "workbook has no sheets".to_string(),
            })?,
    };
    let range = workbook.worksheet_range(&sheet)?;
    read_sheet(&sheet, &range)
}

/// Ingest several sheets and append them into one `DataSet`.
///
/// - If `sheet_names` is `None`, ingests **all sheets** in workbook order.
/// - If `sheet_names` is `Some(&[...])`, ingests only those sheets (in the provided order).
///
/// Sheets may have different headers; columns are unioned in first-seen order.
pub fn ingest_excel_workbook_from_path(
    path: impl AsRef<Path>,
    sheet_names: Option<&[&str]>,
) -> EngineResult<DataSet> {
    let sheets = read_excel_sheets(path, sheet_names)?;
    let datasets: Vec<DataSet> = sheets.into_iter().map(|(_, ds)| ds).collect();
    Ok(concat_rows(&datasets))
}

/// Ingest several sheets, keeping each one separate as `(sheet name, dataset)`.
pub fn read_excel_sheets(
    path: impl AsRef<Path>,
    sheet_names: Option<&[&str]>,
) -> EngineResult<Vec<(String, DataSet)>> {
    let mut workbook = open_workbook_auto(path)?;

    let sheets: Vec<String> = match sheet_names {
        Some(names) => names.iter().map(|s| s.to_string()).collect(),
        None => workbook.sheet_names().to_vec(),
    };
    if sheets.is_empty() {
        return Err(EngineError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut out = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let range = workbook.worksheet_range(&sheet)?;
        let ds = read_sheet(&sheet, &range)?;
        out.push((sheet, ds));
    }
    Ok(out)
}

fn read_sheet(sheet: &str, range: &calamine::Range<Data>) -> EngineResult<DataSet> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));
    let header: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| EngineError::SchemaMismatch {
            message: format!("sheet '{sheet}': no non-empty rows (no header row found)"),
        })?
        .iter()
        .map(cell_to_header_string)
        .collect();
    let width = header.len();

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map_or(Value::Null, convert_cell))
                .collect()
        })
        .collect();

    let mut fields: Vec<Field> = header.into_iter().map(|h| Field::new(h, DataType::Utf8)).collect();
    let mut dataset = DataSet::new(Schema::default(), rows);
    for (idx, field) in fields.iter_mut().enumerate() {
        field.data_type = infer_column_type(dataset.column_values(idx));
    }
    for row in &mut dataset.rows {
        for (cell, field) in row.iter_mut().zip(&fields) {
            let value = std::mem::replace(cell, Value::Null);
            *cell = match (field.data_type, value) {
                (DataType::Float64, Value::Int64(i)) => Value::Float64(i as f64),
                (data_type, v) => conform(v, data_type),
            };
        }
    }
    dataset.schema = Schema::new(fields);

    tracing::debug!(sheet, rows = dataset.row_count(), "read sheet");
    Ok(dataset)
}

// Homogeneous columns keep their type (ints widen to floats alongside floats); anything else is text.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for v in values {
        let t = match v {
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Bool(_) => DataType::Bool,
            Value::Date(_) => DataType::Date,
            Value::Utf8(_) => return DataType::Utf8,
            Value::Null | Value::Invalid(_) => continue,
        };
        inferred = Some(match inferred {
            None => t,
            Some(prev) if prev == t => t,
            Some(prev) if prev.is_numeric() && t.is_numeric() => DataType::Float64,
            Some(_) => return DataType::Utf8,
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        // Spreadsheets store every number as a float; whole numbers come back as integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::Int64(*f as i64),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if is_na(s) => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Value::Date)
            .unwrap_or_else(|| Value::Invalid(dt.to_string())),
        Data::DateTimeIso(s) => parse_date(s).map(Value::Date).unwrap_or_else(|| Value::Utf8(s.clone())),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
    }
}

/// Convert a spreadsheet serial date (days since 1899-12-30, fractional part = time of day).
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::try_milliseconds(millis)?)
}
