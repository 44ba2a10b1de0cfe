#![cfg(feature = "excel")]

//! `.xlsx` export.

use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::error::{EngineError, EngineResult};
use crate::types::{DataSet, Value};

/// Excel's limit on sheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Write `dataset` as a single-sheet workbook.
pub fn write_xlsx(dataset: &DataSet, path: impl AsRef<Path>, sheet_name: &str) -> EngineResult<()> {
    write_workbook(&[(sheet_name, dataset)], path)
}

/// Write one sheet per `(name, dataset)` pair, in order. Names are passed through
/// [`sanitize_sheet_names`].
pub fn write_workbook(sheets: &[(&str, &DataSet)], path: impl AsRef<Path>) -> EngineResult<()> {
    let names: Vec<&str> = sheets.iter().map(|(name, _)| *name).collect();
    let names = sanitize_sheet_names(&names);

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    for ((_, dataset), name) in sheets.iter().zip(&names) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_sheet(worksheet, dataset, &date_format)?;
    }
    workbook.save(path.as_ref())?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, dataset: &DataSet, date_format: &Format) -> EngineResult<()> {
    if dataset.row_count() + 1 > MAX_ROWS || dataset.column_count() > MAX_COLUMNS {
        return Err(EngineError::SchemaMismatch {
            message: format!(
                "dataset of {} rows x {} columns does not fit in a worksheet",
                dataset.row_count(),
                dataset.column_count()
            ),
        });
    }

    for (c, name) in dataset.schema.field_names().enumerate() {
        worksheet.write_string(0, c as u16, name)?;
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Null | Value::Invalid(_) => {}
                Value::Int64(i) => {
                    worksheet.write_number(r, c, *i as f64)?;
                }
                Value::Float64(f) => {
                    worksheet.write_number(r, c, *f)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Value::Utf8(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Value::Date(d) => {
                    let stamp = d.format("%Y-%m-%d %H:%M:%S").to_string();
                    let excel = ExcelDateTime::parse_from_str(&stamp)?;
                    worksheet.write_datetime_with_format(r, c, &excel, date_format)?;
                }
            }
        }
    }
    Ok(())
}

/// Make names valid, unique worksheet names.
///
/// `[ ] : * ? / \` become `_`, leading/trailing apostrophes are dropped, names are cut to
/// [`MAX_SHEET_NAME_LEN`] characters, and blanks become `Sheet<n>`. Collisions (compared
/// case-insensitively, as Excel does) get a `_2`, `_3`, ... suffix within the length limit.
pub fn sanitize_sheet_names(names: &[&str]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    names
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let cleaned: String = raw
                .chars()
                .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
                .collect();
            let cleaned = cleaned.trim().trim_matches('\'');
            let base = if cleaned.is_empty() {
                format!("Sheet{}", i + 1)
            } else {
                truncate(cleaned, MAX_SHEET_NAME_LEN)
            };

            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.to_lowercase()) {
                let suffix = format!("_{n}");
                candidate = format!("{}{suffix}", truncate(&base, MAX_SHEET_NAME_LEN - suffix.len()));
                n += 1;
            }
            candidate
        })
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{sanitize_sheet_names, MAX_SHEET_NAME_LEN};

    #[test]
    fn sheet_names_are_valid_and_unique() {
        let long = "quarterly sales report for the northern region";
        let out = sanitize_sheet_names(&["a/b", "", long, long, "A_B", "'quoted'"]);
        assert_eq!(out[0], "a_b");
        assert_eq!(out[1], "Sheet2");
        assert_eq!(out[2].chars().count(), MAX_SHEET_NAME_LEN);
        assert_ne!(out[2], out[3]);
        assert!(out[3].ends_with("_2"));
        assert!(out[3].chars().count() <= MAX_SHEET_NAME_LEN);
        assert_eq!(out[4], "A_B_2");
        assert_eq!(out[5], "quoted");
    }
}
