#![cfg(feature = "excel")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rust_data_cleaning::consolidate::{ConsolidationMode, DatasetCollection};
use rust_data_cleaning::export::excel::write_workbook;
use rust_data_cleaning::export::{export_consolidated, export_to_path, ExportOptions};
use rust_data_cleaning::ingestion::excel::{ingest_excel_from_path, read_excel_sheets};
use rust_data_cleaning::ingestion::{ingest_from_path, ExcelSheetSelection, IngestionOptions};
use rust_data_cleaning::types::{DataSet, DataType, Field, Schema, Value};

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("rust-data-cleaning-{name}-{nanos}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn people() -> DataSet {
    let day = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap().and_hms_opt(0, 0, 0).unwrap();
    DataSet::new(
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
            Field::new("score", DataType::Float64),
            Field::new("active", DataType::Bool),
            Field::new("joined", DataType::Date),
        ]),
        vec![
            vec![
                Value::Int64(1),
                Value::Utf8("Ada".to_string()),
                Value::Float64(98.5),
                Value::Bool(true),
                Value::Date(day),
            ],
            vec![
                Value::Int64(2),
                Value::Null,
                Value::Float64(87.0),
                Value::Bool(false),
                Value::Null,
            ],
        ],
    )
}

#[test]
fn xlsx_export_round_trips_native_types() {
    let path = tmp_dir("xlsx").join("people.xlsx");
    export_to_path(&people(), &path).unwrap();

    let back = ingest_from_path(&path, &IngestionOptions::default()).unwrap();
    assert_eq!(back.column_names(), vec!["id", "name", "score", "active", "joined"]);
    let types: Vec<DataType> = back.schema.fields.iter().map(|f| f.data_type).collect();
    // 98.5 and 87.0 share a column, so whole-number 87 widens back to a float
    assert_eq!(
        types,
        vec![DataType::Int64, DataType::Utf8, DataType::Float64, DataType::Bool, DataType::Date]
    );
    assert_eq!(back.rows, people().rows);
}

#[test]
fn sheet_selection_and_multi_sheet_append() {
    let path = tmp_dir("sheets").join("book.xlsx");
    let north = DataSet::new(Schema::utf8(&["city", "region"]), vec![vec![
        Value::Utf8("Oslo".to_string()),
        Value::Utf8("north".to_string()),
    ]]);
    let south = DataSet::new(Schema::utf8(&["city", "port"]), vec![vec![
        Value::Utf8("Lima".to_string()),
        Value::Utf8("Callao".to_string()),
    ]]);
    write_workbook(&[("North", &north), ("South", &south)], &path).unwrap();

    let first = ingest_excel_from_path(&path, None).unwrap();
    assert_eq!(first, north);
    let named = ingest_excel_from_path(&path, Some("South")).unwrap();
    assert_eq!(named, south);

    let opts = IngestionOptions {
        excel_sheet_selection: ExcelSheetSelection::AllSheets,
        ..Default::default()
    };
    let all = ingest_from_path(&path, &opts).unwrap();
    assert_eq!(all.column_names(), vec!["city", "region", "port"]);
    assert_eq!(all.row_count(), 2);
    assert_eq!(all.rows[1][1], Value::Null);
}

#[test]
fn master_mode_writes_csv_and_one_sheet_per_dataset() {
    let dir = tmp_dir("master");
    let mut c = DatasetCollection::new();
    c.insert("a very long dataset identifier that overflows", people());
    c.insert("Other: [set]", DataSet::new(Schema::utf8(&["ID"]), vec![vec![Value::Utf8("9".to_string())]]));

    let opts = ExportOptions {
        output_dir: Some(dir.clone()),
        master_workbook: true,
        ..Default::default()
    };
    let written = export_consolidated(&c, &ConsolidationMode::Master, &opts).unwrap();
    assert_eq!(written.csv_path, dir.join("master_export.csv"));
    assert_eq!(written.workbook_path, Some(dir.join("master_export.xlsx")));

    let sheets = read_excel_sheets(dir.join("master_export.xlsx"), None).unwrap();
    let names: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["a very long dataset identifier ", "Other_ _set_"]);
    assert_eq!(sheets[0].1.row_count(), 2);
    assert_eq!(sheets[1].1.column_names(), vec!["id"]);
}
