use authority_explorer::data::{Cell, ColumnKind, Dataset, DatasetKind, Measure};
use authority_explorer::error::LoadError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_csv(path: &Path, header: &[&str], rows: &[&str]) {
    let mut out = String::new();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

const OFLOG_HEADER: [&str; 5] = [
    "Local authority name",
    "Region",
    "Financial year",
    "Band D council tax",
    "Reserves to spend ratio",
];

#[test]
fn loads_oflog_table_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Oflog.csv");
    write_csv(
        &path,
        &OFLOG_HEADER,
        &[
            "Leeds,Yorkshire and the Humber,2021-22,1700.5,0.41",
            "\"Bristol, City of\",South West,2021-22,2000,N/A",
        ],
    );
    let ds = Dataset::load(DatasetKind::Oflog, &path).unwrap();
    assert_eq!(ds.table().len(), 2);
    assert_eq!(ds.entities_in_order(), vec!["Leeds", "Bristol, City of"]);
    assert_eq!(
        ds.table().values("Reserves to spend ratio"),
        vec![&Cell::Number(0.41), &Cell::Missing]
    );
    assert_eq!(ds.manifest().row_count, 2);
    assert_eq!(ds.manifest().columns[3].kind, ColumnKind::Number);
}

#[test]
fn missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let err = Dataset::load(DatasetKind::Merged, &dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn ragged_rows_are_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    write_csv(
        &path,
        &["local_authority_name", "region", "rate"],
        &["Leeds,North,1", "York,North,2,extra"],
    );
    let err = Dataset::load(DatasetKind::Merged, &path).unwrap_err();
    assert!(matches!(err, LoadError::Malformed { line: 3, .. }), "{:?}", err);
}

#[test]
fn empty_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "").unwrap();
    assert!(Dataset::load(DatasetKind::Merged, &path).is_err());
}

#[test]
fn missing_identifier_becomes_nan_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("merged.csv");
    write_csv(
        &path,
        &["local_authority_name", "region", "rate"],
        &["Leeds,North,1", ",North,2"],
    );
    let ds = Dataset::load(DatasetKind::Merged, &path).unwrap();
    assert_eq!(ds.entities_sorted(), vec!["Leeds", "nan"]);
}

#[test]
fn blank_and_repeated_headers_keep_every_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("merged.csv");
    write_csv(
        &path,
        &["", "local_authority_name", "region", "rate", "rate"],
        &["0,Leeds,North,5,7", "1,York,North,15,9"],
    );
    let ds = Dataset::load(DatasetKind::Merged, &path).unwrap();
    let names: Vec<&str> = ds.table().column_names().collect();
    assert_eq!(
        names,
        vec!["Unnamed: 0", "local_authority_name", "region", "rate", "rate.1"]
    );

    let records = ds.table().records();
    assert_eq!(records[0]["rate"], 5.0);
    assert_eq!(records[0]["rate.1"], 7.0);

    let measures = DatasetKind::Merged.measure_columns(ds.table());
    assert_eq!(measures, vec!["Unnamed: 0", "rate", "rate.1"]);
    assert_eq!(
        DatasetKind::Merged.default_measure(ds.table()).as_deref(),
        Some("Unnamed: 0")
    );
    assert!(Measure::resolve(ds.table(), DatasetKind::Merged, "rate.1").is_ok());
}
