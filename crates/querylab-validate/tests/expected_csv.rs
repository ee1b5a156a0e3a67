use std::fs;
use std::path::PathBuf;

use querylab_core::{ErrorKind, QueryResult, Value};
use querylab_validate::{
    CellType, ExpectedLayout, compare, expected_layout_path, read_expected, write_expected,
};

fn temp_out_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("querylab_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), rows).expect("result")
}

#[test]
fn written_results_read_back_equal() {
    let dir = temp_out_dir("expected_roundtrip");
    let path = dir.join("solutions").join("solution_df.csv");
    let result = result(
        &["id", "name", "score", "note"],
        vec![
            vec![Value::Integer(1), Value::from("Ann, Jr."), Value::Real(2.0), Value::Null],
            vec![Value::Integer(-7), Value::from("Bo \"B\""), Value::Real(1.5e-9), Value::from("x")],
            vec![Value::Integer(3), Value::from("42"), Value::Null, Value::from("y")],
        ],
    );

    write_expected(&path, &result).expect("write");
    assert!(!dir.join("solutions").join("solution_df.csv.tmp").exists());
    assert!(dir.join("solutions").join("solution_df.types.json").exists());

    let loaded = read_expected(&path).expect("read");
    assert_eq!(loaded, result);
    assert!(compare(&loaded, &result).expect("compare").is_match);
}

#[test]
fn text_that_looks_like_other_types_stays_text() {
    let dir = temp_out_dir("expected_text");
    let path = dir.join("solution_df.csv");
    let result = result(
        &["code", "year", "flag", "note", "ratio"],
        vec![
            vec![
                Value::from("007"),
                Value::from("2017"),
                Value::from("true"),
                Value::from(""),
                Value::from("1.5"),
            ],
            vec![
                Value::from("042"),
                Value::from("2018"),
                Value::from("false"),
                Value::Null,
                Value::from("NaN"),
            ],
        ],
    );

    write_expected(&path, &result).expect("write");
    let loaded = read_expected(&path).expect("read");
    assert_eq!(loaded, result);
    assert_eq!(loaded.rows()[0][3], Value::from(""));
    assert_eq!(loaded.rows()[1][3], Value::Null);
}

#[test]
fn mixed_columns_keep_each_cell_type() {
    let dir = temp_out_dir("expected_mixed");
    let path = dir.join("solution_df.csv");
    let result = result(
        &["mixed", "flag", "blob", "real"],
        vec![
            vec![Value::Integer(10), Value::Boolean(true), Value::Blob(vec![0, 255]), Value::Real(f64::INFINITY)],
            vec![Value::from("10"), Value::Null, Value::Blob(Vec::new()), Value::Real(-0.25)],
            vec![Value::Real(10.0), Value::Boolean(false), Value::Null, Value::Real(3.0)],
            vec![Value::Null, Value::Boolean(true), Value::Blob(vec![1]), Value::Real(1e300)],
        ],
    );

    write_expected(&path, &result).expect("write");
    let layout = ExpectedLayout::of(&result);
    assert_eq!(
        layout.columns[0].cells,
        Some(vec![CellType::Integer, CellType::Text, CellType::Real, CellType::Null])
    );
    assert_eq!(layout.columns[1].cell_type, CellType::Boolean);
    assert_eq!(layout.columns[1].nulls, vec![1]);

    assert_eq!(read_expected(&path).expect("read"), result);
}

#[test]
fn header_only_file_is_an_empty_result() {
    let dir = temp_out_dir("expected_empty");
    let path = dir.join("solution_df.csv");
    write_expected(&path, &QueryResult::empty(vec!["id".into()])).expect("write");
    let loaded = read_expected(&path).expect("read");
    assert_eq!(loaded.columns(), ["id"]);
    assert!(loaded.is_empty());
}

#[test]
fn single_null_column_rows_survive() {
    let dir = temp_out_dir("expected_single_null");
    let path = dir.join("solution_df.csv");
    let result = result(&["manager_id"], vec![vec![Value::Null], vec![Value::Integer(3)]]);
    write_expected(&path, &result).expect("write");
    assert_eq!(read_expected(&path).expect("read"), result);
}

#[test]
fn missing_artifact_is_a_file_error() {
    let dir = temp_out_dir("expected_missing");
    let err = read_expected(&dir.join("absent.csv")).expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::FileIo);
}

#[test]
fn csv_without_layout_is_a_file_error() {
    let dir = temp_out_dir("expected_no_layout");
    let path = dir.join("solution_df.csv");
    fs::write(&path, "id\n1\n").expect("write csv");
    let err = read_expected(&path).expect_err("no sidecar");
    assert_eq!(err.kind(), ErrorKind::FileIo);
}

#[test]
fn edited_csv_that_disagrees_with_layout_is_rejected() {
    let dir = temp_out_dir("expected_tampered");
    let path = dir.join("solution_df.csv");
    let result = result(&["id"], vec![vec![Value::Integer(1)], vec![Value::Integer(2)]]);
    write_expected(&path, &result).expect("write");

    fs::write(&path, "id\n1\nabc\n").expect("edit csv");
    let err = read_expected(&path).expect_err("bad cell");
    assert_eq!(err.kind(), ErrorKind::Validation);

    fs::write(&path, "id\n1\n").expect("drop row");
    let err = read_expected(&path).expect_err("short");
    assert_eq!(err.kind(), ErrorKind::Validation);

    fs::write(&path, "key\n1\n2\n").expect("rename column");
    let err = read_expected(&path).expect_err("header");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(expected_layout_path(&path).exists());
}
